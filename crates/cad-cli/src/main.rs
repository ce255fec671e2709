//! cadmesh: command-line front end for the geometry pipeline.
//!
//! Set `RUST_LOG` to control log output, e.g. `RUST_LOG=geometry_pipeline=debug`.
//! Without it, `-v` raises the pipeline crates to info and `-vv` to debug.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

/// cadmesh - validate, repair and tessellate CAD uploads.
#[derive(Parser)]
#[command(name = "cadmesh")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a file and print the viewer JSON
    Process {
        input: PathBuf,

        /// Extension to process as, overriding the file name
        #[arg(long)]
        ext: Option<String>,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Validate an STL file
    Validate { input: PathBuf },

    /// Repair an STL file into <stem>_repaired.<ext>
    Repair { input: PathBuf },

    /// Run the upload flow: store under the upload root, validate, repair
    Upload {
        input: PathBuf,

        /// Storage root; defaults to CADMESH_UPLOAD_DIR or ./uploads
        #[arg(long)]
        root: Option<PathBuf>,
    },

    /// Write a sample STEP part
    Sample {
        output: PathBuf,

        #[arg(long, value_enum, default_value = "assembly")]
        shape: SampleShape,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SampleShape {
    Box,
    Cylinder,
    Sphere,
    Cone,
    Torus,
    /// One of each, spaced along X
    Assembly,
}

fn init_tracing(verbose: u8) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "warn",
            1 => "geometry_pipeline=info,stl_codec=info,brep_kernel=info",
            _ => "geometry_pipeline=debug,stl_codec=debug,brep_kernel=debug",
        };
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Process { input, ext, pretty } => {
            commands::process(&input, ext.as_deref(), pretty)
        }
        Commands::Validate { input } => commands::validate(&input),
        Commands::Repair { input } => commands::repair(&input),
        Commands::Upload { input, root } => commands::upload(&input, root),
        Commands::Sample { output, shape } => commands::sample(&output, shape),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn process_flags_parse() {
        let cli = Cli::try_parse_from(["cadmesh", "-vv", "process", "part.bin", "--ext", "stl"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Process { ext, pretty, .. } => {
                assert_eq!(ext.as_deref(), Some("stl"));
                assert!(!pretty);
            }
            _ => panic!("expected process"),
        }
    }
}
