use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use brep_kernel::primitives::{
    make_box, make_box_at, make_cone, make_cylinder, make_sphere, make_torus, translated,
};
use brep_kernel::step_export::export_step;
use geometry_pipeline::{
    accept_upload, process_path, repair_stl, validate_stl, FsStore, PipelineConfig,
    ResultAssembler, UploadOutcome,
};

use crate::SampleShape;

pub fn process(input: &Path, ext: Option<&str>, pretty: bool) -> Result<()> {
    let result = process_path(input, ext);
    let json = ResultAssembler::to_json(&result, pretty).context("failed to render result")?;
    println!("{json}");
    if let Some(e) = result.error() {
        bail!("{} ({})", e.message, e.kind);
    }
    Ok(())
}

pub fn validate(input: &Path) -> Result<()> {
    let verdict = validate_stl(input);
    println!("{}", serde_json::to_string_pretty(&verdict)?);
    if !verdict.valid {
        bail!("{} is not a valid STL: {}", input.display(), verdict.message);
    }
    Ok(())
}

pub fn repair(input: &Path) -> Result<()> {
    let outcome = repair_stl(input);
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    if !outcome.success {
        bail!("repair of {} failed: {}", input.display(), outcome.message);
    }
    Ok(())
}

pub fn upload(input: &Path, root: Option<PathBuf>) -> Result<()> {
    let mut config = PipelineConfig::from_env();
    if let Some(root) = root {
        config.upload_dir = root;
    }
    let bytes = std::fs::read(input).with_context(|| format!("failed to read {:?}", input))?;
    let filename = input
        .file_name()
        .and_then(|n| n.to_str())
        .context("input path has no file name")?;

    let store = FsStore::new(&config.upload_dir);
    match accept_upload(&store, filename, &bytes, &config) {
        UploadOutcome::Accepted {
            stored,
            process_path,
            repair,
            ..
        } => {
            println!("stored: {}", stored.display());
            if let Some(repair) = repair {
                println!("repaired: {}", repair.message);
            }
            println!("process: {}", process_path.display());
            Ok(())
        }
        UploadOutcome::Rejected { error } => bail!("upload rejected: {} ({})", error.message, error.kind),
    }
}

pub fn sample(output: &Path, shape: SampleShape) -> Result<()> {
    let solids = match shape {
        SampleShape::Box => vec![make_box_at([0.0; 3], [10.0, 10.0, 10.0])?],
        SampleShape::Cylinder => vec![make_cylinder(5.0, 10.0)?],
        SampleShape::Sphere => vec![make_sphere(5.0)?],
        SampleShape::Cone => vec![make_cone(5.0, 10.0)?],
        SampleShape::Torus => vec![make_torus(8.0, 2.0)?],
        SampleShape::Assembly => vec![
            make_box(10.0, 10.0, 10.0)?,
            translated(&make_cylinder(5.0, 10.0)?, [20.0, 5.0, 0.0]),
            translated(&make_sphere(5.0)?, [40.0, 5.0, 5.0]),
            translated(&make_cone(5.0, 10.0)?, [60.0, 5.0, 0.0]),
            translated(&make_torus(8.0, 2.0)?, [85.0, 5.0, 5.0]),
        ],
    };

    if solids.len() == 1 {
        std::fs::write(output, export_step(&solids[0]))
            .with_context(|| format!("failed to write {:?}", output))?;
        println!("wrote {}", output.display());
        return Ok(());
    }

    // one STEP file per solid: <stem>_<n>.<ext>
    let stem = output
        .file_stem()
        .and_then(|s| s.to_str())
        .context("output path has no file name")?;
    let ext = output.extension().and_then(|e| e.to_str()).unwrap_or("step");
    for (i, solid) in solids.iter().enumerate() {
        let path = output.with_file_name(format!("{stem}_{}.{ext}", i + 1));
        std::fs::write(&path, export_step(solid))
            .with_context(|| format!("failed to write {:?}", path))?;
        println!("wrote {}", path.display());
    }
    Ok(())
}
