//! Geometry pipeline: one entry point that turns stored CAD bytes into the
//! viewer's normalized result, plus the STL validate/repair hooks and the
//! upload flow built on them.

pub mod assemble;
pub mod config;
pub mod error;
pub mod format;
pub mod metrics;
pub mod obj;
pub mod process;
pub mod storage;
pub mod upload;

pub use assemble::ResultAssembler;
pub use config::PipelineConfig;
pub use error::PipelineError;
pub use format::{allowed_file, extension_of, sniff_format, ALLOWED_EXTENSIONS};
pub use metrics::bounds;
pub use process::{process, process_path, repair_stl, validate_stl, Pipeline};
pub use storage::{FileStore, FsStore, StorageError};
pub use upload::{accept_upload, UploadOutcome};
