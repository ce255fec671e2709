use std::path::PathBuf;

use brep_kernel::KernelError;
use cad_types::{ErrorKind, ProcessingError};
use stl_codec::StlError;

use crate::storage::StorageError;

/// Failures of a pipeline stage. Stage errors are wrapped transparently so
/// their messages reach the caller verbatim.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Stl(#[from] StlError),

    #[error(transparent)]
    Kernel(#[from] KernelError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("OBJ parse failed: {reason}")]
    Obj { reason: String },

    #[error("unsupported file format: {name}")]
    Unsupported { name: String },

    #[error("upload of {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },

    #[error("empty mesh: {what} produced no geometry")]
    Empty { what: &'static str },

    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A stage rejected the input with an already-classified error.
    #[error("{0}")]
    Rejected(ProcessingError),

    #[error("unexpected fault: {message}")]
    Internal { message: String },
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Stl(e) => e.kind(),
            PipelineError::Kernel(e) => e.kind(),
            PipelineError::Storage(e) => e.kind(),
            PipelineError::Obj { .. } => ErrorKind::ParseFailure,
            PipelineError::Unsupported { .. } | PipelineError::TooLarge { .. } => {
                ErrorKind::UnsupportedFormat
            }
            PipelineError::Empty { .. } => ErrorKind::EmptyGeometry,
            PipelineError::NotFound { .. } => ErrorKind::FileNotFound,
            PipelineError::Io { .. } => ErrorKind::ParseFailure,
            PipelineError::Rejected(e) => e.kind,
            PipelineError::Internal { .. } => ErrorKind::Internal,
        }
    }
}

impl From<PipelineError> for ProcessingError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::Rejected(inner) => inner,
            other => ProcessingError::new(other.kind(), other.to_string()),
        }
    }
}
