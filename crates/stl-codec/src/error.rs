use std::path::PathBuf;

use cad_types::{ErrorKind, ProcessingError};

/// Errors from reading, repairing or writing STL data.
#[derive(Debug, thiserror::Error)]
pub enum StlError {
    #[error("file is {len} bytes; an STL file needs at least 84")]
    TooShort { len: usize },

    #[error(
        "binary STL size mismatch: header declares {count} triangles, \
         expected {expected} bytes, got {actual}"
    )]
    SizeMismatch {
        count: u32,
        expected: u64,
        actual: u64,
    },

    #[error("triangle {triangle}: {what} {value} outside [-{limit}, {limit}]")]
    ValueOutOfRange {
        triangle: usize,
        what: &'static str,
        value: f32,
        limit: f32,
    },

    #[error("malformed STL: {reason}")]
    Malformed { reason: String },

    #[error("mesh has no triangles")]
    Empty,

    #[error("repair failed: {reason}")]
    RepairFailed { reason: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StlError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        StlError::Malformed {
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StlError::TooShort { .. } | StlError::Malformed { .. } => ErrorKind::StructuralInvalid,
            StlError::SizeMismatch { .. } => ErrorKind::SizeMismatch,
            StlError::ValueOutOfRange { .. } => ErrorKind::ValueOutOfRange,
            StlError::Empty => ErrorKind::EmptyGeometry,
            StlError::RepairFailed { .. } => ErrorKind::RepairFailed,
            StlError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                ErrorKind::FileNotFound
            }
            StlError::Io { .. } => ErrorKind::StructuralInvalid,
        }
    }
}

impl From<StlError> for ProcessingError {
    fn from(e: StlError) -> Self {
        ProcessingError::new(e.kind(), e.to_string())
    }
}
