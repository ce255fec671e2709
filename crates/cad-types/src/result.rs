use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::mesh::Mesh;
use crate::surface::SurfaceType;

/// Failure taxonomy shared by every stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    FileNotFound,
    UnsupportedFormat,
    /// Fails the STL byte-level checks.
    StructuralInvalid,
    /// Binary STL declared triangle count disagrees with the byte length.
    SizeMismatch,
    /// Implausible normal or vertex float.
    ValueOutOfRange,
    /// The geometry backend rejected the bytes or the shape.
    ParseFailure,
    /// Zero vertices or faces after extraction.
    EmptyGeometry,
    RepairFailed,
    /// Unanticipated fault from a lower stage.
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::FileNotFound => "FileNotFound",
            ErrorKind::UnsupportedFormat => "UnsupportedFormat",
            ErrorKind::StructuralInvalid => "StructuralInvalid",
            ErrorKind::SizeMismatch => "SizeMismatch",
            ErrorKind::ValueOutOfRange => "ValueOutOfRange",
            ErrorKind::ParseFailure => "ParseFailure",
            ErrorKind::EmptyGeometry => "EmptyGeometry",
            ErrorKind::RepairFailed => "RepairFailed",
            ErrorKind::Internal => "Internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed failure with the originating stage's message, kept verbatim.
///
/// Serializes as `{"error": message}`, the shape the viewer expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct ProcessingError {
    #[serde(skip)]
    pub kind: ErrorKind,
    #[serde(rename = "error")]
    pub message: String,
}

impl ProcessingError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Successful geometry payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshResult {
    #[serde(flatten)]
    pub mesh: Mesh,
    pub center: [f64; 3],
    pub size: [f64; 3],
    pub surface_types: Vec<SurfaceType>,
}

/// Raster uploads are passed through to the viewer by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename = "image")]
pub struct ImageResult {
    pub filename: String,
}

/// The single value handed back to callers of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProcessingResult {
    Mesh(MeshResult),
    Image(ImageResult),
    Error(ProcessingError),
}

impl ProcessingResult {
    pub fn is_error(&self) -> bool {
        matches!(self, ProcessingResult::Error(_))
    }

    pub fn error(&self) -> Option<&ProcessingError> {
        match self {
            ProcessingResult::Error(e) => Some(e),
            _ => None,
        }
    }

    pub fn mesh(&self) -> Option<&MeshResult> {
        match self {
            ProcessingResult::Mesh(m) => Some(m),
            _ => None,
        }
    }
}

impl From<ProcessingError> for ProcessingResult {
    fn from(e: ProcessingError) -> Self {
        ProcessingResult::Error(e)
    }
}

/// Pass/fail verdict of the STL validator. Never produced by mutating input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    pub valid: bool,
    pub message: String,
    /// Failure class; `None` when valid.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub kind: Option<ErrorKind>,
}

impl ValidationVerdict {
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            valid: true,
            message: message.into(),
            kind: None,
        }
    }

    pub fn fail(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: message.into(),
            kind: Some(kind),
        }
    }

    /// Convert a failed verdict into the error the pipeline reports.
    pub fn into_error(self) -> Option<ProcessingError> {
        if self.valid {
            return None;
        }
        let kind = self.kind.unwrap_or(ErrorKind::StructuralInvalid);
        Some(ProcessingError::new(kind, self.message))
    }
}

/// Outcome of a repair attempt. `success` implies `repaired_path` names a
/// file that itself passes validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairOutcome {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub repaired_path: Option<PathBuf>,
}

impl RepairOutcome {
    pub fn repaired(path: PathBuf, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            repaired_path: Some(path),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            repaired_path: None,
        }
    }
}
