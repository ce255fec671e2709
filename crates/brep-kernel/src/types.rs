use cad_types::{ErrorKind, ProcessingError, SurfaceType};

/// Opaque handle to an imported shape.
/// NEVER persisted. Valid only for the kernel instance that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeHandle(pub(crate) u64);

impl ShapeHandle {
    pub(crate) fn id(&self) -> u64 {
        self.0
    }
}

/// Boundary-representation interchange formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BRepFormat {
    Step,
    Iges,
}

impl BRepFormat {
    pub fn name(self) -> &'static str {
        match self {
            BRepFormat::Step => "STEP",
            BRepFormat::Iges => "IGES",
        }
    }
}

/// Tessellation of one topological face.
///
/// `triangles` index into `positions`. A face may carry no triangles at all
/// (degenerate or zero-area faces); it still reports its surface type.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceTessellation {
    pub surface_type: SurfaceType,
    pub positions: Vec<[f64; 3]>,
    pub triangles: Vec<[usize; 3]>,
}

impl FaceTessellation {
    pub fn empty(surface_type: SurfaceType) -> Self {
        Self {
            surface_type,
            positions: Vec::new(),
            triangles: Vec::new(),
        }
    }
}

/// Errors from kernel operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum KernelError {
    #[error("{format} import failed: {reason}")]
    ImportFailed {
        format: &'static str,
        reason: String,
    },

    #[error("tessellation failed: {reason}")]
    TessellationFailed { reason: String },

    #[error("solid construction failed: {reason}")]
    ConstructionFailed { reason: String },

    #[error("shape not found: {handle:?}")]
    ShapeNotFound { handle: ShapeHandle },

    #[error("operation not supported: {operation}")]
    NotSupported { operation: String },

    #[error("geometry kernel fault: {message}")]
    Panicked { message: String },
}

impl KernelError {
    pub fn import(format: BRepFormat, reason: impl Into<String>) -> Self {
        KernelError::ImportFailed {
            format: format.name(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            KernelError::ImportFailed { .. } | KernelError::TessellationFailed { .. } => {
                ErrorKind::ParseFailure
            }
            KernelError::NotSupported { .. } => ErrorKind::UnsupportedFormat,
            KernelError::ConstructionFailed { .. }
            | KernelError::ShapeNotFound { .. }
            | KernelError::Panicked { .. } => ErrorKind::Internal,
        }
    }
}

impl From<KernelError> for ProcessingError {
    fn from(e: KernelError) -> Self {
        ProcessingError::new(e.kind(), e.to_string())
    }
}
