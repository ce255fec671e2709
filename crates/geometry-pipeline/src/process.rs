//! The pipeline entry point.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;

use brep_kernel::{tessellate, BRepFormat, BRepKernel, TruckKernel};
use cad_types::{
    ClassifiedMesh, ErrorKind, FormatKind, ProcessingError, ProcessingResult, RepairOutcome,
    ValidationVerdict,
};
use tracing::{debug, info, instrument, warn};

use crate::assemble::{Payload, ResultAssembler};
use crate::error::PipelineError;
use crate::format::{extension_of, sniff_format};
use crate::obj::load_obj;

/// Runs inputs through format detection and the matching stage.
///
/// Holds no state between calls apart from the kernel's shape table.
pub struct Pipeline<K> {
    kernel: K,
}

impl Pipeline<TruckKernel> {
    pub fn new() -> Self {
        Self::with_kernel(TruckKernel::new())
    }
}

impl Default for Pipeline<TruckKernel> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: BRepKernel> Pipeline<K> {
    pub fn with_kernel(kernel: K) -> Self {
        Self { kernel }
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    /// Process raw bytes. The extension is taken from `declared_extension`
    /// when given, otherwise from `filename`.
    #[instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    pub fn process(
        &mut self,
        filename: &str,
        bytes: &[u8],
        declared_extension: Option<&str>,
    ) -> ProcessingResult {
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            self.run(filename, bytes, declared_extension)
        }))
        .unwrap_or_else(|payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(PipelineError::Internal { message })
        });
        ResultAssembler::assemble(outcome)
    }

    /// Process a stored file.
    pub fn process_path(&mut self, path: &Path, declared_extension: Option<&str>) -> ProcessingResult {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return ResultAssembler::error(PipelineError::NotFound {
                    path: path.to_path_buf(),
                })
            }
            Err(source) => {
                return ResultAssembler::error(PipelineError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        self.process(filename, &bytes, declared_extension)
    }

    fn run(
        &mut self,
        filename: &str,
        bytes: &[u8],
        declared_extension: Option<&str>,
    ) -> Result<Payload, PipelineError> {
        let extension = declared_extension
            .map(|e| e.to_string())
            .or_else(|| extension_of(filename))
            .ok_or_else(|| PipelineError::Unsupported {
                name: filename.to_string(),
            })?;
        let kind = sniff_format(&extension, bytes)?;
        info!(?kind, "format detected");

        match kind {
            FormatKind::BinaryStl | FormatKind::AsciiStl => self.stl(bytes).map(Payload::Mesh),
            FormatKind::Step => self.brep(BRepFormat::Step, bytes).map(Payload::Mesh),
            FormatKind::Iges => self.brep(BRepFormat::Iges, bytes).map(Payload::Mesh),
            FormatKind::Obj => load_obj(bytes).map(Payload::Mesh),
            FormatKind::Image => Ok(Payload::Image {
                filename: basename(filename),
            }),
            FormatKind::Unsupported => Err(PipelineError::Unsupported {
                name: filename.to_string(),
            }),
        }
    }

    fn stl(&mut self, bytes: &[u8]) -> Result<ClassifiedMesh, PipelineError> {
        let verdict = stl_codec::validate_bytes(bytes);
        if verdict.valid {
            return Ok(stl_codec::extract(bytes)?);
        }

        warn!(message = %verdict.message, "STL failed validation; attempting repair");
        let rejection = ProcessingError::new(
            verdict.kind.unwrap_or(ErrorKind::StructuralInvalid),
            verdict.message,
        );
        match stl_codec::repair::repair_bytes(bytes) {
            Ok((mesh, report)) => {
                info!(
                    triangles = report.triangles,
                    dropped = report.dropped,
                    "STL repaired in memory"
                );
                Ok(ClassifiedMesh::all_planar(mesh))
            }
            Err(e) => {
                debug!(error = %e, "repair failed");
                Err(PipelineError::Rejected(rejection))
            }
        }
    }

    fn brep(&mut self, format: BRepFormat, bytes: &[u8]) -> Result<ClassifiedMesh, PipelineError> {
        let shape = self.kernel.import(format, bytes)?;
        Ok(tessellate(&mut self.kernel, &shape)?)
    }
}

fn basename(filename: &str) -> String {
    Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename)
        .to_string()
}

/// Process raw bytes with a fresh truck-backed pipeline.
pub fn process(filename: &str, bytes: &[u8], declared_extension: Option<&str>) -> ProcessingResult {
    Pipeline::new().process(filename, bytes, declared_extension)
}

/// Process a stored file with a fresh truck-backed pipeline.
pub fn process_path(path: &Path, declared_extension: Option<&str>) -> ProcessingResult {
    Pipeline::new().process_path(path, declared_extension)
}

/// Validate an STL file without touching it.
pub fn validate_stl(path: &Path) -> ValidationVerdict {
    stl_codec::validate_file(path)
}

/// Repair an STL file into `<stem>_repaired.<ext>` beside it.
pub fn repair_stl(path: &Path) -> RepairOutcome {
    stl_codec::repair_file(path)
}
