//! Mapping of stage outcomes onto the single result type.

use cad_types::{ClassifiedMesh, ImageResult, MeshResult, ProcessingError, ProcessingResult};
use tracing::warn;

use crate::error::PipelineError;
use crate::metrics::bounds;

/// Successful stage payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Mesh(ClassifiedMesh),
    Image { filename: String },
}

/// Builds [`ProcessingResult`] values. Error messages are carried over from
/// the failing stage unchanged.
pub struct ResultAssembler;

impl ResultAssembler {
    pub fn assemble(outcome: Result<Payload, PipelineError>) -> ProcessingResult {
        match outcome.and_then(Self::finish) {
            Ok(result) => result,
            Err(e) => Self::error(e),
        }
    }

    fn finish(payload: Payload) -> Result<ProcessingResult, PipelineError> {
        match payload {
            Payload::Mesh(classified) => Self::mesh(classified),
            Payload::Image { filename } => Ok(ProcessingResult::Image(ImageResult { filename })),
        }
    }

    /// Attach bounding-box metrics to a classified mesh.
    pub fn mesh(classified: ClassifiedMesh) -> Result<ProcessingResult, PipelineError> {
        if classified.mesh.faces.is_empty() {
            return Err(PipelineError::Empty { what: "mesh" });
        }
        let bbox = bounds(&classified.mesh)?;
        Ok(ProcessingResult::Mesh(MeshResult {
            center: bbox.center(),
            size: bbox.size(),
            mesh: classified.mesh,
            surface_types: classified.surface_types,
        }))
    }

    /// Render a result in the viewer's JSON schema.
    pub fn to_json(result: &ProcessingResult, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(result)
        } else {
            serde_json::to_string(result)
        }
    }

    pub fn error(e: impl Into<ProcessingError>) -> ProcessingResult {
        let e = e.into();
        warn!(kind = %e.kind, message = %e.message, "processing failed");
        ProcessingResult::Error(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cad_types::{ErrorKind, Mesh, SurfaceType, Triangle};

    #[test]
    fn mesh_payload_gets_metrics() {
        let mesh = Mesh {
            vertices: vec![[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 4.0, 0.0]],
            faces: vec![Triangle::new(0, 1, 2)],
        };
        let result = ResultAssembler::assemble(Ok(Payload::Mesh(ClassifiedMesh::all_planar(mesh))));
        let m = result.mesh().unwrap();
        assert_eq!(m.center, [1.0, 2.0, 0.0]);
        assert_eq!(m.size, [2.0, 4.0, 0.0]);
        assert_eq!(m.surface_types, vec![SurfaceType::Plane]);
    }

    #[test]
    fn faceless_mesh_is_empty_geometry() {
        let result = ResultAssembler::assemble(Ok(Payload::Mesh(ClassifiedMesh::default())));
        assert_eq!(result.error().unwrap().kind, ErrorKind::EmptyGeometry);
    }

    #[test]
    fn image_passthrough() {
        let result = ResultAssembler::assemble(Ok(Payload::Image {
            filename: "shot.png".into(),
        }));
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            serde_json::json!({"type": "image", "filename": "shot.png"})
        );
    }

    #[test]
    fn errors_keep_stage_message() {
        let result = ResultAssembler::assemble(Err(PipelineError::Unsupported {
            name: "a.dwg".into(),
        }));
        let e = result.error().unwrap();
        assert_eq!(e.kind, ErrorKind::UnsupportedFormat);
        assert_eq!(e.message, "unsupported file format: a.dwg");
    }
}
