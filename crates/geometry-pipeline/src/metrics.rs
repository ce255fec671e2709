use cad_types::{BoundingBox, Mesh};

use crate::error::PipelineError;

/// Bounding box of a mesh's vertices.
///
/// An empty mesh is an error, never a zero box.
pub fn bounds(mesh: &Mesh) -> Result<BoundingBox, PipelineError> {
    BoundingBox::from_points(&mesh.vertices).ok_or(PipelineError::Empty { what: "mesh" })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cad_types::{ErrorKind, Triangle};

    #[test]
    fn single_triangle_bounds() {
        let mesh = Mesh {
            vertices: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            faces: vec![Triangle::new(0, 1, 2)],
        };
        let b = bounds(&mesh).unwrap();
        assert_eq!(b.center(), [0.5, 0.5, 0.0]);
        assert_eq!(b.size(), [1.0, 1.0, 0.0]);
    }

    #[test]
    fn empty_mesh_is_empty_geometry() {
        let err = bounds(&Mesh::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyGeometry);
    }
}
