//! MockKernel: deterministic test double implementing BRepKernel.
//!
//! Every import yields the same scripted shape: an axis-aligned unit cube
//! whose six faces are tagged Plane, followed by any extra faces registered
//! with [`MockKernel::with_face`]. Bytes that start with `FAIL` are rejected.

use std::collections::HashMap;

use cad_types::SurfaceType;

use crate::traits::BRepKernel;
use crate::types::*;

/// Deterministic test double for the b-rep kernel.
pub struct MockKernel {
    next_handle: u64,
    shapes: HashMap<u64, Vec<FaceTessellation>>,
    extra_faces: Vec<FaceTessellation>,
    imports: Vec<BRepFormat>,
}

impl MockKernel {
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            shapes: HashMap::new(),
            extra_faces: Vec::new(),
            imports: Vec::new(),
        }
    }

    /// Append a face to every shape imported from now on.
    pub fn with_face(mut self, face: FaceTessellation) -> Self {
        self.extra_faces.push(face);
        self
    }

    /// Formats passed to `import`, in call order.
    pub fn imports(&self) -> &[BRepFormat] {
        &self.imports
    }

    fn alloc_handle(&mut self) -> ShapeHandle {
        let h = ShapeHandle(self.next_handle);
        self.next_handle += 1;
        h
    }

    /// The six faces of the unit cube [0,1]^3, outward winding.
    pub fn unit_cube_faces() -> Vec<FaceTessellation> {
        let quads: [[[f64; 3]; 4]; 6] = [
            [[0., 0., 0.], [0., 1., 0.], [1., 1., 0.], [1., 0., 0.]],
            [[0., 0., 1.], [1., 0., 1.], [1., 1., 1.], [0., 1., 1.]],
            [[0., 0., 0.], [1., 0., 0.], [1., 0., 1.], [0., 0., 1.]],
            [[0., 1., 0.], [0., 1., 1.], [1., 1., 1.], [1., 1., 0.]],
            [[0., 0., 0.], [0., 0., 1.], [0., 1., 1.], [0., 1., 0.]],
            [[1., 0., 0.], [1., 1., 0.], [1., 1., 1.], [1., 0., 1.]],
        ];
        quads
            .iter()
            .map(|q| FaceTessellation {
                surface_type: SurfaceType::Plane,
                positions: q.to_vec(),
                triangles: vec![[0, 1, 2], [0, 2, 3]],
            })
            .collect()
    }
}

impl Default for MockKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl BRepKernel for MockKernel {
    fn import(&mut self, format: BRepFormat, bytes: &[u8]) -> Result<ShapeHandle, KernelError> {
        self.imports.push(format);
        if bytes.is_empty() || bytes.starts_with(b"FAIL") {
            return Err(KernelError::import(format, "mock rejected input"));
        }
        let mut faces = Self::unit_cube_faces();
        faces.extend(self.extra_faces.iter().cloned());
        let handle = self.alloc_handle();
        self.shapes.insert(handle.id(), faces);
        Ok(handle)
    }

    fn face_count(&self, shape: &ShapeHandle) -> Result<usize, KernelError> {
        self.shapes
            .get(&shape.id())
            .map(Vec::len)
            .ok_or(KernelError::ShapeNotFound { handle: *shape })
    }

    fn tessellate_faces(
        &mut self,
        shape: &ShapeHandle,
        _deflection: f64,
    ) -> Result<Vec<FaceTessellation>, KernelError> {
        self.shapes
            .get(&shape.id())
            .cloned()
            .ok_or(KernelError::ShapeNotFound { handle: *shape })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tessellation::tessellate;

    #[test]
    fn cube_tessellates_to_eight_vertices() {
        let mut kernel = MockKernel::new();
        let handle = kernel.import(BRepFormat::Step, b"ISO-10303-21;").unwrap();
        let mesh = tessellate(&mut kernel, &handle).unwrap();
        assert_eq!(mesh.mesh.vertices.len(), 8);
        assert_eq!(mesh.mesh.faces.len(), 12);
        assert_eq!(mesh.surface_types, vec![SurfaceType::Plane; 6]);
    }

    #[test]
    fn degenerate_face_still_reports_type() {
        let mut kernel = MockKernel::new().with_face(FaceTessellation::empty(SurfaceType::Cone));
        let handle = kernel.import(BRepFormat::Iges, b"x").unwrap();
        assert_eq!(kernel.face_count(&handle).unwrap(), 7);
        let mesh = tessellate(&mut kernel, &handle).unwrap();
        assert_eq!(mesh.mesh.faces.len(), 12);
        assert_eq!(mesh.surface_types.len(), 7);
        assert_eq!(mesh.surface_types[6], SurfaceType::Cone);
    }

    #[test]
    fn rejects_scripted_failure() {
        let mut kernel = MockKernel::new();
        assert!(kernel.import(BRepFormat::Step, b"FAIL").is_err());
        assert_eq!(kernel.imports(), &[BRepFormat::Step]);
    }
}
