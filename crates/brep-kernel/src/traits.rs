use crate::types::*;

/// Boundary-representation kernel. Imports interchange files and
/// tessellates the resulting shapes face by face.
/// Implemented by TruckKernel (wraps real truck) and MockKernel (deterministic test double).
pub trait BRepKernel {
    /// Import a STEP or IGES file into a shape.
    fn import(&mut self, format: BRepFormat, bytes: &[u8]) -> Result<ShapeHandle, KernelError>;

    /// Number of topological faces in a shape.
    fn face_count(&self, shape: &ShapeHandle) -> Result<usize, KernelError>;

    /// Tessellate every face at the given linear deflection, in topological
    /// face order. Faces that produce no triangles are still returned.
    fn tessellate_faces(
        &mut self,
        shape: &ShapeHandle,
        deflection: f64,
    ) -> Result<Vec<FaceTessellation>, KernelError>;
}
