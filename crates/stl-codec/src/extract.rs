//! Validated STL bytes to the normalized mesh schema.

use cad_types::{ClassifiedMesh, Mesh, Triangle};
use tracing::debug;

use crate::error::StlError;
use crate::reader;

/// Convert STL bytes into a flat-shaded mesh.
///
/// Vertices are emitted per triangle corner without deduplication, so
/// triangle `i` is always `[3i, 3i + 1, 3i + 2]` and the mesh has exactly
/// three vertices per face. Every face is tagged as planar.
pub fn extract(bytes: &[u8]) -> Result<ClassifiedMesh, StlError> {
    let triangles = reader::read_triangles(bytes)?;

    if triangles.len() > (u32::MAX / 3) as usize {
        return Err(StlError::malformed(format!(
            "{} triangles exceed the index range",
            triangles.len()
        )));
    }

    let mut mesh = Mesh::with_capacity(triangles.len() * 3, triangles.len());
    for (i, tri) in triangles.iter().enumerate() {
        let base = (i * 3) as u32;
        for v in &tri.vertices {
            mesh.vertices.push(v.map(f64::from));
        }
        mesh.faces.push(Triangle::new(base, base + 1, base + 2));
    }

    debug!(
        triangles = mesh.faces.len(),
        vertices = mesh.vertices.len(),
        "extracted STL mesh"
    );
    Ok(ClassifiedMesh::all_planar(mesh))
}
