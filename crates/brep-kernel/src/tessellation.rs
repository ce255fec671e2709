//! Face-by-face tessellation into one indexed, classified mesh.
//!
//! Faces are walked in topological order. Each face's points are merged into
//! a shared vertex list by exact coordinate equality, and every triangle of
//! the face is tagged with the face's surface type.

use std::collections::HashMap;

use cad_types::{ClassifiedMesh, Mesh, SurfaceType, Triangle};
use truck_meshalgo::prelude::*;

use crate::traits::BRepKernel;
use crate::types::*;

/// Linear deflection used for every b-rep tessellation.
pub const LINEAR_DEFLECTION: f64 = 0.1;

/// Tessellate an imported shape at [`LINEAR_DEFLECTION`].
pub fn tessellate(
    kernel: &mut dyn BRepKernel,
    shape: &ShapeHandle,
) -> std::result::Result<ClassifiedMesh, KernelError> {
    let faces = kernel.tessellate_faces(shape, LINEAR_DEFLECTION)?;
    let mesh = assemble(faces)?;
    tracing::debug!(
        vertices = mesh.mesh.vertices.len(),
        triangles = mesh.mesh.faces.len(),
        "b-rep tessellated"
    );
    Ok(mesh)
}

/// Merge per-face tessellations into one indexed mesh.
///
/// `surface_types` receives one entry per face, including faces that
/// produced no triangles.
pub fn assemble(
    faces: Vec<FaceTessellation>,
) -> std::result::Result<ClassifiedMesh, KernelError> {
    let mut vertices: Vec<[f64; 3]> = Vec::new();
    let mut triangles: Vec<Triangle> = Vec::new();
    let mut surface_types: Vec<SurfaceType> = Vec::with_capacity(faces.len());
    let mut index_of: HashMap<[u64; 3], u32> = HashMap::new();

    for face in faces {
        surface_types.push(face.surface_type);

        let mut local: Vec<u32> = Vec::with_capacity(face.positions.len());
        for p in &face.positions {
            let key = point_key(p);
            let idx = match index_of.get(&key) {
                Some(&idx) => idx,
                None => {
                    let idx = u32::try_from(vertices.len()).map_err(|_| {
                        KernelError::TessellationFailed {
                            reason: "vertex count exceeds u32 range".into(),
                        }
                    })?;
                    vertices.push(*p);
                    index_of.insert(key, idx);
                    idx
                }
            };
            local.push(idx);
        }

        for tri in &face.triangles {
            let mut out = [0u32; 3];
            for (slot, &i) in out.iter_mut().zip(tri) {
                *slot = <[u32]>::get(&local, i).copied().ok_or_else(|| KernelError::TessellationFailed {
                    reason: format!(
                        "face triangle references point {i} of {}",
                        face.positions.len()
                    ),
                })?;
            }
            triangles.push(Triangle(out));
        }
    }

    Ok(ClassifiedMesh {
        mesh: Mesh {
            vertices,
            faces: triangles,
        },
        surface_types,
    })
}

fn point_key(p: &[f64; 3]) -> [u64; 3] {
    // fold -0.0 into 0.0 so they weld
    p.map(|c| if c == 0.0 { 0.0f64.to_bits() } else { c.to_bits() })
}

/// Convert a meshed face into a [`FaceTessellation`].
/// Inverted faces have their winding flipped.
pub(crate) fn face_from_polygon(
    mesh: &PolygonMesh,
    orientation: bool,
    surface_type: SurfaceType,
) -> FaceTessellation {
    let mesh = if orientation {
        mesh.clone()
    } else {
        mesh.inverse()
    };

    let positions = mesh.positions().iter().map(|p| [p[0], p[1], p[2]]).collect();
    let mut triangles: Vec<[usize; 3]> = mesh
        .tri_faces()
        .iter()
        .map(|tri| [tri[0].pos, tri[1].pos, tri[2].pos])
        .collect();
    for quad in mesh.quad_faces() {
        triangles.push([quad[0].pos, quad[1].pos, quad[2].pos]);
        triangles.push([quad[0].pos, quad[2].pos, quad[3].pos]);
    }

    FaceTessellation {
        surface_type,
        positions,
        triangles,
    }
}
