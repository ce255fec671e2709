use serde::{Deserialize, Serialize};

use crate::surface::SurfaceType;

/// A triangle as three indices into its mesh's vertex list.
/// Winding order is carried over from the source and never reinterpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Triangle(pub [u32; 3]);

impl Triangle {
    pub fn new(a: u32, b: u32, c: u32) -> Self {
        Self([a, b, c])
    }

    pub fn indices(&self) -> [u32; 3] {
        self.0
    }
}

/// Indexed triangle mesh in the normalized output schema.
///
/// Invariant: every index of every face is `< vertices.len()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<[f64; 3]>,
    pub faces: Vec<Triangle>,
}

/// First out-of-range index found by [`Mesh::check_indices`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("face {face} references vertex {index}, but the mesh has {vertex_count} vertices")]
pub struct IndexOutOfRange {
    pub face: usize,
    pub index: u32,
    pub vertex_count: usize,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertices: usize, faces: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertices),
            faces: Vec::with_capacity(faces),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Verify the index invariant.
    pub fn check_indices(&self) -> Result<(), IndexOutOfRange> {
        let vertex_count = self.vertices.len();
        for (face, tri) in self.faces.iter().enumerate() {
            for &index in &tri.0 {
                if index as usize >= vertex_count {
                    return Err(IndexOutOfRange {
                        face,
                        index,
                        vertex_count,
                    });
                }
            }
        }
        Ok(())
    }

    /// Corner positions of face `i`.
    pub fn triangle_positions(&self, i: usize) -> Option<[[f64; 3]; 3]> {
        let tri = self.faces.get(i)?;
        let [a, b, c] = tri.0;
        Some([
            *self.vertices.get(a as usize)?,
            *self.vertices.get(b as usize)?,
            *self.vertices.get(c as usize)?,
        ])
    }
}

/// A mesh together with the surface family of each face it was built from.
///
/// `surface_types` is indexed by source face, which for b-rep inputs is the
/// topological face, not the triangle: faces that tessellate to nothing still
/// get an entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedMesh {
    pub mesh: Mesh,
    pub surface_types: Vec<SurfaceType>,
}

impl ClassifiedMesh {
    /// Tag every face of a flat-faceted mesh as planar.
    pub fn all_planar(mesh: Mesh) -> Self {
        let surface_types = vec![SurfaceType::Plane; mesh.faces.len()];
        Self {
            mesh,
            surface_types,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_triangle() -> Mesh {
        Mesh {
            vertices: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            faces: vec![Triangle::new(0, 1, 2)],
        }
    }

    #[test]
    fn valid_indices_pass() {
        assert!(single_triangle().check_indices().is_ok());
    }

    #[test]
    fn out_of_range_index_is_reported() {
        let mut mesh = single_triangle();
        mesh.faces.push(Triangle::new(0, 2, 3));
        let err = mesh.check_indices().unwrap_err();
        assert_eq!(err.face, 1);
        assert_eq!(err.index, 3);
        assert_eq!(err.vertex_count, 3);
    }

    #[test]
    fn triangle_serializes_as_flat_array() {
        let json = serde_json::to_string(&Triangle::new(3, 4, 5)).unwrap();
        assert_eq!(json, "[3,4,5]");
    }

    #[test]
    fn triangle_positions_resolves_corners() {
        let mesh = single_triangle();
        let corners = mesh.triangle_positions(0).unwrap();
        assert_eq!(corners[1], [1.0, 0.0, 0.0]);
        assert!(mesh.triangle_positions(1).is_none());
    }
}
