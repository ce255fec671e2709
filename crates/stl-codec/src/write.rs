//! STL writers, binary and ASCII.

use std::fmt::Write as _;

use cad_types::Mesh;

use crate::error::StlError;
use crate::reader::StlTriangle;
use crate::{HEADER_LEN, PREAMBLE_LEN, RECORD_LEN};

/// Unit normal of a facet from its winding; zero for degenerate facets.
pub fn face_normal(v: [[f32; 3]; 3]) -> [f32; 3] {
    let a = v[0].map(f64::from);
    let b = v[1].map(f64::from);
    let c = v[2].map(f64::from);
    let e1 = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
    let e2 = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
    let nx = e1[1] * e2[2] - e1[2] * e2[1];
    let ny = e1[2] * e2[0] - e1[0] * e2[2];
    let nz = e1[0] * e2[1] - e1[1] * e2[0];
    let len = (nx * nx + ny * ny + nz * nz).sqrt();
    if len > 1e-12 && len.is_finite() {
        [(nx / len) as f32, (ny / len) as f32, (nz / len) as f32]
    } else {
        [0.0, 0.0, 0.0]
    }
}

/// Encode facets as binary STL. The header carries `name`, truncated to 80
/// bytes.
pub fn encode_binary(triangles: &[StlTriangle], name: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(PREAMBLE_LEN + triangles.len() * RECORD_LEN);

    let header = format!("binary STL: {}", name);
    let header_bytes = header.as_bytes();
    buf.extend_from_slice(&header_bytes[..header_bytes.len().min(HEADER_LEN)]);
    buf.resize(HEADER_LEN, 0u8);

    buf.extend_from_slice(&(triangles.len() as u32).to_le_bytes());

    for tri in triangles {
        for c in &tri.normal {
            buf.extend_from_slice(&c.to_le_bytes());
        }
        for v in &tri.vertices {
            for c in v {
                buf.extend_from_slice(&c.to_le_bytes());
            }
        }
        buf.extend_from_slice(&0u16.to_le_bytes());
    }

    buf
}

fn mesh_facets(mesh: &Mesh) -> Result<Vec<StlTriangle>, StlError> {
    if mesh.faces.is_empty() {
        return Err(StlError::Empty);
    }
    mesh.check_indices()
        .map_err(|e| StlError::malformed(e.to_string()))?;

    Ok(mesh
        .faces
        .iter()
        .map(|tri| {
            let corners = tri.0.map(|i| mesh.vertices[i as usize].map(|c| c as f32));
            StlTriangle::from_vertices(corners)
        })
        .collect())
}

/// Export a mesh as binary STL with normals recomputed from the winding.
pub fn write_binary(mesh: &Mesh, name: &str) -> Result<Vec<u8>, StlError> {
    Ok(encode_binary(&mesh_facets(mesh)?, name))
}

/// Export a mesh as an ASCII STL string.
pub fn write_ascii(mesh: &Mesh, name: &str) -> Result<String, StlError> {
    let facets = mesh_facets(mesh)?;
    let mut out = String::with_capacity(facets.len() * 300);
    // Writing to a String cannot fail.
    let _ = writeln!(out, "solid {}", name);
    for f in &facets {
        let [nx, ny, nz] = f.normal;
        let _ = writeln!(out, "  facet normal {} {} {}", nx, ny, nz);
        out.push_str("    outer loop\n");
        for [x, y, z] in f.vertices {
            let _ = writeln!(out, "      vertex {} {} {}", x, y, z);
        }
        out.push_str("    endloop\n");
        out.push_str("  endfacet\n");
    }
    let _ = writeln!(out, "endsolid {}", name);
    Ok(out)
}
