//! Verification oracles: pure functions returning pass/fail verdicts.
//!
//! Each oracle returns an `OracleVerdict` with diagnostic detail, not panics.
//! This lets a scenario collect all failures in one pass.

use std::collections::HashMap;

use cad_types::{Mesh, MeshResult, SurfaceType};

use crate::helpers::{count_mesh_edges, triangle_area};

/// The result of a single oracle check.
#[derive(Debug, Clone)]
pub struct OracleVerdict {
    pub oracle_name: String,
    pub passed: bool,
    pub detail: String,
    pub value: Option<f64>,
}

impl OracleVerdict {
    fn pass(name: &str, detail: String) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: true,
            detail,
            value: None,
        }
    }

    fn pass_val(name: &str, detail: String, value: f64) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: true,
            detail,
            value: Some(value),
        }
    }

    fn fail(name: &str, detail: String) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: false,
            detail,
            value: None,
        }
    }

    fn fail_val(name: &str, detail: String, value: f64) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: false,
            detail,
            value: Some(value),
        }
    }
}

// ── Mesh Oracles ────────────────────────────────────────────────────────────

/// Check that every face index is `< vertices.len()`.
pub fn check_valid_indices(mesh: &Mesh) -> OracleVerdict {
    let vertex_count = mesh.vertices.len();
    let bad: Vec<(usize, u32)> = mesh
        .faces
        .iter()
        .enumerate()
        .flat_map(|(i, tri)| tri.indices().into_iter().map(move |idx| (i, idx)))
        .filter(|&(_, idx)| idx as usize >= vertex_count)
        .collect();

    if bad.is_empty() {
        OracleVerdict::pass("valid_indices", format!("all indices < {}", vertex_count))
    } else {
        OracleVerdict::fail(
            "valid_indices",
            format!(
                "{} out-of-bounds indices (vertex_count={}): {:?}",
                bad.len(),
                vertex_count,
                &bad[..bad.len().min(5)]
            ),
        )
    }
}

/// Check the layout STL extraction produces: three fresh vertices per face,
/// face `i` referencing `3i, 3i+1, 3i+2`.
pub fn check_flat_layout(mesh: &Mesh) -> OracleVerdict {
    if mesh.vertices.len() != 3 * mesh.faces.len() {
        return OracleVerdict::fail(
            "flat_layout",
            format!(
                "{} vertices for {} faces, expected {}",
                mesh.vertices.len(),
                mesh.faces.len(),
                3 * mesh.faces.len()
            ),
        );
    }
    for (i, tri) in mesh.faces.iter().enumerate() {
        let base = 3 * i as u32;
        if tri.indices() != [base, base + 1, base + 2] {
            return OracleVerdict::fail(
                "flat_layout",
                format!("face {} is {:?}, expected [{}, {}, {}]", i, tri.0, base, base + 1, base + 2),
            );
        }
    }
    OracleVerdict::pass("flat_layout", format!("{} faces, 3 vertices each", mesh.faces.len()))
}

/// Check that no vertex position appears twice. Holds for welded meshes.
pub fn check_unique_vertices(mesh: &Mesh) -> OracleVerdict {
    let mut seen: HashMap<[u64; 3], usize> = HashMap::new();
    for (i, v) in mesh.vertices.iter().enumerate() {
        let key = v.map(|c| if c == 0.0 { 0u64 } else { c.to_bits() });
        if let Some(first) = seen.insert(key, i) {
            return OracleVerdict::fail(
                "unique_vertices",
                format!("vertices {} and {} are both at {:?}", first, i, v),
            );
        }
    }
    OracleVerdict::pass("unique_vertices", format!("{} distinct vertices", mesh.vertices.len()))
}

/// Check that no triangles have zero area (degenerate).
pub fn check_no_degenerate_triangles(mesh: &Mesh) -> OracleVerdict {
    let total = mesh.faces.len();
    let degenerate = (0..total)
        .filter(|&i| triangle_area(mesh, i).map_or(true, |a| a < 1e-12))
        .count();

    if degenerate == 0 {
        OracleVerdict::pass(
            "no_degenerate_triangles",
            format!("all {} triangles have non-zero area", total),
        )
    } else {
        OracleVerdict::fail(
            "no_degenerate_triangles",
            format!("{} of {} triangles are degenerate", degenerate, total),
        )
    }
}

/// Check that the mesh is closed: every index edge is shared by two triangles.
///
/// Only meaningful for welded meshes.
pub fn check_watertight_mesh(mesh: &Mesh) -> OracleVerdict {
    let (total, boundary) = count_mesh_edges(mesh);
    if boundary == 0 {
        OracleVerdict::pass("watertight_mesh", format!("all {} edges paired", total))
    } else {
        OracleVerdict::fail_val(
            "watertight_mesh",
            format!("{} boundary edges out of {} total", boundary, total),
            boundary as f64,
        )
    }
}

/// Check that the mesh has at least `min` triangles.
pub fn check_min_triangles(mesh: &Mesh, min: usize) -> OracleVerdict {
    let n = mesh.faces.len();
    if n >= min {
        OracleVerdict::pass_val("min_triangles", format!("{} triangles (need >= {})", n, min), n as f64)
    } else {
        OracleVerdict::fail_val("min_triangles", format!("{} triangles, need >= {}", n, min), n as f64)
    }
}

// ── Classification Oracles ──────────────────────────────────────────────────

/// Check that exactly `expected` faces are of surface type `ty`.
pub fn check_surface_type_count(
    surface_types: &[SurfaceType],
    ty: SurfaceType,
    expected: usize,
) -> OracleVerdict {
    let n = surface_types.iter().filter(|t| **t == ty).count();
    if n == expected {
        OracleVerdict::pass_val(
            "surface_type_count",
            format!("{} {:?} faces", n, ty),
            n as f64,
        )
    } else {
        OracleVerdict::fail_val(
            "surface_type_count",
            format!("{} {:?} faces, expected {}. All types: {:?}", n, ty, expected, surface_types),
            n as f64,
        )
    }
}

// ── Result Oracles ──────────────────────────────────────────────────────────

/// Check the reported center and size against expected values.
pub fn check_bounds(
    result: &MeshResult,
    expected_center: [f64; 3],
    expected_size: [f64; 3],
    tolerance: f64,
) -> OracleVerdict {
    for i in 0..3 {
        if (result.center[i] - expected_center[i]).abs() > tolerance {
            return OracleVerdict::fail(
                "bounds",
                format!(
                    "center[{}]: expected {:.4}, got {:.4} (tol={})",
                    i, expected_center[i], result.center[i], tolerance
                ),
            );
        }
        if (result.size[i] - expected_size[i]).abs() > tolerance {
            return OracleVerdict::fail(
                "bounds",
                format!(
                    "size[{}]: expected {:.4}, got {:.4} (tol={})",
                    i, expected_size[i], result.size[i], tolerance
                ),
            );
        }
    }
    OracleVerdict::pass(
        "bounds",
        format!("center {:?}, size {:?}", result.center, result.size),
    )
}

/// Check that the serialized result carries exactly the viewer keys.
pub fn check_viewer_json(result: &MeshResult) -> OracleVerdict {
    let value = match serde_json::to_value(result) {
        Ok(v) => v,
        Err(e) => return OracleVerdict::fail("viewer_json", format!("serialization failed: {}", e)),
    };
    let Some(obj) = value.as_object() else {
        return OracleVerdict::fail("viewer_json", format!("not an object: {}", value));
    };
    let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
    keys.sort_unstable();
    let expected = ["center", "faces", "size", "surface_types", "vertices"];
    if keys == expected {
        OracleVerdict::pass("viewer_json", format!("keys {:?}", keys))
    } else {
        OracleVerdict::fail("viewer_json", format!("keys {:?}, expected {:?}", keys, expected))
    }
}

// ── Composite ───────────────────────────────────────────────────────────────

/// Checks every mesh handed to the viewer must pass.
pub fn run_all_mesh_checks(mesh: &Mesh) -> Vec<OracleVerdict> {
    vec![
        check_valid_indices(mesh),
        check_no_degenerate_triangles(mesh),
        check_min_triangles(mesh, 1),
    ]
}

/// Mesh checks plus the output schema.
pub fn run_result_checks(result: &MeshResult) -> Vec<OracleVerdict> {
    let mut verdicts = run_all_mesh_checks(&result.mesh);
    verdicts.push(check_viewer_json(result));
    verdicts
}
