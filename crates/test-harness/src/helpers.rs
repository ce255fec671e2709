//! Helper functions: error type, fixture files on disk, mesh math.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use cad_types::{ErrorKind, Mesh};

// ── Error Type ──────────────────────────────────────────────────────────────

/// Unified error type for the test harness.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("assertion failed: {detail}")]
    AssertionFailed { detail: String },

    #[error("oracle failure ({oracle}): {detail}")]
    OracleFailure { oracle: String, detail: String },

    #[error("expected a mesh, pipeline returned {kind}: {message}")]
    UnexpectedError { kind: ErrorKind, message: String },

    #[error("expected an error, pipeline returned {what}")]
    UnexpectedSuccess { what: String },

    #[error("kernel error: {0}")]
    Kernel(#[from] brep_kernel::KernelError),

    #[error("fixture {path}: {source}")]
    Fixture {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ── Fixture Files ───────────────────────────────────────────────────────────

/// Write `bytes` to `dir/name` and return the path.
pub fn write_fixture(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf, HarnessError> {
    let path = dir.join(name);
    std::fs::write(&path, bytes).map_err(|source| HarnessError::Fixture {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

// ── Mesh Math Utilities ─────────────────────────────────────────────────────

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

/// Area of face `i`, or `None` if it references a missing vertex.
pub fn triangle_area(mesh: &Mesh, i: usize) -> Option<f64> {
    let [a, b, c] = mesh.triangle_positions(i)?;
    let [x, y, z] = cross(sub(b, a), sub(c, a));
    Some((x * x + y * y + z * z).sqrt() / 2.0)
}

/// Total surface area of a triangle mesh. Faces with bad indices are skipped.
pub fn mesh_surface_area(mesh: &Mesh) -> f64 {
    (0..mesh.faces.len()).filter_map(|i| triangle_area(mesh, i)).sum()
}

/// Signed-tetrahedron volume of a triangle mesh.
///
/// For a closed, consistently wound mesh this is the enclosed volume.
pub fn mesh_volume(mesh: &Mesh) -> f64 {
    let mut volume = 0.0;
    for i in 0..mesh.faces.len() {
        let Some([a, b, c]) = mesh.triangle_positions(i) else {
            continue;
        };
        let [x, y, z] = cross(b, c);
        volume += a[0] * x + a[1] * y + a[2] * z;
    }
    (volume / 6.0).abs()
}

/// Count mesh edges by vertex index: returns (total_edges, boundary_edges).
///
/// A boundary edge is used by exactly one triangle. Flat-layout meshes (no
/// shared indices) report every edge as boundary.
pub fn count_mesh_edges(mesh: &Mesh) -> (usize, usize) {
    let mut edge_counts: HashMap<(u32, u32), usize> = HashMap::new();
    for tri in &mesh.faces {
        let [a, b, c] = tri.indices();
        for (p, q) in [(a, b), (b, c), (c, a)] {
            *edge_counts.entry((p.min(q), p.max(q))).or_insert(0) += 1;
        }
    }
    let total = edge_counts.len();
    let boundary = edge_counts.values().filter(|&&c| c == 1).count();
    (total, boundary)
}
