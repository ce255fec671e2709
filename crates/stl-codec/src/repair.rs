//! Best-effort repair: salvage a triangle soup, weld identical vertices,
//! and write a new binary STL next to the original.
//!
//! The original file is never modified. The output is written to a
//! temporary sibling and renamed into place only once its bytes pass the
//! validator, so a failed repair leaves nothing behind.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use cad_types::{Mesh, RepairOutcome, Triangle};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::StlError;
use crate::reader::{salvage_triangles, StlTriangle};
use crate::validate::validate_bytes;
use crate::write::write_binary;

/// Summary of a successful repair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairReport {
    pub triangles: usize,
    pub vertices: usize,
    /// Facets lost to truncation, parse errors or implausible coordinates.
    pub dropped: usize,
}

/// Repair the STL at `path`, writing `<stem>_repaired.<ext>` beside it.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn repair_file(path: &Path) -> RepairOutcome {
    match try_repair(path) {
        Ok((out, report)) => {
            info!(
                output = %out.display(),
                triangles = report.triangles,
                vertices = report.vertices,
                dropped = report.dropped,
                "STL repaired"
            );
            RepairOutcome::repaired(
                out,
                format!(
                    "repaired mesh has {} triangles and {} unique vertices ({} facets dropped)",
                    report.triangles, report.vertices, report.dropped
                ),
            )
        }
        Err(e) => {
            warn!(error = %e, "STL repair failed");
            RepairOutcome::failed(e.to_string())
        }
    }
}

fn try_repair(path: &Path) -> Result<(PathBuf, RepairReport), StlError> {
    let bytes = fs::read(path).map_err(|source| StlError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let (mesh, report) = repair_bytes(&bytes)?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("repaired");
    let encoded = write_binary(&mesh, name)?;

    let verdict = validate_bytes(&encoded);
    if !verdict.valid {
        return Err(StlError::RepairFailed {
            reason: format!("repaired output does not validate: {}", verdict.message),
        });
    }

    let out = repaired_path_for(path);
    write_via_temp(&out, &encoded)?;
    Ok((out, report))
}

/// Rebuild an indexed mesh from whatever triangles the bytes still hold.
pub fn repair_bytes(bytes: &[u8]) -> Result<(Mesh, RepairReport), StlError> {
    let salvage = salvage_triangles(bytes).map_err(|e| StlError::RepairFailed {
        reason: format!("source cannot be read as a triangle soup: {e}"),
    })?;

    let total = salvage.triangles.len();
    let kept: Vec<StlTriangle> = salvage
        .triangles
        .into_iter()
        .filter(StlTriangle::coordinates_in_bounds)
        .collect();
    let dropped = salvage.skipped + (total - kept.len());

    if kept.is_empty() {
        return Err(StlError::RepairFailed {
            reason: "no salvageable triangles".to_string(),
        });
    }

    let mesh = weld_exact(&kept);
    let report = RepairReport {
        triangles: mesh.faces.len(),
        vertices: mesh.vertices.len(),
        dropped,
    };
    Ok((mesh, report))
}

/// Hash key for exact coordinate equality. `-0.0` folds into `0.0` because
/// the two compare equal.
fn coordinate_key(v: [f32; 3]) -> [u32; 3] {
    v.map(|c| if c == 0.0 { 0u32 } else { c.to_bits() })
}

/// Merge vertices whose three coordinates are exactly equal and index the
/// triangles against the merged list. No tolerance is applied.
pub fn weld_exact(triangles: &[StlTriangle]) -> Mesh {
    let mut lookup: HashMap<[u32; 3], u32> = HashMap::with_capacity(triangles.len());
    let mut mesh = Mesh::with_capacity(triangles.len() / 2 + 3, triangles.len());

    for tri in triangles {
        let mut face = [0u32; 3];
        for (slot, v) in face.iter_mut().zip(tri.vertices.iter()) {
            let next = mesh.vertices.len() as u32;
            let index = *lookup.entry(coordinate_key(*v)).or_insert(next);
            if index == next {
                mesh.vertices.push(v.map(f64::from));
            }
            *slot = index;
        }
        mesh.faces.push(Triangle(face));
    }

    mesh
}

/// `dir/part.stl` becomes `dir/part_repaired.stl`.
pub fn repaired_path_for(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}_repaired.{}", stem, ext.to_string_lossy()),
        None => format!("{}_repaired", stem),
    };
    path.with_file_name(name)
}

fn write_via_temp(out: &Path, bytes: &[u8]) -> Result<(), StlError> {
    let tmp = out.with_file_name(format!(".{}.tmp", Uuid::new_v4()));
    let result = fs::write(&tmp, bytes).and_then(|_| fs::rename(&tmp, out));
    if let Err(source) = result {
        // Best effort: the temp file may not exist if the write itself failed.
        let _ = fs::remove_file(&tmp);
        return Err(StlError::Io {
            path: out.to_path_buf(),
            source,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::write::encode_binary;
    use cad_types::ErrorKind;

    fn tri(v: [[f32; 3]; 3]) -> StlTriangle {
        StlTriangle::from_vertices(v)
    }

    fn square() -> Vec<StlTriangle> {
        vec![
            tri([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]]),
            tri([[0.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]]),
        ]
    }

    #[test]
    fn weld_merges_shared_corners() {
        let mesh = weld_exact(&square());
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.faces, vec![Triangle::new(0, 1, 2), Triangle::new(0, 2, 3)]);
        assert!(mesh.check_indices().is_ok());
    }

    #[test]
    fn weld_is_exact_not_tolerant() {
        let near = vec![
            tri([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]),
            tri([[0.0, 0.0, 1e-7], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]),
        ];
        assert_eq!(weld_exact(&near).vertices.len(), 4);
    }

    #[test]
    fn weld_folds_negative_zero() {
        let t = vec![
            tri([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]),
            tri([[-0.0, 0.0, -0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]),
        ];
        assert_eq!(weld_exact(&t).vertices.len(), 3);
    }

    #[test]
    fn repaired_path_keeps_extension() {
        assert_eq!(
            repaired_path_for(Path::new("/up/part.stl")),
            PathBuf::from("/up/part_repaired.stl")
        );
        assert_eq!(
            repaired_path_for(Path::new("/up/part")),
            PathBuf::from("/up/part_repaired")
        );
    }

    #[test]
    fn repair_fixes_size_mismatch_and_leaves_original() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.stl");
        let mut bytes = encode_binary(&square(), "bad");
        bytes[80..84].copy_from_slice(&5u32.to_le_bytes());
        fs::write(&path, &bytes).unwrap();

        let outcome = repair_file(&path);
        assert!(outcome.success, "{}", outcome.message);
        let out = outcome.repaired_path.unwrap();
        assert_eq!(out, dir.path().join("bad_repaired.stl"));
        assert!(validate_bytes(&fs::read(&out).unwrap()).valid);
        assert_eq!(fs::read(&path).unwrap(), bytes);
    }

    #[test]
    fn repair_drops_implausible_triangles_and_fixes_normals() {
        let mut bad_normal = square()[0];
        bad_normal.normal = [3.0, 0.0, 0.0];
        let far = tri([[0.0, 0.0, 0.0], [5e6, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        let (mesh, report) = repair_bytes(&encode_binary(&[bad_normal, far], "x")).unwrap();
        assert_eq!(mesh.faces.len(), 1);
        assert_eq!(report.dropped, 1);
    }

    #[test]
    fn unsalvageable_file_fails_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.stl");
        fs::write(&path, b"solid junk\nnothing here at all\n").unwrap();

        let outcome = repair_file(&path);
        assert!(!outcome.success);
        assert!(outcome.repaired_path.is_none());
        assert!(!repaired_path_for(&path).exists());
        let leftovers = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1, "only the original should remain");
    }

    #[test]
    fn missing_file_fails() {
        let outcome = repair_file(Path::new("/nonexistent/part.stl"));
        assert!(!outcome.success);
        let err = repair_bytes(&[0u8; 10]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RepairFailed);
    }
}
