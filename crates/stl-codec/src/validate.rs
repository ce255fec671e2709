//! Byte-level structural validation. Read-only: never touches the input.

use std::path::Path;

use cad_types::{ErrorKind, ValidationVerdict};
use tracing::{debug, instrument};

use crate::error::StlError;
use crate::reader::record_floats;
use crate::sniff::{self, declared_count, expected_binary_len, StlEncoding};
use crate::{COORD_LIMIT, NORMAL_LIMIT, PREAMBLE_LEN, RECORD_LEN};

/// Validate an STL file on disk.
///
/// Fails when the file is missing, does not carry an `.stl` extension, or
/// its bytes fail [`validate_bytes`].
#[instrument(skip_all, fields(path = %path.display()))]
pub fn validate_file(path: &Path) -> ValidationVerdict {
    if !path.exists() {
        return ValidationVerdict::fail(
            ErrorKind::FileNotFound,
            format!("file not found: {}", path.display()),
        );
    }

    let is_stl = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("stl"))
        .unwrap_or(false);
    if !is_stl {
        return ValidationVerdict::fail(
            ErrorKind::UnsupportedFormat,
            format!("not an .stl file: {}", path.display()),
        );
    }

    match std::fs::read(path) {
        Ok(bytes) => validate_bytes(&bytes),
        Err(e) => ValidationVerdict::fail(
            ErrorKind::StructuralInvalid,
            format!("could not read {}: {}", path.display(), e),
        ),
    }
}

/// Validate STL bytes of either encoding.
pub fn validate_bytes(bytes: &[u8]) -> ValidationVerdict {
    let verdict = match check(bytes) {
        Ok(summary) => ValidationVerdict::pass(summary),
        Err(e) => ValidationVerdict::fail(e.kind(), e.to_string()),
    };
    debug!(valid = verdict.valid, message = %verdict.message, "STL validation");
    verdict
}

fn check(bytes: &[u8]) -> Result<String, StlError> {
    match sniff::sniff(bytes)? {
        StlEncoding::Binary => check_binary(bytes),
        StlEncoding::Ascii => check_ascii(bytes),
    }
}

fn check_binary(bytes: &[u8]) -> Result<String, StlError> {
    let count = declared_count(bytes).ok_or(StlError::TooShort { len: bytes.len() })?;
    let expected = expected_binary_len(count);
    let actual = bytes.len() as u64;
    if expected != actual {
        return Err(StlError::SizeMismatch {
            count,
            expected,
            actual,
        });
    }

    for (triangle, record) in bytes[PREAMBLE_LEN..].chunks_exact(RECORD_LEN).enumerate() {
        let floats = record_floats(record);
        // `contains` is false for NaN, so NaN is out of range too.
        if let Some(&value) = floats[..3]
            .iter()
            .find(|n| !(-NORMAL_LIMIT..=NORMAL_LIMIT).contains(*n))
        {
            return Err(StlError::ValueOutOfRange {
                triangle,
                what: "normal component",
                value,
                limit: NORMAL_LIMIT,
            });
        }
        if let Some(&value) = floats[3..]
            .iter()
            .find(|c| !(-COORD_LIMIT..=COORD_LIMIT).contains(*c))
        {
            return Err(StlError::ValueOutOfRange {
                triangle,
                what: "vertex coordinate",
                value,
                limit: COORD_LIMIT,
            });
        }
    }

    Ok(format!("valid binary STL with {} triangles", count))
}

fn check_ascii(bytes: &[u8]) -> Result<String, StlError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| StlError::malformed(format!("ASCII STL is not valid UTF-8: {e}")))?;

    if !sniff::starts_with_solid(bytes) {
        return Err(StlError::malformed("ASCII STL must begin with 'solid'"));
    }

    let tail = &bytes[bytes.len().saturating_sub(80)..];
    if !tail.windows(8).any(|w| w.eq_ignore_ascii_case(b"endsolid")) {
        return Err(StlError::malformed(
            "ASCII STL must end with 'endsolid' within its last 80 bytes",
        ));
    }

    let (facets, endfacets) = count_facet_markers(text);
    if facets != endfacets {
        return Err(StlError::malformed(format!(
            "{} 'facet normal' but {} 'endfacet'; the file is truncated or corrupt",
            facets, endfacets
        )));
    }

    Ok(format!("valid ASCII STL with {} facets", facets))
}

/// Count `facet normal` openers and `endfacet` closers.
fn count_facet_markers(text: &str) -> (usize, usize) {
    let mut facets = 0;
    let mut endfacets = 0;
    let mut tokens = text.split_ascii_whitespace().peekable();
    while let Some(tok) = tokens.next() {
        if tok.eq_ignore_ascii_case("facet") {
            if tokens.next_if(|t| t.eq_ignore_ascii_case("normal")).is_some() {
                facets += 1;
            }
        } else if tok.eq_ignore_ascii_case("endfacet") {
            endfacets += 1;
        }
    }
    (facets, endfacets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::StlTriangle;
    use crate::write::encode_binary;

    fn unit_triangle() -> StlTriangle {
        StlTriangle::from_vertices([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]])
    }

    fn ascii(facets: usize, closers: usize, head: &str) -> String {
        let mut s = format!("{head}\n");
        for i in 0..facets {
            s.push_str("facet normal 0 0 1\nouter loop\nvertex 0 0 0\nvertex 1 0 0\nvertex 0 1 0\nendloop\n");
            if i < closers {
                s.push_str("endfacet\n");
            }
        }
        s.push_str("endsolid part\n");
        s
    }

    #[test]
    fn valid_binary_passes() {
        let bytes = encode_binary(&[unit_triangle(), unit_triangle()], "ok");
        assert_eq!(bytes.len(), 184);
        let verdict = validate_bytes(&bytes);
        assert!(verdict.valid, "{}", verdict.message);
        assert_eq!(verdict.kind, None);
    }

    #[test]
    fn wrong_count_is_size_mismatch() {
        let mut bytes = encode_binary(&[unit_triangle(), unit_triangle()], "ok");
        bytes[80..84].copy_from_slice(&3u32.to_le_bytes());
        let verdict = validate_bytes(&bytes);
        assert!(!verdict.valid);
        assert_eq!(verdict.kind, Some(ErrorKind::SizeMismatch));
        assert!(verdict.message.contains("234"), "{}", verdict.message);
        assert!(verdict.message.contains("184"), "{}", verdict.message);
    }

    #[test]
    fn solid_header_with_wrong_count_is_size_mismatch() {
        let mut bytes = encode_binary(&[unit_triangle(), unit_triangle()], "ok");
        bytes[..19].copy_from_slice(b"solid part exported");
        bytes[80..84].copy_from_slice(&3u32.to_le_bytes());
        let verdict = validate_bytes(&bytes);
        assert_eq!(verdict.kind, Some(ErrorKind::SizeMismatch));
        assert!(verdict.message.contains("expected 234 bytes, got 184"), "{}", verdict.message);
    }

    #[test]
    fn normal_out_of_range_is_rejected() {
        let mut tri = unit_triangle();
        tri.normal = [0.0, 0.0, 1.5];
        let verdict = validate_bytes(&encode_binary(&[tri], "n"));
        assert_eq!(verdict.kind, Some(ErrorKind::ValueOutOfRange));
        assert!(verdict.message.contains("normal"));
    }

    #[test]
    fn nan_normal_is_rejected() {
        let mut tri = unit_triangle();
        tri.normal = [f32::NAN, 0.0, 1.0];
        let verdict = validate_bytes(&encode_binary(&[tri], "n"));
        assert_eq!(verdict.kind, Some(ErrorKind::ValueOutOfRange));
    }

    #[test]
    fn vertex_out_of_range_is_rejected() {
        let mut tri = unit_triangle();
        tri.vertices[2] = [0.0, -2.0e6, 0.0];
        let verdict = validate_bytes(&encode_binary(&[tri], "v"));
        assert_eq!(verdict.kind, Some(ErrorKind::ValueOutOfRange));
        assert!(verdict.message.contains("vertex"));
    }

    #[test]
    fn bounds_are_inclusive() {
        let mut tri = unit_triangle();
        tri.normal = [-1.0, 0.0, 1.0];
        tri.vertices[0] = [1.0e6, -1.0e6, 0.0];
        assert!(validate_bytes(&encode_binary(&[tri], "edge")).valid);
    }

    #[test]
    fn eighty_three_bytes_is_structural() {
        let verdict = validate_bytes(&[0u8; 83]);
        assert_eq!(verdict.kind, Some(ErrorKind::StructuralInvalid));
    }

    #[test]
    fn ascii_uppercase_solid_passes() {
        let text = ascii(2, 2, "SOLID part1");
        let verdict = validate_bytes(text.as_bytes());
        assert!(verdict.valid, "{}", verdict.message);
    }

    #[test]
    fn ascii_unmatched_endfacet_fails() {
        let text = ascii(3, 2, "solid part");
        let verdict = validate_bytes(text.as_bytes());
        assert_eq!(verdict.kind, Some(ErrorKind::StructuralInvalid));
        assert!(verdict.message.contains("endfacet"));
    }

    #[test]
    fn ascii_without_solid_fails() {
        let text = ascii(2, 2, "mesh part");
        let verdict = validate_bytes(text.as_bytes());
        assert!(!verdict.valid);
        assert!(verdict.message.contains("solid"));
    }

    #[test]
    fn ascii_endsolid_must_be_near_the_end() {
        let mut text = ascii(2, 2, "solid part");
        text.push_str(&" ".repeat(100));
        let verdict = validate_bytes(text.as_bytes());
        assert!(!verdict.valid);
        assert!(verdict.message.contains("endsolid"));
    }

    #[test]
    fn non_utf8_ascii_is_invalid_not_a_crash() {
        let mut bytes = ascii(2, 2, "solid part").into_bytes();
        bytes[8] = 0xff;
        bytes.push(b'\n');
        let verdict = validate_bytes(&bytes);
        assert!(!verdict.valid);
    }

    #[test]
    fn missing_file_is_file_not_found() {
        let verdict = validate_file(Path::new("/nonexistent/dir/model.stl"));
        assert_eq!(verdict.kind, Some(ErrorKind::FileNotFound));
    }

    #[test]
    fn wrong_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.obj");
        std::fs::write(&path, encode_binary(&[unit_triangle()], "x")).unwrap();
        let verdict = validate_file(&path);
        assert_eq!(verdict.kind, Some(ErrorKind::UnsupportedFormat));
    }

    #[test]
    fn uppercase_extension_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("MODEL.STL");
        std::fs::write(&path, encode_binary(&[unit_triangle()], "x")).unwrap();
        assert!(validate_file(&path).valid);
    }
}
