//! Triangle-soup readers for both encodings.
//!
//! Strict reads back extraction of validated files. Salvage reads back the
//! repairer: they keep every complete triangle they can find and count the
//! rest as skipped.

use std::iter::Peekable;
use std::str::SplitAsciiWhitespace;

use tracing::debug;

use crate::error::StlError;
use crate::sniff::{self, declared_count, expected_binary_len, StlEncoding};
use crate::{COORD_LIMIT, PREAMBLE_LEN, RECORD_LEN};

/// One STL facet as stored on disk (single precision).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StlTriangle {
    pub normal: [f32; 3],
    pub vertices: [[f32; 3]; 3],
}

impl StlTriangle {
    /// Build a facet whose normal is derived from the vertex winding.
    pub fn from_vertices(vertices: [[f32; 3]; 3]) -> Self {
        Self {
            normal: crate::write::face_normal(vertices),
            vertices,
        }
    }

    /// True when every vertex coordinate is finite and within the sanity bound.
    pub fn coordinates_in_bounds(&self) -> bool {
        self.vertices
            .iter()
            .flatten()
            .all(|c| c.is_finite() && c.abs() <= COORD_LIMIT)
    }
}

/// Triangles recovered by a tolerant read.
#[derive(Debug, Clone, Default)]
pub struct Salvage {
    pub triangles: Vec<StlTriangle>,
    /// Facets or records that could not be recovered.
    pub skipped: usize,
}

fn f32_at(bytes: &[u8], offset: usize) -> f32 {
    f32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// The 12 floats of a 50-byte record: normal then three vertices.
pub(crate) fn record_floats(record: &[u8]) -> [f32; 12] {
    let mut out = [0f32; 12];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = f32_at(record, i * 4);
    }
    out
}

fn decode_record(record: &[u8]) -> StlTriangle {
    let f = record_floats(record);
    StlTriangle {
        normal: [f[0], f[1], f[2]],
        vertices: [[f[3], f[4], f[5]], [f[6], f[7], f[8]], [f[9], f[10], f[11]]],
    }
}

/// Read every triangle of a well-formed file.
pub fn read_triangles(bytes: &[u8]) -> Result<Vec<StlTriangle>, StlError> {
    match sniff::sniff(bytes)? {
        StlEncoding::Binary => read_binary_strict(bytes),
        StlEncoding::Ascii => {
            let text = std::str::from_utf8(bytes)
                .map_err(|e| StlError::malformed(format!("ASCII STL is not valid UTF-8: {e}")))?;
            Ok(parse_ascii(text, true)?.triangles)
        }
    }
}

fn read_binary_strict(bytes: &[u8]) -> Result<Vec<StlTriangle>, StlError> {
    let count = declared_count(bytes).ok_or(StlError::TooShort { len: bytes.len() })?;
    let expected = expected_binary_len(count);
    if expected != bytes.len() as u64 {
        return Err(StlError::SizeMismatch {
            count,
            expected,
            actual: bytes.len() as u64,
        });
    }
    Ok(bytes[PREAMBLE_LEN..]
        .chunks_exact(RECORD_LEN)
        .map(decode_record)
        .collect())
}

/// Recover what triangles a damaged file still holds.
///
/// The encoding is decided by content rather than the size law, since a
/// truncated binary file no longer satisfies it.
pub fn salvage_triangles(bytes: &[u8]) -> Result<Salvage, StlError> {
    if bytes.len() < PREAMBLE_LEN {
        return Err(StlError::TooShort { len: bytes.len() });
    }

    if looks_like_text(bytes) {
        if let Ok(text) = std::str::from_utf8(bytes) {
            let salvage = parse_ascii(text, false)?;
            debug!(
                triangles = salvage.triangles.len(),
                skipped = salvage.skipped,
                "salvaged ASCII STL"
            );
            return Ok(salvage);
        }
    }

    let available = (bytes.len() - PREAMBLE_LEN) / RECORD_LEN;
    let declared = declared_count(bytes).unwrap_or(0) as usize;
    // A zero count is written by some exporters; otherwise never read past
    // what the header promises.
    let take = if declared == 0 {
        available
    } else {
        declared.min(available)
    };
    let skipped = declared.saturating_sub(available);
    let triangles: Vec<StlTriangle> = bytes[PREAMBLE_LEN..]
        .chunks_exact(RECORD_LEN)
        .take(take)
        .map(decode_record)
        .collect();
    debug!(
        declared,
        available,
        triangles = triangles.len(),
        "salvaged binary STL"
    );
    Ok(Salvage { triangles, skipped })
}

fn looks_like_text(bytes: &[u8]) -> bool {
    if !sniff::starts_with_solid(bytes) {
        return false;
    }
    // Binary exporters sometimes start their header with "solid"; a real text
    // file also has facets.
    let probe = &bytes[..bytes.len().min(1024)];
    probe.windows(5).any(|w| w.eq_ignore_ascii_case(b"facet"))
        || (bytes.len() - PREAMBLE_LEN) % RECORD_LEN != 0
}

type Tokens<'a> = Peekable<SplitAsciiWhitespace<'a>>;

fn keyword(tokens: &mut Tokens<'_>, kw: &str) -> Result<(), StlError> {
    match tokens.next_if(|t| t.eq_ignore_ascii_case(kw)) {
        Some(_) => Ok(()),
        None => Err(StlError::malformed(format!(
            "expected '{kw}', found '{}'",
            tokens.peek().copied().unwrap_or("end of file")
        ))),
    }
}

fn number(tokens: &mut Tokens<'_>) -> Result<f32, StlError> {
    let value = tokens.peek().and_then(|t| t.parse::<f32>().ok());
    match value {
        Some(v) => {
            tokens.next();
            Ok(v)
        }
        None => Err(StlError::malformed(format!(
            "expected a number, found '{}'",
            tokens.peek().copied().unwrap_or("end of file")
        ))),
    }
}

fn triple(tokens: &mut Tokens<'_>) -> Result<[f32; 3], StlError> {
    Ok([number(tokens)?, number(tokens)?, number(tokens)?])
}

/// Parse the body of a facet; the leading `facet` token is already consumed.
fn parse_facet(tokens: &mut Tokens<'_>) -> Result<StlTriangle, StlError> {
    keyword(tokens, "normal")?;
    let normal = triple(tokens)?;
    keyword(tokens, "outer")?;
    keyword(tokens, "loop")?;
    let mut vertices = [[0f32; 3]; 3];
    for v in vertices.iter_mut() {
        keyword(tokens, "vertex")?;
        *v = triple(tokens)?;
    }
    keyword(tokens, "endloop")?;
    keyword(tokens, "endfacet")?;
    Ok(StlTriangle { normal, vertices })
}

fn parse_ascii(text: &str, strict: bool) -> Result<Salvage, StlError> {
    let mut tokens = text.split_ascii_whitespace().peekable();
    let mut salvage = Salvage::default();

    if keyword(&mut tokens, "solid").is_err() && strict {
        return Err(StlError::malformed("ASCII STL must begin with 'solid'"));
    }

    let mut ended = false;
    while let Some(tok) = tokens.next() {
        if tok.eq_ignore_ascii_case("facet") {
            match parse_facet(&mut tokens) {
                Ok(tri) => salvage.triangles.push(tri),
                Err(e) if strict => {
                    return Err(StlError::malformed(format!(
                        "facet {}: {e}",
                        salvage.triangles.len()
                    )))
                }
                Err(_) => salvage.skipped += 1,
            }
        } else if tok.eq_ignore_ascii_case("endsolid") {
            ended = true;
        }
        // Solid names and anything between solids are ignored.
    }

    if strict && !ended {
        return Err(StlError::malformed("ASCII STL is missing 'endsolid'"));
    }
    Ok(salvage)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE_FACET: &str = "solid t\n\
        facet normal 0 0 1\n outer loop\n vertex 0 0 0\n vertex 1 0 0\n vertex 0 1 0\n endloop\n endfacet\n\
        endsolid t\n";

    #[test]
    fn strict_ascii_reads_one_facet() {
        let tris = read_triangles(ONE_FACET.as_bytes()).unwrap();
        assert_eq!(tris.len(), 1);
        assert_eq!(tris[0].vertices[1], [1.0, 0.0, 0.0]);
        assert_eq!(tris[0].normal, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn strict_ascii_rejects_broken_facet() {
        let broken = ONE_FACET.replace("vertex 1 0 0", "vertex 1 0");
        let err = read_triangles(broken.as_bytes()).unwrap_err();
        assert!(matches!(err, StlError::Malformed { .. }), "{err}");
    }

    #[test]
    fn salvage_skips_broken_facet_and_keeps_next() {
        let text = "solid t\n\
            facet normal 0 0 1 outer loop vertex 0 0 0 vertex 1 0 endloop endfacet\n\
            facet normal 0 0 1 outer loop vertex 0 0 0 vertex 2 0 0 vertex 0 2 0 endloop endfacet\n\
            facet normal 0 0 1 outer loop vertex 5 5";
        let mut padded = text.to_string();
        while padded.len() < PREAMBLE_LEN {
            padded.push(' ');
        }
        let salvage = salvage_triangles(padded.as_bytes()).unwrap();
        assert_eq!(salvage.triangles.len(), 1);
        assert_eq!(salvage.triangles[0].vertices[1], [2.0, 0.0, 0.0]);
        assert_eq!(salvage.skipped, 2);
    }

    #[test]
    fn salvage_binary_drops_truncated_tail() {
        let tri = StlTriangle::from_vertices([[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        let mut bytes = crate::write::encode_binary(&[tri, tri, tri], "t");
        bytes.truncate(bytes.len() - 20);
        let salvage = salvage_triangles(&bytes).unwrap();
        assert_eq!(salvage.triangles.len(), 2);
        assert_eq!(salvage.skipped, 1);
    }

    #[test]
    fn out_of_bounds_coordinates_are_flagged() {
        let ok = StlTriangle::from_vertices([[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        assert!(ok.coordinates_in_bounds());
        let far = StlTriangle::from_vertices([[0.0; 3], [2e6, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        assert!(!far.coordinates_in_bounds());
        let nan = StlTriangle::from_vertices([[f32::NAN, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        assert!(!nan.coordinates_in_bounds());
    }
}
