//! Binary/ASCII discrimination by byte inspection.
//!
//! The extension alone cannot tell the two encodings apart, so the size law
//! of the binary layout decides: a file is binary iff `len - 84` is an exact
//! multiple of 50. A file that satisfies the law by accident but reads as text
//! (first token `solid`, declared count inconsistent with the length, and
//! content that is text rather than records) is treated as ASCII.

use cad_types::FormatKind;

use crate::error::StlError;
use crate::{HEADER_LEN, PREAMBLE_LEN, RECORD_LEN};

/// The two STL encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StlEncoding {
    Binary,
    Ascii,
}

impl StlEncoding {
    pub fn format_kind(self) -> FormatKind {
        match self {
            StlEncoding::Binary => FormatKind::BinaryStl,
            StlEncoding::Ascii => FormatKind::AsciiStl,
        }
    }
}

/// Classify STL bytes. Files under 84 bytes are rejected before any count
/// is read.
pub fn sniff(bytes: &[u8]) -> Result<StlEncoding, StlError> {
    if bytes.len() < PREAMBLE_LEN {
        return Err(StlError::TooShort { len: bytes.len() });
    }

    if (bytes.len() - PREAMBLE_LEN) % RECORD_LEN != 0 {
        return Ok(StlEncoding::Ascii);
    }

    if starts_with_solid(bytes) {
        let consistent = declared_count(bytes)
            .map(|count| expected_binary_len(count) == bytes.len() as u64)
            .unwrap_or(false);
        if !consistent && reads_as_text(bytes) {
            return Ok(StlEncoding::Ascii);
        }
    }

    Ok(StlEncoding::Binary)
}

/// Triangle count stored at offset 80, if the buffer is long enough.
pub fn declared_count(bytes: &[u8]) -> Option<u32> {
    let b = bytes.get(HEADER_LEN..PREAMBLE_LEN)?;
    Some(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

/// Byte length a binary STL with `count` triangles must have.
pub fn expected_binary_len(count: u32) -> u64 {
    PREAMBLE_LEN as u64 + u64::from(count) * RECORD_LEN as u64
}

/// Whether the body is text: a `facet` keyword near the start, or valid
/// UTF-8 with no control characters besides whitespace. Binary headers are
/// usually NUL-padded and records rarely decode as UTF-8.
fn reads_as_text(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(1024)];
    if head.windows(5).any(|w| w.eq_ignore_ascii_case(b"facet")) {
        return true;
    }
    std::str::from_utf8(bytes)
        .map(|text| !text.chars().any(|c| c.is_control() && !c.is_ascii_whitespace()))
        .unwrap_or(false)
}

/// Whether the first whitespace-delimited token is `solid` (any case).
pub(crate) fn starts_with_solid(bytes: &[u8]) -> bool {
    let Some(start) = bytes.iter().position(|b| !b.is_ascii_whitespace()) else {
        return false;
    };
    let rest = &bytes[start..];
    let end = rest
        .iter()
        .position(|b| b.is_ascii_whitespace())
        .unwrap_or(rest.len());
    rest[..end].eq_ignore_ascii_case(b"solid")
}
