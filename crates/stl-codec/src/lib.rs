//! STL encodings: sniffing, byte-level validation, repair, and extraction
//! into the normalized mesh schema.
//!
//! Binary STL layout:
//! - 80 bytes: header (arbitrary)
//! - 4 bytes: u32 LE triangle count
//! - Per triangle (50 bytes): 3 × f32 normal, 3 × 3 × f32 vertices,
//!   u16 attribute byte count

pub mod error;
pub mod extract;
pub mod reader;
pub mod repair;
pub mod sniff;
pub mod validate;
pub mod write;

pub use error::StlError;
pub use extract::extract;
pub use reader::StlTriangle;
pub use repair::{repair_file, repaired_path_for, weld_exact};
pub use sniff::{sniff, StlEncoding};
pub use validate::{validate_bytes, validate_file};
pub use write::{encode_binary, write_ascii, write_binary};

/// Header length in bytes.
pub const HEADER_LEN: usize = 80;
/// Header plus the u32 triangle count.
pub const PREAMBLE_LEN: usize = 84;
/// 12 bytes normal + 36 bytes vertices + 2 bytes attribute.
pub const RECORD_LEN: usize = 50;
/// Bound on |normal component|.
pub const NORMAL_LIMIT: f32 = 1.0;
/// Bound on |vertex coordinate|. A sanity bound against garbage, not a
/// physical limit.
pub const COORD_LIMIT: f32 = 1e6;
