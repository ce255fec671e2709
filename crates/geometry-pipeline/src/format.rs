//! Extension policy and format sniffing.
//!
//! Images, b-rep and OBJ files are classified by extension alone. STL needs
//! byte inspection to tell the binary and ASCII encodings apart.

use std::path::Path;

use cad_types::FormatKind;

use crate::error::PipelineError;

/// Upload allow-list, lower case.
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "stl", "obj", "step", "stp", "iges", "igs", "jpg", "jpeg", "png", "gif",
];

/// Lower-cased extension of a file name, if it has one.
pub fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| e.to_ascii_lowercase())
}

/// True iff the name carries an extension on the allow-list.
pub fn allowed_file(filename: &str) -> bool {
    extension_of(filename)
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Classify an input from its declared extension and, for STL, its bytes.
pub fn sniff_format(extension: &str, bytes: &[u8]) -> Result<FormatKind, PipelineError> {
    let ext = extension.trim_start_matches('.').to_ascii_lowercase();
    Ok(match ext.as_str() {
        "jpg" | "jpeg" | "png" | "gif" => FormatKind::Image,
        "step" | "stp" => FormatKind::Step,
        "iges" | "igs" => FormatKind::Iges,
        "obj" => FormatKind::Obj,
        "stl" => stl_codec::sniff(bytes)?.format_kind(),
        _ => FormatKind::Unsupported,
    })
}
