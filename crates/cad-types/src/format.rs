use serde::{Deserialize, Serialize};

/// Concrete format variant of an input file, derived once per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormatKind {
    BinaryStl,
    AsciiStl,
    Step,
    Iges,
    Obj,
    Image,
    Unsupported,
}

impl FormatKind {
    pub fn is_stl(self) -> bool {
        matches!(self, FormatKind::BinaryStl | FormatKind::AsciiStl)
    }

    /// Boundary-representation formats that need tessellation.
    pub fn is_brep(self) -> bool {
        matches!(self, FormatKind::Step | FormatKind::Iges)
    }
}
