//! In-memory input files for every supported format.

use std::fmt::Write as _;

use brep_kernel::primitives::{make_box, make_cylinder};
use brep_kernel::step_export::export_step;
use stl_codec::{encode_binary, StlTriangle};

use crate::helpers::HarnessError;

/// Corners of one facet.
pub type Facet = [[f32; 3]; 3];

/// The triangle `(0,0,0), (1,0,0), (0,1,0)`.
pub const UNIT_TRIANGLE: Facet = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];

/// Two triangles forming the unit square in the z=0 plane, sharing an edge.
pub fn unit_square() -> Vec<Facet> {
    vec![
        [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]],
        [[0.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
    ]
}

// ── STL ─────────────────────────────────────────────────────────────────────

/// Binary STL with normals computed from the winding.
pub fn binary_stl(facets: &[Facet]) -> Vec<u8> {
    let triangles: Vec<StlTriangle> = facets
        .iter()
        .map(|v| StlTriangle::from_vertices(*v))
        .collect();
    encode_binary(&triangles, "fixture")
}

/// Overwrite the triangle count at offset 80.
pub fn set_declared_count(bytes: &mut [u8], count: u32) {
    if bytes.len() >= 84 {
        bytes[80..84].copy_from_slice(&count.to_le_bytes());
    }
}

/// Overwrite one float of a binary record. `slot` 0..3 is the normal,
/// 3..12 the vertex coordinates.
pub fn set_record_float(bytes: &mut [u8], record: usize, slot: usize, value: f32) {
    let at = 84 + record * 50 + slot * 4;
    if let Some(dst) = bytes.get_mut(at..at + 4) {
        dst.copy_from_slice(&value.to_le_bytes());
    }
}

/// ASCII STL. `solid` and `endsolid` are written as given so tests can vary
/// their case.
pub fn ascii_stl_with(solid: &str, endsolid: &str, name: &str, facets: &[Facet]) -> String {
    let mut out = format!("{solid} {name}\n");
    for v in facets {
        let [nx, ny, nz] = StlTriangle::from_vertices(*v).normal;
        let _ = writeln!(out, "  facet normal {nx:e} {ny:e} {nz:e}");
        out.push_str("    outer loop\n");
        for [x, y, z] in v {
            let _ = writeln!(out, "      vertex {x:e} {y:e} {z:e}");
        }
        out.push_str("    endloop\n  endfacet\n");
    }
    let _ = writeln!(out, "{endsolid} {name}");
    out
}

pub fn ascii_stl(name: &str, facets: &[Facet]) -> String {
    ascii_stl_with("solid", "endsolid", name, facets)
}

/// ASCII STL cut off inside its last facet: no `endfacet`, no `endsolid`.
pub fn truncated_ascii_stl(facets: &[Facet]) -> String {
    let full = ascii_stl("cut", facets);
    match full.rfind("    endloop") {
        Some(at) => full[..at].to_string(),
        None => full,
    }
}

// ── B-rep ───────────────────────────────────────────────────────────────────

/// Axis-aligned unit cube as a STEP AP203 file.
pub fn unit_cube_step() -> Result<String, HarnessError> {
    Ok(export_step(&make_box(1.0, 1.0, 1.0)?))
}

/// Cylinder standing on the z=0 plane as a STEP file.
pub fn cylinder_step(radius: f64, height: f64) -> Result<String, HarnessError> {
    Ok(export_step(&make_cylinder(radius, height)?))
}

fn iges_line(body: &str, section: char, seq: usize) -> String {
    format!("{body:<72}{section}{seq:>7}\n")
}

fn iges_param_line(body: &str, de: usize, seq: usize) -> String {
    format!("{body:<64}{de:>8}P{seq:>7}\n")
}

fn iges_de_pair(entity: u32, param: usize, lines: usize, form: u32, seq: usize) -> String {
    let first = format!(
        "{entity:>8}{param:>8}{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}",
        0, 0, 0, 0, 0, 0, "00000000"
    );
    let second = format!(
        "{entity:>8}{:>8}{:>8}{lines:>8}{form:>8}{:>8}{:>8}{:>8}{:>8}",
        0, 0, "", "", "", 0
    );
    iges_line(&first, 'D', seq) + &iges_line(&second, 'D', seq + 1)
}

/// IGES file holding one bilinear rational B-spline patch (entity 128).
///
/// `corners` are the control points in parameter order `(0,0) (1,0) (0,1)
/// (1,1)`; `form` is the 128 form number (1 = plane).
pub fn iges_bilinear_patch(corners: [[f64; 3]; 4], form: u32) -> String {
    let mut params = vec![
        "128,1,1,1,1,0,0,1,0,0,".to_string(),
        "0.,0.,1.,1.,0.,0.,1.,1.,".to_string(),
        "1.,1.,1.,1.,".to_string(),
    ];
    for [x, y, z] in corners {
        params.push(format!("{x:?},{y:?},{z:?},"));
    }
    params.push("0.,1.D0,0.,1.;".to_string());

    let mut out = iges_line("cadmesh fixture", 'S', 1);
    out += &iges_line("1H,,1H;,7Hfixture,11Hfixture.igs;", 'G', 1);
    out += &iges_de_pair(128, 1, params.len(), form, 1);
    for (i, p) in params.iter().enumerate() {
        out += &iges_param_line(p, 1, i + 1);
    }
    let terminate = format!("S{:>7}G{:>7}D{:>7}P{:>7}", 1, 1, 2, params.len());
    out += &iges_line(&terminate, 'T', 1);
    out
}

/// Unit square in the z=0 plane as a planar IGES patch.
pub fn iges_unit_square() -> String {
    iges_bilinear_patch(
        [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
        ],
        1,
    )
}

// ── OBJ ─────────────────────────────────────────────────────────────────────

/// Unit square as one OBJ quad.
pub const OBJ_QUAD: &str = "\
# unit square
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
f 1 2 3 4
";
