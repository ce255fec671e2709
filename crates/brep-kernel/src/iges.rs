//! IGES 5.3 fixed-format reader, limited to rational B-spline surfaces.
//!
//! Reads the Global section for delimiters, the Directory Entry section for
//! entity types, forms and transformation pointers, and the Parameter Data
//! section for entity 128 (rational B-spline surface) and entity 124
//! (transformation matrix). Trimming curves (141/142/143/144) are not applied;
//! each surface is tessellated over its full parameter range.

use std::collections::HashMap;

use cad_types::SurfaceType;
use truck_modeling::geometry::{BSplineSurface, KnotVec, NurbsSurface};
use truck_modeling::{ParameterDivision2D, Vector4};

use crate::classify::classify_iges_form;
use crate::types::{BRepFormat, FaceTessellation, KernelError};

const RATIONAL_BSPLINE_SURFACE: u32 = 128;
const TRANSFORMATION_MATRIX: u32 = 124;
const TRIMMED_SURFACE: u32 = 144;
const BOUNDED_SURFACE: u32 = 143;

/// Maximum depth of chained transformation matrices.
const MAX_TRANSFORM_CHAIN: usize = 16;

fn malformed(reason: impl Into<String>) -> KernelError {
    KernelError::import(BRepFormat::Iges, reason)
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Delimiters {
    param: char,
    record: char,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            param: ',',
            record: ';',
        }
    }
}

/// One directory entry (two 80-column lines).
#[derive(Debug, Clone, PartialEq)]
struct DirectoryEntry {
    entity_type: u32,
    parameter_start: usize,
    transform: usize,
    parameter_lines: usize,
    form: u32,
}

/// Rational B-spline surface with its transformation already applied.
#[derive(Debug, Clone, PartialEq)]
pub struct IgesSurface {
    pub form: u32,
    pub degree_u: usize,
    pub degree_v: usize,
    pub knots_u: Vec<f64>,
    pub knots_v: Vec<f64>,
    /// `control_points[i][j]` is the Euclidean control point at u-index `i`,
    /// v-index `j`; `weights` has the same shape.
    pub control_points: Vec<Vec<[f64; 3]>>,
    pub weights: Vec<Vec<f64>>,
    pub u_range: (f64, f64),
    pub v_range: (f64, f64),
}

impl IgesSurface {
    pub fn surface_type(&self) -> SurfaceType {
        classify_iges_form(self.form)
    }

    /// Build the truck NURBS surface.
    pub fn to_nurbs(&self) -> Result<NurbsSurface<Vector4>, KernelError> {
        let homogeneous: Vec<Vec<Vector4>> = self
            .control_points
            .iter()
            .zip(&self.weights)
            .map(|(row, weights)| {
                row.iter()
                    .zip(weights)
                    .map(|(p, &w)| Vector4::new(p[0] * w, p[1] * w, p[2] * w, w))
                    .collect()
            })
            .collect();
        let knots = (
            KnotVec::from(self.knots_u.clone()),
            KnotVec::from(self.knots_v.clone()),
        );
        let bspline = BSplineSurface::try_new(knots, homogeneous)
            .map_err(|e| malformed(format!("invalid B-spline surface: {e}")))?;
        Ok(NurbsSurface::new(bspline))
    }

    /// Sample the surface over its full parameter range.
    pub fn tessellate(&self, deflection: f64) -> Result<FaceTessellation, KernelError> {
        let surface = self.to_nurbs()?;
        let (us, vs) = surface.parameter_division((self.u_range, self.v_range), deflection);

        let mut positions = Vec::with_capacity(us.len() * vs.len());
        for &u in &us {
            for &v in &vs {
                let p = surface.subs(u, v);
                positions.push([p[0], p[1], p[2]]);
            }
        }

        let cols = vs.len();
        let mut triangles = Vec::new();
        for i in 0..us.len().saturating_sub(1) {
            for j in 0..cols.saturating_sub(1) {
                let a = i * cols + j;
                let b = (i + 1) * cols + j;
                let c = (i + 1) * cols + j + 1;
                let d = i * cols + j + 1;
                triangles.push([a, b, c]);
                triangles.push([a, c, d]);
            }
        }

        Ok(FaceTessellation {
            surface_type: self.surface_type(),
            positions,
            triangles,
        })
    }
}

/// Parsed IGES model: every rational B-spline surface in directory order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IgesModel {
    pub surfaces: Vec<IgesSurface>,
    /// Number of trimmed or bounded surfaces whose trimming was ignored.
    pub untrimmed: usize,
}

/// Parse an IGES file.
pub fn parse(bytes: &[u8]) -> Result<IgesModel, KernelError> {
    let text = String::from_utf8_lossy(bytes);
    let sections = Sections::split(&text)?;
    let delimiters = global_delimiters(&sections.global);
    let directory = sections.directory_entries()?;

    let mut model = IgesModel::default();
    for (de, entry) in &directory {
        match entry.entity_type {
            RATIONAL_BSPLINE_SURFACE => {
                let params = sections.parameters(entry, delimiters)?;
                let mut surface = rational_bspline(entry.form, &params)
                    .map_err(|reason| malformed(format!("entity at DE {de}: {reason}")))?;
                if entry.transform != 0 {
                    let matrix = resolve_transform(&sections, &directory, entry.transform, delimiters)?;
                    apply_transform(&mut surface, &matrix);
                }
                model.surfaces.push(surface);
            }
            TRIMMED_SURFACE | BOUNDED_SURFACE => model.untrimmed += 1,
            _ => {}
        }
    }

    if model.untrimmed > 0 {
        tracing::warn!(
            count = model.untrimmed,
            "IGES trimming curves ignored; surfaces tessellated over full range"
        );
    }
    if model.surfaces.is_empty() {
        return Err(malformed("no rational B-spline surfaces (entity 128) found"));
    }
    Ok(model)
}

/// Section text, keyed by the section letter in column 73.
struct Sections {
    global: String,
    directory: Vec<String>,
    /// Parameter lines by sequence number, columns 1-64 only.
    parameters: HashMap<usize, String>,
}

impl Sections {
    fn split(text: &str) -> Result<Self, KernelError> {
        let mut global = String::new();
        let mut directory = Vec::new();
        let mut parameters = HashMap::new();
        let mut saw_terminate = false;

        for line in text.lines() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            let Some(section) = line.get(72..73) else {
                return Err(malformed(format!(
                    "line shorter than 73 columns: {:?}",
                    line.chars().take(20).collect::<String>()
                )));
            };
            let body = &line[..72];
            match section {
                "S" => {}
                "G" => global.push_str(body),
                "D" => directory.push(body.to_string()),
                "P" => {
                    let seq = field_usize(line.get(73..80).unwrap_or(""))
                        .ok_or_else(|| malformed("parameter line without sequence number"))?;
                    parameters.insert(seq, body.get(..64).unwrap_or(body).to_string());
                }
                "T" => saw_terminate = true,
                "C" => return Err(malformed("compressed IGES format is not supported")),
                other => return Err(malformed(format!("unknown section letter {other:?}"))),
            }
        }

        if global.is_empty() || directory.is_empty() {
            return Err(malformed("missing Global or Directory Entry section"));
        }
        if !saw_terminate {
            tracing::warn!("IGES file has no Terminate section");
        }
        Ok(Self {
            global,
            directory,
            parameters,
        })
    }

    /// Directory entries keyed by the sequence number of their first line.
    fn directory_entries(&self) -> Result<Vec<(usize, DirectoryEntry)>, KernelError> {
        if self.directory.len() % 2 != 0 {
            return Err(malformed("odd number of Directory Entry lines"));
        }
        self.directory
            .chunks(2)
            .enumerate()
            .map(|(i, pair)| {
                let first = de_fields(&pair[0]);
                let second = de_fields(&pair[1]);
                let entry = DirectoryEntry {
                    entity_type: first[0] as u32,
                    parameter_start: first[1],
                    transform: first[6],
                    parameter_lines: second[3],
                    form: second[4] as u32,
                };
                Ok((2 * i + 1, entry))
            })
            .collect()
    }

    /// Tokenized parameter record of an entry, entity type number included.
    fn parameters(
        &self,
        entry: &DirectoryEntry,
        delimiters: Delimiters,
    ) -> Result<Vec<String>, KernelError> {
        let mut record = String::new();
        for seq in entry.parameter_start..entry.parameter_start + entry.parameter_lines.max(1) {
            let line = self
                .parameters
                .get(&seq)
                .ok_or_else(|| malformed(format!("missing parameter line {seq}")))?;
            record.push_str(line);
        }
        Ok(tokenize(&record, delimiters))
    }
}

/// Nine 8-column fields of a directory line. Blank fields read as zero.
fn de_fields(line: &str) -> [usize; 9] {
    let mut fields = [0usize; 9];
    for (i, field) in fields.iter_mut().enumerate() {
        *field = line
            .get(i * 8..(i + 1) * 8)
            .and_then(field_usize)
            .unwrap_or(0);
    }
    fields
}

fn field_usize(s: &str) -> Option<usize> {
    let s = s.trim();
    // pointers to transformation entries may be written negative
    s.trim_start_matches('-').parse().ok()
}

/// Read the parameter and record delimiters from the start of the Global section.
fn global_delimiters(global: &str) -> Delimiters {
    let bytes = global.as_bytes();
    let mut delimiters = Delimiters::default();
    let mut i = 0;

    if bytes.starts_with(b"1H") && bytes.len() >= 3 {
        delimiters.param = bytes[2] as char;
        i = 3;
    }
    if bytes.get(i) == Some(&(delimiters.param as u8)) {
        i += 1;
    }
    let rest = &bytes[i.min(bytes.len())..];
    if rest.starts_with(b"1H") && rest.len() >= 3 {
        delimiters.record = rest[2] as char;
    }
    delimiters
}

/// Split a parameter record on the parameter delimiter up to the record
/// delimiter. Hollerith strings (`nHxxx`) are taken verbatim.
fn tokenize(record: &str, delimiters: Delimiters) -> Vec<String> {
    let chars: Vec<char> = record.chars().collect();
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == delimiters.param || c == delimiters.record {
            tokens.push(current.trim().to_string());
            current.clear();
            if c == delimiters.record {
                return tokens;
            }
            i += 1;
            continue;
        }
        if c.is_ascii_digit() && current.trim().is_empty() {
            let start = i;
            let mut j = i;
            while j < chars.len() && chars[j].is_ascii_digit() {
                j += 1;
            }
            if chars.get(j) == Some(&'H') {
                let len: usize = chars[start..j].iter().collect::<String>().parse().unwrap_or(0);
                let end = (j + 1 + len).min(chars.len());
                current = chars[j + 1..end].iter().collect();
                i = end;
                continue;
            }
        }
        current.push(c);
        i += 1;
    }
    if !current.trim().is_empty() {
        tokens.push(current.trim().to_string());
    }
    tokens
}

fn real(tokens: &[String], index: usize) -> Result<f64, String> {
    let token = tokens
        .get(index)
        .ok_or_else(|| format!("parameter {index} missing"))?;
    if token.is_empty() {
        return Ok(0.0);
    }
    token
        .replace(['D', 'd'], "E")
        .parse()
        .map_err(|_| format!("parameter {index} is not a number: {token:?}"))
}

fn integer(tokens: &[String], index: usize) -> Result<usize, String> {
    let value = real(tokens, index)?;
    if value < 0.0 || value.fract() != 0.0 {
        return Err(format!("parameter {index} is not a non-negative integer: {value}"));
    }
    Ok(value as usize)
}

/// Decode entity 128 parameters. `tokens[0]` is the entity type number.
fn rational_bspline(form: u32, tokens: &[String]) -> Result<IgesSurface, String> {
    let k1 = integer(tokens, 1)?;
    let k2 = integer(tokens, 2)?;
    let m1 = integer(tokens, 3)?;
    let m2 = integer(tokens, 4)?;

    let overflow = || format!("entity 128 sizes overflow: K1={k1} K2={k2} M1={m1} M2={m2}");
    let knots_u_len = k1
        .checked_add(m1)
        .and_then(|n| n.checked_add(2))
        .ok_or_else(overflow)?;
    let knots_v_len = k2
        .checked_add(m2)
        .and_then(|n| n.checked_add(2))
        .ok_or_else(overflow)?;
    let count = k1
        .checked_add(1)
        .zip(k2.checked_add(1))
        .and_then(|(a, b)| a.checked_mul(b))
        .ok_or_else(overflow)?;

    // 10 leading integers, knots, weights, points, then the parameter range.
    let needed = count
        .checked_mul(4)
        .and_then(|n| n.checked_add(knots_u_len))
        .and_then(|n| n.checked_add(knots_v_len))
        .and_then(|n| n.checked_add(14))
        .ok_or_else(overflow)?;
    if needed > tokens.len() {
        return Err(format!(
            "entity 128 needs {needed} parameters, found {}",
            tokens.len()
        ));
    }

    let mut at = 10;
    let mut take = |n: usize| -> Result<Vec<f64>, String> {
        let values = (at..at + n).map(|i| real(tokens, i)).collect::<Result<Vec<_>, _>>()?;
        at += n;
        Ok(values)
    };

    let knots_u = take(knots_u_len)?;
    let knots_v = take(knots_v_len)?;
    let flat_weights = take(count)?;
    let flat_points = take(3 * count)?;
    let range = take(4)?;

    // IGES lists control points with the u index varying fastest
    let mut control_points = vec![Vec::with_capacity(k2 + 1); k1 + 1];
    let mut weights = vec![Vec::with_capacity(k2 + 1); k1 + 1];
    for j in 0..=k2 {
        for i in 0..=k1 {
            let n = j * (k1 + 1) + i;
            let w = flat_weights[n];
            if !(w > 0.0) {
                return Err(format!("weight {n} is not positive: {w}"));
            }
            control_points[i].push([
                flat_points[3 * n],
                flat_points[3 * n + 1],
                flat_points[3 * n + 2],
            ]);
            weights[i].push(w);
        }
    }

    Ok(IgesSurface {
        form,
        degree_u: m1,
        degree_v: m2,
        knots_u,
        knots_v,
        control_points,
        weights,
        u_range: (range[0], range[1]),
        v_range: (range[2], range[3]),
    })
}

/// Row-major 3x4 matrix `[R | T]`.
type Transform = [[f64; 4]; 3];

fn resolve_transform(
    sections: &Sections,
    directory: &[(usize, DirectoryEntry)],
    pointer: usize,
    delimiters: Delimiters,
) -> Result<Transform, KernelError> {
    let mut matrix: Transform = [[1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0], [0.0, 0.0, 1.0, 0.0]];
    let mut next = pointer;

    for _ in 0..MAX_TRANSFORM_CHAIN {
        if next == 0 {
            return Ok(matrix);
        }
        let entry = directory
            .iter()
            .find(|(de, _)| *de == next)
            .map(|(_, e)| e)
            .ok_or_else(|| malformed(format!("transformation pointer {next} has no entry")))?;
        if entry.entity_type != TRANSFORMATION_MATRIX {
            return Err(malformed(format!(
                "pointer {next} refers to entity {} instead of a transformation",
                entry.entity_type
            )));
        }
        let tokens = sections.parameters(entry, delimiters)?;
        let mut local: Transform = [[0.0; 4]; 3];
        for (n, value) in local.iter_mut().flatten().enumerate() {
            *value = real(&tokens, n + 1).map_err(malformed)?;
        }
        // outer transforms apply after inner ones
        matrix = compose(&local, &matrix);
        next = entry.transform;
    }
    Err(malformed("transformation chain too deep"))
}

fn compose(outer: &Transform, inner: &Transform) -> Transform {
    let mut out = [[0.0; 4]; 3];
    for r in 0..3 {
        for c in 0..4 {
            let mut v: f64 = (0..3).map(|k| outer[r][k] * inner[k][c]).sum();
            if c == 3 {
                v += outer[r][3];
            }
            out[r][c] = v;
        }
    }
    out
}

fn apply_transform(surface: &mut IgesSurface, m: &Transform) {
    for p in surface.control_points.iter_mut().flatten() {
        let [x, y, z] = *p;
        *p = [
            m[0][0] * x + m[0][1] * y + m[0][2] * z + m[0][3],
            m[1][0] * x + m[1][1] * y + m[1][2] * z + m[1][3],
            m[2][0] * x + m[2][1] * y + m[2][2] * z + m[2][3],
        ];
    }
}
