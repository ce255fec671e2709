//! Lightweight scan of a STEP (ISO 10303-21) data section.
//!
//! truck converts faces into its own surface representation and loses the
//! entity the exchange file actually named, so face classification reads the
//! raw entities: shell → face list, face → surface reference, surface → entity
//! name.

use std::collections::HashMap;

use cad_types::SurfaceType;

/// One `#id = ...;` instance from the data section.
#[derive(Debug, Clone, PartialEq)]
pub struct StepEntity {
    /// Entity keywords. Simple instances carry one; complex instances
    /// (`#7 = ( A() B() );`) carry one per partial record.
    pub names: Vec<String>,
    /// Raw parameter text of the first record, parentheses stripped.
    pub params: String,
}

impl StepEntity {
    pub fn is(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}

/// Split the data section into entity instances keyed by id.
/// Instances that are not of the form `#id = ...` are skipped.
pub fn scan_entities(raw: &str) -> HashMap<u64, StepEntity> {
    let data = match raw.find("DATA;") {
        Some(start) => &raw[start + "DATA;".len()..],
        None => raw,
    };

    let mut entities = HashMap::new();
    for statement in statements(data) {
        let statement = statement.trim();
        if statement.starts_with("ENDSEC") {
            break;
        }
        let Some(rest) = statement.strip_prefix('#') else {
            continue;
        };
        let Some((id_str, body)) = rest.split_once('=') else {
            continue;
        };
        let Ok(id) = id_str.trim().parse::<u64>() else {
            continue;
        };
        if let Some(entity) = parse_body(body.trim()) {
            entities.insert(id, entity);
        }
    }
    entities
}

/// Split on `;` outside string literals and comments.
fn statements(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            current.push(c);
            if c == '\'' {
                // '' is an escaped quote
                if chars.peek() == Some(&'\'') {
                    current.push('\'');
                    chars.next();
                } else {
                    in_string = false;
                }
            }
            continue;
        }
        match c {
            '\'' => {
                in_string = true;
                current.push(c);
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            ';' => out.push(std::mem::take(&mut current)),
            '\r' | '\n' => current.push(' '),
            _ => current.push(c),
        }
    }
    out
}

fn parse_body(body: &str) -> Option<StepEntity> {
    if let Some(inner) = body.strip_prefix('(') {
        // complex instance: sequence of NAME(params) records
        let mut names = Vec::new();
        let mut first_params = None;
        let mut rest = inner;
        loop {
            rest = rest.trim_start();
            if rest.is_empty() || rest.starts_with(')') {
                break;
            }
            let open = rest.find('(')?;
            let name = rest[..open].trim().to_ascii_uppercase();
            let close = matching_paren(rest, open)?;
            if first_params.is_none() {
                first_params = Some(rest[open + 1..close].to_string());
            }
            names.push(name);
            rest = &rest[close + 1..];
        }
        if names.is_empty() {
            return None;
        }
        return Some(StepEntity {
            names,
            params: first_params.unwrap_or_default(),
        });
    }

    let open = body.find('(')?;
    let close = matching_paren(body, open)?;
    Some(StepEntity {
        names: vec![body[..open].trim().to_ascii_uppercase()],
        params: body[open + 1..close].to_string(),
    })
}

fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    for (i, c) in text.char_indices().skip_while(|(i, _)| *i < open) {
        match c {
            '\'' => in_string = !in_string,
            '(' if !in_string => depth += 1,
            ')' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split a parameter list on top-level commas.
fn top_level_params(params: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut start = 0;
    for (i, c) in params.char_indices() {
        match c {
            '\'' => in_string = !in_string,
            '(' if !in_string => depth += 1,
            ')' if !in_string => depth = depth.saturating_sub(1),
            ',' if !in_string && depth == 0 => {
                out.push(params[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(params[start..].trim());
    out
}

/// Parse #id references from a parameter fragment.
fn parse_hash_refs(s: &str) -> Vec<u64> {
    let mut refs = Vec::new();
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '#' {
            let mut num = String::new();
            while let Some(d) = chars.next_if(|d| d.is_ascii_digit()) {
                num.push(d);
            }
            if let Ok(id) = num.parse::<u64>() {
                refs.push(id);
            }
        }
    }
    refs
}

/// Map a STEP surface entity to its classification.
pub fn surface_type_of(entity: &StepEntity) -> SurfaceType {
    for name in &entity.names {
        let ty = match name.as_str() {
            "PLANE" => SurfaceType::Plane,
            "CYLINDRICAL_SURFACE" => SurfaceType::Cylinder,
            "CONICAL_SURFACE" => SurfaceType::Cone,
            "SPHERICAL_SURFACE" => SurfaceType::Sphere,
            "TOROIDAL_SURFACE" | "DEGENERATE_TOROIDAL_SURFACE" => SurfaceType::Torus,
            "SURFACE_OF_REVOLUTION" => SurfaceType::SurfaceOfRevolution,
            "SURFACE_OF_LINEAR_EXTRUSION" => SurfaceType::SurfaceOfExtrusion,
            "BEZIER_SURFACE" => SurfaceType::BezierSurface,
            "B_SPLINE_SURFACE"
            | "B_SPLINE_SURFACE_WITH_KNOTS"
            | "RATIONAL_B_SPLINE_SURFACE"
            | "UNIFORM_SURFACE"
            | "QUASI_UNIFORM_SURFACE" => SurfaceType::BSplineSurface,
            _ => continue,
        };
        return ty;
    }
    SurfaceType::Other
}

/// Surface types of each shell's faces, in the order the shell lists them.
/// Keyed by the CLOSED_SHELL / OPEN_SHELL entity id.
pub fn shell_face_types(entities: &HashMap<u64, StepEntity>) -> HashMap<u64, Vec<SurfaceType>> {
    let mut shells = HashMap::new();
    for (id, entity) in entities {
        if !(entity.is("CLOSED_SHELL") || entity.is("OPEN_SHELL")) {
            continue;
        }
        let params = top_level_params(&entity.params);
        let Some(face_list) = params.get(1) else {
            continue;
        };
        let types = parse_hash_refs(face_list)
            .into_iter()
            .map(|face_id| face_surface_type(entities, face_id))
            .collect();
        shells.insert(*id, types);
    }
    shells
}

fn face_surface_type(entities: &HashMap<u64, StepEntity>, face_id: u64) -> SurfaceType {
    let Some(face) = entities.get(&face_id) else {
        return SurfaceType::Other;
    };
    // ADVANCED_FACE('name', (bounds), #surface, .T.)
    let params = top_level_params(&face.params);
    let surface_ref = params
        .get(2)
        .and_then(|p| parse_hash_refs(p).first().copied());
    match surface_ref.and_then(|id| entities.get(&id)) {
        Some(surface) => surface_type_of(surface),
        None => SurfaceType::Other,
    }
}
