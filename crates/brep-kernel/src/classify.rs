//! Surface classification for solids built in memory with truck.
//!
//! Imported STEP faces are classified from the exchange file's own entities
//! (see `step_entities`); solids constructed through `primitives` only carry
//! truck's surface representation, which is coarser.

use cad_types::SurfaceType;
use truck_modeling::geometry::Surface;

pub fn classify_surface(surface: &Surface) -> SurfaceType {
    #[allow(unreachable_patterns)]
    match surface {
        Surface::Plane(_) => SurfaceType::Plane,
        Surface::RevolutedCurve(_) => SurfaceType::SurfaceOfRevolution,
        Surface::BSplineSurface(_) | Surface::NurbsSurface(_) => SurfaceType::BSplineSurface,
        _ => SurfaceType::Other,
    }
}

/// IGES rational B-spline surfaces (entity 128) declare the analytic shape
/// they represent in the form number.
pub fn classify_iges_form(form: u32) -> SurfaceType {
    match form {
        1 => SurfaceType::Plane,
        2 => SurfaceType::Cylinder,
        3 => SurfaceType::Cone,
        4 => SurfaceType::Sphere,
        5 => SurfaceType::Torus,
        6 => SurfaceType::SurfaceOfRevolution,
        7 => SurfaceType::SurfaceOfExtrusion,
        _ => SurfaceType::BSplineSurface,
    }
}
