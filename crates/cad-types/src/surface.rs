use std::fmt;

use serde::{Deserialize, Serialize};

/// Surface family underlying a face.
///
/// STL and OBJ sources report every face as `Plane`: a triangle carries no
/// curvature information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurfaceType {
    Plane,
    Cylinder,
    Cone,
    Sphere,
    Torus,
    BSplineSurface,
    BezierSurface,
    SurfaceOfRevolution,
    SurfaceOfExtrusion,
    Other,
}

impl SurfaceType {
    pub fn as_str(self) -> &'static str {
        match self {
            SurfaceType::Plane => "Plane",
            SurfaceType::Cylinder => "Cylinder",
            SurfaceType::Cone => "Cone",
            SurfaceType::Sphere => "Sphere",
            SurfaceType::Torus => "Torus",
            SurfaceType::BSplineSurface => "BSplineSurface",
            SurfaceType::BezierSurface => "BezierSurface",
            SurfaceType::SurfaceOfRevolution => "SurfaceOfRevolution",
            SurfaceType::SurfaceOfExtrusion => "SurfaceOfExtrusion",
            SurfaceType::Other => "Other",
        }
    }
}

impl fmt::Display for SurfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
