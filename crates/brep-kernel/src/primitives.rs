//! Higher-level primitive builders on top of truck's sweep API.
//!
//! truck has no built-in box/cylinder/sphere/torus, everything is successive sweeps.

use std::f64::consts::PI;

use truck_modeling::builder;
use truck_modeling::topology::{Edge, Face, Solid, Wire};
use truck_modeling::{EuclideanSpace, Point3, Rad, Vector3};

use crate::types::KernelError;

fn planar_face(wire: Wire, what: &str) -> Result<Face, KernelError> {
    builder::try_attach_plane(&[wire]).map_err(|e| KernelError::ConstructionFailed {
        reason: format!("{what}: {e}"),
    })
}

/// Create a box solid via successive translational sweeps.
/// Origin at (0,0,0), extends to (w,h,d).
pub fn make_box(w: f64, h: f64, d: f64) -> Result<Solid, KernelError> {
    let v = builder::vertex(Point3::new(0.0, 0.0, 0.0));
    let edge = builder::tsweep(&v, Vector3::new(w, 0.0, 0.0));
    let face = builder::tsweep(&edge, Vector3::new(0.0, h, 0.0));
    Ok(builder::tsweep(&face, Vector3::new(0.0, 0.0, d)))
}

/// Box centered on `center`.
pub fn make_box_at(center: [f64; 3], size: [f64; 3]) -> Result<Solid, KernelError> {
    let corner = Point3::new(
        center[0] - size[0] / 2.0,
        center[1] - size[1] / 2.0,
        center[2] - size[2] / 2.0,
    );
    let v = builder::vertex(corner);
    let edge = builder::tsweep(&v, Vector3::new(size[0], 0.0, 0.0));
    let face = builder::tsweep(&edge, Vector3::new(0.0, size[1], 0.0));
    Ok(builder::tsweep(&face, Vector3::new(0.0, 0.0, size[2])))
}

/// Create a cylinder solid: circle wire → face → translational sweep.
/// Base centered at origin in XY plane, extending along +Z.
pub fn make_cylinder(radius: f64, height: f64) -> Result<Solid, KernelError> {
    let v = builder::vertex(Point3::new(radius, 0.0, 0.0));
    let wire = builder::rsweep(&v, Point3::origin(), Vector3::unit_z(), Rad(2.0 * PI));
    let face = planar_face(wire, "circular base")?;
    Ok(builder::tsweep(&face, Vector3::new(0.0, 0.0, height)))
}

/// Create a sphere solid: semicircle face → rotational sweep 2π.
/// Centered at origin.
pub fn make_sphere(radius: f64) -> Result<Solid, KernelError> {
    // arc in XZ plane from (r,0,0) to (-r,0,0)
    let v_right = builder::vertex(Point3::new(radius, 0.0, 0.0));
    let arc_wire = builder::rsweep(&v_right, Point3::origin(), Vector3::unit_y(), Rad(PI));

    let v_left = builder::vertex(Point3::new(-radius, 0.0, 0.0));
    let line_edge: Edge = builder::tsweep(&v_left, Vector3::new(2.0 * radius, 0.0, 0.0));

    let mut edges: Vec<Edge> = arc_wire.edge_iter().cloned().collect();
    edges.push(line_edge);
    let face = planar_face(Wire::from_iter(edges), "semicircle profile")?;

    Ok(builder::rsweep(&face, Point3::origin(), Vector3::unit_z(), Rad(2.0 * PI)))
}

/// Create a cone solid: apex-to-rim-to-center profile → rotational sweep 2π.
/// Base centered at origin in XY plane, apex at (0,0,height).
pub fn make_cone(radius: f64, height: f64) -> Result<Solid, KernelError> {
    let apex = builder::vertex(Point3::new(0.0, 0.0, height));
    let rim = builder::vertex(Point3::new(radius, 0.0, 0.0));
    let center = builder::vertex(Point3::origin());
    let profile: Wire = vec![builder::line(&apex, &rim), builder::line(&rim, &center)].into();
    let shell = builder::cone(&profile, Vector3::unit_z(), Rad(2.0 * PI));
    Solid::try_new(vec![shell]).map_err(|e| KernelError::ConstructionFailed {
        reason: format!("cone shell: {e}"),
    })
}

/// Create a torus solid: circular disc off the Z axis → rotational sweep 2π.
/// Centered at origin, lying in the XY plane.
pub fn make_torus(major_radius: f64, minor_radius: f64) -> Result<Solid, KernelError> {
    if minor_radius >= major_radius {
        return Err(KernelError::ConstructionFailed {
            reason: format!(
                "minor radius {minor_radius} must be smaller than major radius {major_radius}"
            ),
        });
    }
    let v = builder::vertex(Point3::new(major_radius + minor_radius, 0.0, 0.0));
    let circle = builder::rsweep(
        &v,
        Point3::new(major_radius, 0.0, 0.0),
        Vector3::unit_y(),
        Rad(2.0 * PI),
    );
    let disc = planar_face(circle, "torus section")?;
    Ok(builder::rsweep(&disc, Point3::origin(), Vector3::unit_z(), Rad(2.0 * PI)))
}

/// Move a solid by `offset`.
pub fn translated(solid: &Solid, offset: [f64; 3]) -> Solid {
    builder::translated(solid, Vector3::new(offset[0], offset[1], offset[2]))
}
