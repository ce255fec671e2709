use brep_kernel::primitives::{make_box, make_cylinder, make_torus, translated};
use brep_kernel::{tessellate, BRepFormat, BRepKernel, TruckKernel};
use cad_types::SurfaceType;

#[test]
fn torus_tessellates_to_closed_indexed_mesh() {
    let mut kernel = TruckKernel::new();
    let handle = kernel.store_solid(make_torus(3.0, 1.0).unwrap());
    let mesh = tessellate(&mut kernel, &handle).unwrap();
    assert!(!mesh.mesh.faces.is_empty());
    assert!(mesh.mesh.check_indices().is_ok());
    assert_eq!(mesh.surface_types.len(), kernel.face_count(&handle).unwrap());
    for v in &mesh.mesh.vertices {
        let r = (v[0] * v[0] + v[1] * v[1]).sqrt();
        assert!(r > 1.5 && r < 4.5, "vertex {v:?} outside torus envelope");
    }
}

#[test]
fn cylinder_has_planar_caps() {
    let mut kernel = TruckKernel::new();
    let handle = kernel.store_solid(make_cylinder(1.0, 2.0).unwrap());
    let mesh = tessellate(&mut kernel, &handle).unwrap();
    let planes = mesh
        .surface_types
        .iter()
        .filter(|t| **t == SurfaceType::Plane)
        .count();
    assert_eq!(planes, 2);
}

#[test]
fn translated_box_keeps_extent() {
    let mut kernel = TruckKernel::new();
    let solid = translated(&make_box(1.0, 1.0, 1.0).unwrap(), [5.0, 0.0, 0.0]);
    let handle = kernel.store_solid(solid);
    let mesh = tessellate(&mut kernel, &handle).unwrap();
    let min_x = mesh.mesh.vertices.iter().map(|v| v[0]).fold(f64::MAX, f64::min);
    let max_x = mesh.mesh.vertices.iter().map(|v| v[0]).fold(f64::MIN, f64::max);
    assert!((min_x - 5.0).abs() < 1e-9);
    assert!((max_x - 6.0).abs() < 1e-9);
}

#[test]
fn iges_text_without_surfaces_is_parse_failure() {
    let mut kernel = TruckKernel::new();
    let err = kernel.import(BRepFormat::Iges, b"not an iges file").unwrap_err();
    assert_eq!(err.kind(), cad_types::ErrorKind::ParseFailure);
}
