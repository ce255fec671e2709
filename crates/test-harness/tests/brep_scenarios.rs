//! B-rep scenarios through the pipeline: STEP and IGES with the truck kernel,
//! and the pipeline's kernel seam with the mock.

use brep_kernel::{BRepFormat, FaceTessellation, MockKernel};
use cad_types::{ErrorKind, SurfaceType};
use geometry_pipeline::{process, Pipeline};
use test_harness::assertions::{assert_all_pass, expect_error, expect_mesh};
use test_harness::fixtures::*;
use test_harness::helpers::{mesh_surface_area, mesh_volume};
use test_harness::oracle;

// ── STEP ────────────────────────────────────────────────────────────────────

#[test]
fn unit_cube_step_has_six_planes_and_twelve_triangles() {
    let step = unit_cube_step().unwrap();
    let result = process("cube.step", step.as_bytes(), None);
    let mesh = expect_mesh(&result, "unit cube").unwrap();

    assert_all_pass(&[
        oracle::check_min_triangles(&mesh.mesh, 12),
        oracle::check_surface_type_count(&mesh.surface_types, SurfaceType::Plane, 6),
        oracle::check_valid_indices(&mesh.mesh),
        oracle::check_bounds(mesh, [0.5, 0.5, 0.5], [1.0, 1.0, 1.0], 1e-6),
        oracle::check_viewer_json(mesh),
    ])
    .unwrap();
    assert_eq!(mesh.surface_types.len(), 6);
    assert!((mesh_surface_area(&mesh.mesh) - 6.0).abs() < 1e-6);
}

#[test]
fn stp_extension_is_case_insensitive() {
    let step = unit_cube_step().unwrap();
    let result = process("CUBE.STP", step.as_bytes(), None);
    assert_eq!(expect_mesh(&result, "STP").unwrap().surface_types.len(), 6);
}

#[test]
fn declared_extension_overrides_filename() {
    let step = unit_cube_step().unwrap();
    let result = process("upload.bin", step.as_bytes(), Some("step"));
    expect_mesh(&result, "declared step").unwrap();
}

#[test]
fn cylinder_step_mixes_planar_and_curved_faces() {
    let step = cylinder_step(1.0, 2.0).unwrap();
    let result = process("cyl.step", step.as_bytes(), None);
    let mesh = expect_mesh(&result, "cylinder").unwrap();

    assert_all_pass(&[
        oracle::check_valid_indices(&mesh.mesh),
        oracle::check_viewer_json(mesh),
        oracle::check_surface_type_count(&mesh.surface_types, SurfaceType::Plane, 2),
    ])
    .unwrap();
    assert!(mesh.surface_types.iter().any(|t| *t != SurfaceType::Plane));
    assert!((mesh.size[2] - 2.0).abs() < 1e-6);
    // chords of the rim may miss the extreme points
    assert!(mesh.size[0] > 1.7 && mesh.size[0] <= 2.0 + 1e-9);
}

#[test]
fn garbage_step_is_parse_failure() {
    let result = process("junk.step", b"ISO-10303-21;\nnot really\n", None);
    expect_error(&result, ErrorKind::ParseFailure, "garbage step").unwrap();
}

// ── IGES ────────────────────────────────────────────────────────────────────

#[test]
fn iges_unit_square_is_one_planar_face() {
    let result = process("square.igs", iges_unit_square().as_bytes(), None);
    let mesh = expect_mesh(&result, "iges square").unwrap();

    assert_eq!(mesh.surface_types, vec![SurfaceType::Plane]);
    assert_all_pass(&oracle::run_result_checks(mesh)).unwrap();
    assert_all_pass(&[
        oracle::check_bounds(mesh, [0.5, 0.5, 0.0], [1.0, 1.0, 0.0], 1e-9),
        oracle::check_unique_vertices(&mesh.mesh),
    ])
    .unwrap();
    assert!((mesh_surface_area(&mesh.mesh) - 1.0).abs() < 1e-9);
}

#[test]
fn iges_form_number_selects_surface_type() {
    let corners = [
        [0.0, 0.0, 0.0],
        [2.0, 0.0, 0.0],
        [0.0, 3.0, 1.0],
        [2.0, 3.0, 1.0],
    ];
    let result = process("patch.iges", iges_bilinear_patch(corners, 0).as_bytes(), None);
    let mesh = expect_mesh(&result, "iges form 0").unwrap();
    assert_eq!(mesh.surface_types, vec![SurfaceType::BSplineSurface]);
    assert!((mesh.size[1] - 3.0).abs() < 1e-9);
    assert!((mesh.size[2] - 1.0).abs() < 1e-9);
}

#[test]
fn iges_with_oversized_degree_counts_is_parse_failure() {
    let text = iges_unit_square().replacen(
        "128,1,1,1,1,",
        "128,18446744073709551615,1,1,1,",
        1,
    );
    let result = process("huge.igs", text.as_bytes(), None);
    expect_error(&result, ErrorKind::ParseFailure, "oversized K1").unwrap();
}

#[test]
fn iges_without_surfaces_is_parse_failure() {
    let result = process("empty.igs", b"nothing to see here\n", None);
    expect_error(&result, ErrorKind::ParseFailure, "empty iges").unwrap();
}

// ── Kernel seam ─────────────────────────────────────────────────────────────

#[test]
fn mock_cube_welds_into_closed_mesh() {
    let mut pipeline = Pipeline::with_kernel(MockKernel::new());
    let result = pipeline.process("part.step", b"anything", None);
    let mesh = expect_mesh(&result, "mock cube").unwrap();

    assert_eq!(mesh.mesh.vertices.len(), 8);
    assert_eq!(mesh.mesh.faces.len(), 12);
    assert_all_pass(&[
        oracle::check_watertight_mesh(&mesh.mesh),
        oracle::check_unique_vertices(&mesh.mesh),
        oracle::check_bounds(mesh, [0.5, 0.5, 0.5], [1.0, 1.0, 1.0], 0.0),
    ])
    .unwrap();
    assert!((mesh_volume(&mesh.mesh) - 1.0).abs() < 1e-12);
}

#[test]
fn mock_records_formats_in_call_order() {
    let mut pipeline = Pipeline::with_kernel(MockKernel::new());
    pipeline.process("a.stp", b"x", None);
    pipeline.process("b.igs", b"x", None);
    pipeline.process("c.stl", &binary_stl(&[UNIT_TRIANGLE]), None);
    assert_eq!(pipeline.kernel().imports(), &[BRepFormat::Step, BRepFormat::Iges]);
}

#[test]
fn mock_rejection_surfaces_as_parse_failure() {
    let mut pipeline = Pipeline::with_kernel(MockKernel::new());
    let result = pipeline.process("bad.step", b"FAIL please", None);
    expect_error(&result, ErrorKind::ParseFailure, "mock reject").unwrap();
}

#[test]
fn faces_without_triangles_keep_their_surface_type() {
    let kernel = MockKernel::new().with_face(FaceTessellation::empty(SurfaceType::Torus));
    let mut pipeline = Pipeline::with_kernel(kernel);
    let result = pipeline.process("part.step", b"ok", None);
    let mesh = expect_mesh(&result, "empty face").unwrap();
    assert_eq!(mesh.surface_types.len(), 7);
    assert_eq!(mesh.surface_types[6], SurfaceType::Torus);
    assert_eq!(mesh.mesh.faces.len(), 12);
}
