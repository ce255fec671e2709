//! TruckKernel: real geometry kernel wrapping truck's API.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use cad_types::SurfaceType;
use truck_meshalgo::prelude::*;
use truck_meshalgo::tessellation::MeshableShape;
use truck_stepio::r#in::Table;

use crate::classify::classify_surface;
use crate::iges::{self, IgesSurface};
use crate::step_entities;
use crate::tessellation::face_from_polygon;
use crate::traits::BRepKernel;
use crate::types::*;

type TruckSolid = truck_modeling::Solid;

enum StoredShape {
    /// Imported STEP data. Face surface types per shell entity id, in the
    /// order the shell lists its faces.
    Step {
        table: Table,
        face_types: HashMap<u64, Vec<SurfaceType>>,
    },
    Iges(Vec<IgesSurface>),
    /// Solid built in memory, e.g. by `primitives`.
    Solid(TruckSolid),
}

/// Real geometry kernel backed by the truck BREP library.
///
/// truck can panic on malformed or degenerate input; every call into it is
/// run under `catch_unwind` and surfaces as [`KernelError::Panicked`].
pub struct TruckKernel {
    next_handle: u64,
    shapes: HashMap<u64, StoredShape>,
}

impl TruckKernel {
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            shapes: HashMap::new(),
        }
    }

    fn alloc_handle(&mut self) -> ShapeHandle {
        let h = ShapeHandle(self.next_handle);
        self.next_handle += 1;
        h
    }

    fn store(&mut self, shape: StoredShape) -> ShapeHandle {
        let handle = self.alloc_handle();
        self.shapes.insert(handle.id(), shape);
        handle
    }

    /// Register a solid built in memory so it can be tessellated like an import.
    pub fn store_solid(&mut self, solid: TruckSolid) -> ShapeHandle {
        self.store(StoredShape::Solid(solid))
    }

    fn get(&self, handle: &ShapeHandle) -> std::result::Result<&StoredShape, KernelError> {
        self.shapes
            .get(&handle.id())
            .ok_or(KernelError::ShapeNotFound { handle: *handle })
    }

    fn import_step(&mut self, bytes: &[u8]) -> std::result::Result<ShapeHandle, KernelError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| KernelError::import(BRepFormat::Step, format!("not ASCII text: {e}")))?;
        let exchange = guarded(|| truck_stepio::r#in::ruststep::parser::parse(text))?
            .map_err(|e| KernelError::import(BRepFormat::Step, format!("failed to parse: {e}")))?;
        let data = exchange
            .data
            .first()
            .ok_or_else(|| KernelError::import(BRepFormat::Step, "no data section"))?;
        let table = guarded(|| Table::from_data_section(data))?;
        if table.shell.is_empty() {
            return Err(KernelError::import(BRepFormat::Step, "no shells in data section"));
        }

        let face_types = step_entities::shell_face_types(&step_entities::scan_entities(text));
        tracing::debug!(shells = table.shell.len(), "STEP imported");
        Ok(self.store(StoredShape::Step { table, face_types }))
    }

    fn import_iges(&mut self, bytes: &[u8]) -> std::result::Result<ShapeHandle, KernelError> {
        let model = guarded(|| iges::parse(bytes))??;
        tracing::debug!(surfaces = model.surfaces.len(), "IGES imported");
        Ok(self.store(StoredShape::Iges(model.surfaces)))
    }
}

impl Default for TruckKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl BRepKernel for TruckKernel {
    fn import(&mut self, format: BRepFormat, bytes: &[u8]) -> std::result::Result<ShapeHandle, KernelError> {
        match format {
            BRepFormat::Step => self.import_step(bytes),
            BRepFormat::Iges => self.import_iges(bytes),
        }
    }

    fn face_count(&self, shape: &ShapeHandle) -> std::result::Result<usize, KernelError> {
        Ok(match self.get(shape)? {
            StoredShape::Step { table, .. } => table
                .shell
                .values()
                .map(|holder| table.to_compressed_shell(holder).map(|s| s.faces.len()).unwrap_or(0))
                .sum(),
            StoredShape::Iges(surfaces) => surfaces.len(),
            StoredShape::Solid(solid) => solid.boundaries().iter().map(|s| s.face_iter().count()).sum(),
        })
    }

    fn tessellate_faces(
        &mut self,
        shape: &ShapeHandle,
        deflection: f64,
    ) -> std::result::Result<Vec<FaceTessellation>, KernelError> {
        match self.get(shape)? {
            StoredShape::Step { table, face_types } => {
                guarded(|| tessellate_step(table, face_types, deflection))?
            }
            StoredShape::Iges(surfaces) => guarded(|| {
                surfaces
                    .iter()
                    .map(|s| s.tessellate(deflection))
                    .collect::<std::result::Result<Vec<_>, _>>()
            })?,
            StoredShape::Solid(solid) => Ok(guarded(|| tessellate_solid(solid, deflection))?),
        }
    }
}

fn tessellate_step(
    table: &Table,
    face_types: &HashMap<u64, Vec<SurfaceType>>,
    deflection: f64,
) -> std::result::Result<Vec<FaceTessellation>, KernelError> {
    let mut shells: Vec<_> = table.shell.iter().collect();
    shells.sort_by_key(|(id, _)| **id);

    let mut faces = Vec::new();
    for (shell_id, holder) in shells {
        let compressed = table.to_compressed_shell(holder).map_err(|e| {
            KernelError::import(
                BRepFormat::Step,
                format!("shell #{shell_id} could not be converted into topology: {e}"),
            )
        })?;
        let meshed = compressed.robust_triangulation(deflection);

        let types = face_types.get(shell_id).map(Vec::as_slice).unwrap_or(&[]);
        if types.len() != meshed.faces.len() {
            tracing::warn!(
                shell = shell_id,
                listed = types.len(),
                converted = meshed.faces.len(),
                "face count mismatch; unmatched faces classified as Other"
            );
        }

        for (i, face) in meshed.faces.iter().enumerate() {
            let surface_type = types.get(i).copied().unwrap_or(SurfaceType::Other);
            faces.push(match face.surface.as_ref() {
                Some(mesh) => face_from_polygon(mesh, face.orientation, surface_type),
                None => {
                    tracing::debug!(shell = shell_id, face = i, "face produced no triangles");
                    FaceTessellation::empty(surface_type)
                }
            });
        }
    }
    Ok(faces)
}

fn tessellate_solid(solid: &TruckSolid, deflection: f64) -> Vec<FaceTessellation> {
    let meshed = solid.triangulation(deflection);
    let mut faces = Vec::new();
    for (shell, meshed_shell) in solid.boundaries().iter().zip(meshed.boundaries()) {
        for (face, meshed_face) in shell.face_iter().zip(meshed_shell.face_iter()) {
            let surface_type = classify_surface(&face.surface());
            let maybe_mesh: Option<PolygonMesh> = meshed_face.surface();
            faces.push(match maybe_mesh {
                Some(mesh) => face_from_polygon(&mesh, meshed_face.orientation(), surface_type),
                None => FaceTessellation::empty(surface_type),
            });
        }
    }
    faces
}

/// Run a truck call, turning a panic into [`KernelError::Panicked`].
fn guarded<T>(f: impl FnOnce() -> T) -> std::result::Result<T, KernelError> {
    catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        tracing::error!(%message, "geometry kernel panicked");
        KernelError::Panicked { message }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{make_box, make_cylinder};
    use crate::step_export::export_step;
    use crate::tessellation::{tessellate, LINEAR_DEFLECTION};

    #[test]
    fn box_solid_tessellates_into_six_planes() {
        let mut kernel = TruckKernel::new();
        let handle = kernel.store_solid(make_box(1.0, 1.0, 1.0).unwrap());
        assert_eq!(kernel.face_count(&handle).unwrap(), 6);
        let mesh = tessellate(&mut kernel, &handle).unwrap();
        assert_eq!(mesh.surface_types, vec![SurfaceType::Plane; 6]);
        assert!(mesh.mesh.faces.len() >= 12);
        assert_eq!(mesh.mesh.vertices.len(), 8);
        assert!(mesh.mesh.check_indices().is_ok());
    }

    #[test]
    fn step_round_trip_of_unit_cube() {
        let step = export_step(&make_box(1.0, 1.0, 1.0).unwrap());
        let mut kernel = TruckKernel::new();
        let handle = kernel.import(BRepFormat::Step, step.as_bytes()).unwrap();
        let mesh = tessellate(&mut kernel, &handle).unwrap();
        assert!(mesh.mesh.faces.len() >= 12);
        assert_eq!(
            mesh.surface_types.iter().filter(|t| **t == SurfaceType::Plane).count(),
            6
        );
    }

    #[test]
    fn step_cylinder_reports_curved_faces() {
        let step = export_step(&make_cylinder(1.0, 2.0).unwrap());
        let mut kernel = TruckKernel::new();
        let handle = kernel.import(BRepFormat::Step, step.as_bytes()).unwrap();
        let faces = kernel.tessellate_faces(&handle, LINEAR_DEFLECTION).unwrap();
        assert!(faces.iter().any(|f| f.surface_type != SurfaceType::Plane));
        assert!(faces.iter().any(|f| f.surface_type == SurfaceType::Plane));
    }

    #[test]
    fn step_face_types_line_up_with_converted_faces() {
        let step = export_step(&make_cylinder(1.0, 2.0).unwrap());
        let mut kernel = TruckKernel::new();
        let handle = kernel.import(BRepFormat::Step, step.as_bytes()).unwrap();
        let faces = kernel.tessellate_faces(&handle, LINEAR_DEFLECTION).unwrap();
        assert_eq!(
            faces.iter().filter(|f| f.surface_type == SurfaceType::Plane).count(),
            2
        );

        for face in faces.iter().filter(|f| !f.positions.is_empty()) {
            let (lo, hi) = face
                .positions
                .iter()
                .fold((f64::MAX, f64::MIN), |(lo, hi), p| (lo.min(p[2]), hi.max(p[2])));
            if face.surface_type == SurfaceType::Plane {
                // caps sit at one height
                assert!(hi - lo < 1e-6, "planar face spans z {lo}..{hi}");
            } else {
                assert!((hi - lo - 2.0).abs() < 1e-6, "side face spans z {lo}..{hi}");
                for p in &face.positions {
                    let r = (p[0] * p[0] + p[1] * p[1]).sqrt();
                    assert!((r - 1.0).abs() < 1e-6, "side point at radius {r}");
                }
            }
        }
    }

    #[test]
    fn face_count_mismatch_falls_back_to_other() {
        let step = export_step(&make_box(1.0, 1.0, 1.0).unwrap());
        let mut kernel = TruckKernel::new();
        let handle = kernel.import(BRepFormat::Step, step.as_bytes()).unwrap();
        let Ok(StoredShape::Step { table, face_types }) = kernel.get(&handle) else {
            panic!("expected an imported STEP shape");
        };
        assert_eq!(face_types.len(), 1);

        let short: HashMap<u64, Vec<SurfaceType>> = face_types
            .iter()
            .map(|(id, types)| (*id, types[..4].to_vec()))
            .collect();
        let faces = tessellate_step(table, &short, LINEAR_DEFLECTION).unwrap();
        let types: Vec<_> = faces.iter().map(|f| f.surface_type).collect();
        assert_eq!(types.len(), 6);
        assert_eq!(&types[..4], &[SurfaceType::Plane; 4]);
        assert_eq!(&types[4..], &[SurfaceType::Other; 2]);

        let faces = tessellate_step(table, &HashMap::new(), LINEAR_DEFLECTION).unwrap();
        assert!(faces.iter().all(|f| f.surface_type == SurfaceType::Other));
        assert!(faces.iter().all(|f| !f.triangles.is_empty()));
    }

    #[test]
    fn malformed_iges_is_import_failure() {
        let mut kernel = TruckKernel::new();
        let err = kernel.import(BRepFormat::Iges, b"not iges").unwrap_err();
        assert_eq!(err.kind(), cad_types::ErrorKind::ParseFailure);
    }

    #[test]
    fn garbage_step_fails_to_import() {
        let mut kernel = TruckKernel::new();
        let err = kernel
            .import(BRepFormat::Step, b"this is not a step file")
            .unwrap_err();
        assert_eq!(err.kind(), cad_types::ErrorKind::ParseFailure);
    }

    #[test]
    fn non_utf8_step_fails_to_import() {
        let mut kernel = TruckKernel::new();
        assert!(kernel.import(BRepFormat::Step, &[0xff, 0xfe, 0x00]).is_err());
    }

    #[test]
    fn unknown_handle_is_not_found() {
        let mut kernel = TruckKernel::new();
        assert!(matches!(
            kernel.tessellate_faces(&ShapeHandle(42), 0.1),
            Err(KernelError::ShapeNotFound { .. })
        ));
    }

    #[test]
    fn guarded_turns_panic_into_error() {
        let result: std::result::Result<(), _> = guarded(|| panic!("boom"));
        match result {
            Err(KernelError::Panicked { message }) => assert_eq!(message, "boom"),
            other => panic!("expected Panicked, got {other:?}"),
        }
    }
}
