//! Wavefront OBJ loading via tobj.

use std::io::BufReader;

use cad_types::{ClassifiedMesh, Mesh, Triangle};
use tracing::debug;

use crate::error::PipelineError;

/// Load OBJ bytes into one indexed mesh. Polygons are triangulated, all
/// models are merged, and every face is tagged planar.
///
/// Material libraries are never resolved.
pub fn load_obj(bytes: &[u8]) -> Result<ClassifiedMesh, PipelineError> {
    let mut reader = BufReader::new(bytes);
    let (models, _materials) = tobj::load_obj_buf(
        &mut reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |_| Err(tobj::LoadError::OpenFileFailed),
    )
    .map_err(|e| PipelineError::Obj {
        reason: e.to_string(),
    })?;

    let mut mesh = Mesh::new();
    for model in &models {
        let vertex_offset = u32::try_from(mesh.vertices.len()).map_err(|_| PipelineError::Obj {
            reason: "vertex count exceeds u32 range".into(),
        })?;
        let obj_mesh = &model.mesh;

        for chunk in obj_mesh.positions.chunks_exact(3) {
            mesh.vertices
                .push([chunk[0] as f64, chunk[1] as f64, chunk[2] as f64]);
        }
        for chunk in obj_mesh.indices.chunks_exact(3) {
            mesh.faces.push(Triangle::new(
                offset_index(chunk[0], vertex_offset)?,
                offset_index(chunk[1], vertex_offset)?,
                offset_index(chunk[2], vertex_offset)?,
            ));
        }
    }

    debug!(
        vertices = mesh.vertices.len(),
        faces = mesh.faces.len(),
        models = models.len(),
        "OBJ loaded"
    );

    if mesh.faces.is_empty() {
        return Err(PipelineError::Empty { what: "OBJ file" });
    }
    mesh.check_indices().map_err(|e| PipelineError::Obj {
        reason: e.to_string(),
    })?;
    Ok(ClassifiedMesh::all_planar(mesh))
}

fn offset_index(index: u32, offset: u32) -> Result<u32, PipelineError> {
    index.checked_add(offset).ok_or_else(|| PipelineError::Obj {
        reason: format!("vertex index {index} overflows after offset {offset}"),
    })
}
