//! Assertion helpers over pipeline results with diagnostic output.

use cad_types::{ErrorKind, MeshResult, ProcessingError, ProcessingResult};

use crate::helpers::HarnessError;
use crate::oracle::OracleVerdict;

/// Unwrap a mesh result or report what came back instead.
pub fn expect_mesh<'a>(result: &'a ProcessingResult, ctx: &str) -> Result<&'a MeshResult, HarnessError> {
    match result {
        ProcessingResult::Mesh(mesh) => Ok(mesh),
        ProcessingResult::Error(e) => Err(HarnessError::UnexpectedError {
            kind: e.kind,
            message: format!("[{}] {}", ctx, e.message),
        }),
        ProcessingResult::Image(img) => Err(HarnessError::AssertionFailed {
            detail: format!("[{}] expected a mesh, got image {}", ctx, img.filename),
        }),
    }
}

/// Assert the result is an error of the given kind and return it.
pub fn expect_error<'a>(
    result: &'a ProcessingResult,
    kind: ErrorKind,
    ctx: &str,
) -> Result<&'a ProcessingError, HarnessError> {
    match result {
        ProcessingResult::Error(e) if e.kind == kind => Ok(e),
        ProcessingResult::Error(e) => Err(HarnessError::AssertionFailed {
            detail: format!("[{}] expected {}, got {}: {}", ctx, kind, e.kind, e.message),
        }),
        ProcessingResult::Mesh(m) => Err(HarnessError::UnexpectedSuccess {
            what: format!("[{}] a mesh with {} faces", ctx, m.mesh.faces.len()),
        }),
        ProcessingResult::Image(img) => Err(HarnessError::UnexpectedSuccess {
            what: format!("[{}] image {}", ctx, img.filename),
        }),
    }
}

/// Fail on the first verdict that did not pass.
pub fn assert_all_pass(verdicts: &[OracleVerdict]) -> Result<(), HarnessError> {
    match verdicts.iter().find(|v| !v.passed) {
        Some(v) => Err(HarnessError::OracleFailure {
            oracle: v.oracle_name.clone(),
            detail: v.detail.clone(),
        }),
        None => Ok(()),
    }
}
