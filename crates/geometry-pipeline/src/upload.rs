//! Upload flow: allow-list, size limit, store, then validate-and-repair STL.

use std::path::PathBuf;

use cad_types::{ProcessingError, RepairOutcome, ValidationVerdict};
use tracing::{info, instrument, warn};

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::format::{allowed_file, extension_of};
use crate::storage::FileStore;

/// Result of accepting an upload.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    Accepted {
        /// Where the original bytes were stored. Never modified.
        stored: PathBuf,
        /// The file to hand to `process`: the repaired copy when a repair ran.
        process_path: PathBuf,
        /// Lower-cased extension used for processing.
        extension: String,
        verdict: Option<ValidationVerdict>,
        repair: Option<RepairOutcome>,
    },
    Rejected {
        error: ProcessingError,
    },
}

impl UploadOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, UploadOutcome::Accepted { .. })
    }

    fn rejected(e: impl Into<ProcessingError>) -> Self {
        let error = e.into();
        warn!(kind = %error.kind, message = %error.message, "upload rejected");
        UploadOutcome::Rejected { error }
    }
}

/// Store an upload and, for STL, validate it and repair when needed.
///
/// An STL that fails validation and cannot be repaired is deleted from the
/// store and rejected with the validation message.
#[instrument(skip(store, bytes, config), fields(bytes = bytes.len()))]
pub fn accept_upload(
    store: &dyn FileStore,
    filename: &str,
    bytes: &[u8],
    config: &PipelineConfig,
) -> UploadOutcome {
    if !allowed_file(filename) {
        return UploadOutcome::rejected(PipelineError::Unsupported {
            name: filename.to_string(),
        });
    }
    let limit = config.max_upload_bytes();
    if bytes.len() as u64 > limit {
        return UploadOutcome::rejected(PipelineError::TooLarge {
            size: bytes.len() as u64,
            limit,
        });
    }
    // allowed_file guarantees an extension
    let extension = extension_of(filename).unwrap_or_default();

    let stored = match store.store(filename, bytes) {
        Ok(path) => path,
        Err(e) => return UploadOutcome::rejected(PipelineError::from(e)),
    };

    if extension != "stl" {
        info!(path = %stored.display(), "upload accepted");
        return UploadOutcome::Accepted {
            process_path: stored.clone(),
            stored,
            extension,
            verdict: None,
            repair: None,
        };
    }

    let verdict = stl_codec::validate_file(&stored);
    if verdict.valid {
        info!(path = %stored.display(), "STL upload valid");
        return UploadOutcome::Accepted {
            process_path: stored.clone(),
            stored,
            extension,
            verdict: Some(verdict),
            repair: None,
        };
    }

    warn!(message = %verdict.message, "STL upload invalid; repairing");
    let repair = stl_codec::repair_file(&stored);
    match repair.repaired_path.clone() {
        Some(repaired) if repair.success => {
            info!(path = %repaired.display(), "STL upload repaired");
            UploadOutcome::Accepted {
                stored,
                process_path: repaired,
                extension,
                verdict: Some(verdict),
                repair: Some(repair),
            }
        }
        _ => {
            if let Err(e) = store.delete(&stored) {
                warn!(error = %e, "could not delete rejected upload");
            }
            let error = verdict.into_error().unwrap_or_else(|| {
                ProcessingError::new(cad_types::ErrorKind::RepairFailed, repair.message)
            });
            UploadOutcome::rejected(error)
        }
    }
}
