//! Pipeline configuration loaded from environment variables.

use std::path::PathBuf;

const DEFAULT_UPLOAD_DIR: &str = "./uploads";
const DEFAULT_MAX_UPLOAD_MB: u64 = 64;

/// Pipeline configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Storage root for uploaded files.
    pub upload_dir: PathBuf,
    /// Maximum accepted upload size in MB.
    pub max_upload_mb: u64,
}

impl PipelineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            upload_dir: var("CADMESH_UPLOAD_DIR")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR)),
            max_upload_mb: var("CADMESH_MAX_UPLOAD_MB")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(DEFAULT_MAX_UPLOAD_MB),
        }
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            max_upload_mb: DEFAULT_MAX_UPLOAD_MB,
        }
    }
}
