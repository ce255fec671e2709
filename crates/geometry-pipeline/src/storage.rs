//! File storage collaborator.
//!
//! The pipeline never decides where uploads live; callers hand it a store
//! rooted at an explicit directory.

use std::fs;
use std::path::{Path, PathBuf};

use cad_types::ErrorKind;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("invalid file name: {name:?}")]
    InvalidName { name: String },

    #[error("storage I/O on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StorageError::InvalidName { .. } => ErrorKind::UnsupportedFormat,
            StorageError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                ErrorKind::FileNotFound
            }
            StorageError::Io { .. } => ErrorKind::Internal,
        }
    }
}

/// Persistence for raw uploads. Paths returned by `store` are filesystem
/// paths the STL validator and repairer can open.
pub trait FileStore {
    fn store(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, StorageError>;
    fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError>;
    fn delete(&self, path: &Path) -> Result<(), StorageError>;
}

/// Store files flat under a root directory.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Reduce a client-supplied name to a safe basename.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

impl FileStore for FsStore {
    fn store(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, StorageError> {
        let name = sanitize_filename(filename).ok_or_else(|| StorageError::InvalidName {
            name: filename.to_string(),
        })?;
        fs::create_dir_all(&self.root).map_err(|e| StorageError::io(&self.root, e))?;

        let mut path = self.root.join(&name);
        if path.exists() {
            // keep the extension last so format detection still works
            let unique = uuid::Uuid::new_v4().simple().to_string();
            let renamed = match name.rsplit_once('.') {
                Some((stem, ext)) => format!("{stem}_{}.{ext}", &unique[..8]),
                None => format!("{name}_{}", &unique[..8]),
            };
            path = self.root.join(renamed);
        }

        fs::write(&path, bytes).map_err(|e| StorageError::io(&path, e))?;
        debug!(path = %path.display(), bytes = bytes.len(), "upload stored");
        Ok(path)
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        fs::read(path).map_err(|e| StorageError::io(path, e))
    }

    fn delete(&self, path: &Path) -> Result<(), StorageError> {
        fs::remove_file(path).map_err(|e| StorageError::io(path, e))?;
        debug!(path = %path.display(), "upload deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_directories_and_odd_chars() {
        assert_eq!(sanitize_filename("../../etc/passwd").as_deref(), Some("passwd"));
        assert_eq!(sanitize_filename("C:\\parts\\my part.stl").as_deref(), Some("my_part.stl"));
        assert_eq!(sanitize_filename("..").as_deref(), None);
        assert_eq!(sanitize_filename("").as_deref(), None);
    }

    #[test]
    fn store_read_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path().join("uploads"));
        let path = store.store("part.stl", b"abc").unwrap();
        assert!(path.starts_with(store.root()));
        assert_eq!(store.read(&path).unwrap(), b"abc");
        store.delete(&path).unwrap();
        assert_eq!(store.read(&path).unwrap_err().kind(), ErrorKind::FileNotFound);
    }

    #[test]
    fn colliding_names_get_unique_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        let a = store.store("part.stl", b"a").unwrap();
        let b = store.store("part.stl", b"b").unwrap();
        assert_ne!(a, b);
        assert_eq!(b.extension().and_then(|e| e.to_str()), Some("stl"));
        assert_eq!(store.read(&a).unwrap(), b"a");
    }
}
