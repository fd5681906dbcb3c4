//! Filesystem storage backend.

use std::fs;
use std::path::Path;
use std::time::SystemTime;

use crate::storage::{DirEntry, Storage, StorageError};

/// Backend identifier for error messages.
const BACKEND: &str = "Fs";

/// Filesystem [`Storage`] implementation.
///
/// Paths are used as given; relative paths resolve against the process working
/// directory. Configuration resolves source paths against the config file's
/// directory before they reach this backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsStorage;

impl FsStorage {
    /// Create a new filesystem storage.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Storage for FsStorage {
    fn list(&self, dir: &Path) -> Result<Vec<DirEntry>, StorageError> {
        let entries =
            fs::read_dir(dir).map_err(|e| StorageError::io(e, Some(dir)).with_backend(BACKEND))?;

        let mut listed = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::io(e, Some(dir)).with_backend(BACKEND))?;
            // Follow symlinks so linked example directories behave like regular files
            let is_file = fs::metadata(entry.path()).is_ok_and(|m| m.is_file());
            listed.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                path: entry.path(),
                is_file,
            });
        }
        listed.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(listed)
    }

    fn read(&self, path: &Path) -> Result<String, StorageError> {
        fs::read_to_string(path).map_err(|e| StorageError::io(e, Some(path)).with_backend(BACKEND))
    }

    fn modified(&self, path: &Path) -> Result<SystemTime, StorageError> {
        fs::metadata(path)
            .and_then(|m| m.modified())
            .map_err(|e| StorageError::io(e, Some(path)).with_backend(BACKEND))
    }
}
