//! Mock storage implementation for testing.
//!
//! Provides [`MockStorage`] for unit testing loaders without filesystem access.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::{Duration, SystemTime};

use crate::storage::{DirEntry, Storage, StorageError};

/// Backend identifier for error messages.
const BACKEND: &str = "Mock";

#[derive(Debug, Clone)]
struct MockFile {
    content: String,
    mtime: SystemTime,
}

/// Mock storage for testing.
///
/// Stores files in memory. Directories exist implicitly for every ancestor of an
/// added file, or explicitly via [`MockStorage::with_dir`].
///
/// # Example
///
/// ```ignore
/// use std::path::Path;
/// use cf_storage::{MockStorage, Storage};
///
/// let storage = MockStorage::new()
///     .with_file("ruletables/dsep.txt", "EDGES --> <--")
///     .with_dir("empty");
///
/// let entries = storage.list(Path::new("ruletables")).unwrap();
/// ```
#[derive(Debug, Default)]
pub struct MockStorage {
    files: RwLock<BTreeMap<PathBuf, MockFile>>,
    dirs: RwLock<BTreeSet<PathBuf>>,
}

impl MockStorage {
    /// Create a new empty mock storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file with the given content and a fixed modification time.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_file(self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.write(path, content);
        self
    }

    /// Add an empty directory.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_dir(self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.register_ancestors(&path);
        self.dirs.write().unwrap().insert(path);
        self
    }

    /// Write (or overwrite) a file, advancing its modification time by one second.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn write(&self, path: impl Into<PathBuf>, content: impl Into<String>) {
        let path = path.into();
        self.register_ancestors(&path);
        let mut files = self.files.write().unwrap();
        let mtime = files.get(&path).map_or(SystemTime::UNIX_EPOCH, |f| {
            f.mtime + Duration::from_secs(1)
        });
        files.insert(
            path,
            MockFile {
                content: content.into(),
                mtime,
            },
        );
    }

    /// Remove a file.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn remove(&self, path: &Path) {
        self.files.write().unwrap().remove(path);
    }

    fn register_ancestors(&self, path: &Path) {
        let mut dirs = self.dirs.write().unwrap();
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            dirs.insert(ancestor.to_path_buf());
        }
    }
}

impl Storage for MockStorage {
    fn list(&self, dir: &Path) -> Result<Vec<DirEntry>, StorageError> {
        if !self.dirs.read().unwrap().contains(dir) {
            return Err(StorageError::not_found(dir).with_backend(BACKEND));
        }

        let mut entries: Vec<DirEntry> = Vec::new();
        for path in self.files.read().unwrap().keys() {
            if path.parent() == Some(dir) {
                entries.push(DirEntry {
                    name: file_name(path),
                    path: path.clone(),
                    is_file: true,
                });
            }
        }
        for path in self.dirs.read().unwrap().iter() {
            if path.parent() == Some(dir) {
                entries.push(DirEntry {
                    name: file_name(path),
                    path: path.clone(),
                    is_file: false,
                });
            }
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn read(&self, path: &Path) -> Result<String, StorageError> {
        self.files
            .read()
            .unwrap()
            .get(path)
            .map(|f| f.content.clone())
            .ok_or_else(|| StorageError::not_found(path).with_backend(BACKEND))
    }

    fn modified(&self, path: &Path) -> Result<SystemTime, StorageError> {
        if let Some(file) = self.files.read().unwrap().get(path) {
            return Ok(file.mtime);
        }
        if self.dirs.read().unwrap().contains(path) {
            return Ok(SystemTime::UNIX_EPOCH);
        }
        Err(StorageError::not_found(path).with_backend(BACKEND))
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
