//! Storage trait and error types.
//!
//! Provides the core [`Storage`] trait for abstracting directory listing and file
//! reads, along with [`StorageError`] for unified error handling across backends.
//!
//! Unlike a page store, every path here is a real filesystem-style path: content
//! sources are configured as directories and files, and ids are derived from file
//! names by the readers built on top of this trait.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A single directory entry returned by [`Storage::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// File name (last path component), e.g. `"frontdoor.py"`.
    pub name: String,
    /// Full path to the entry.
    pub path: PathBuf,
    /// True for regular files, false for directories and other entry types.
    pub is_file: bool,
}

/// Semantic error categories.
#[derive(Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum StorageErrorKind {
    /// Resource does not exist.
    NotFound,
    /// Permission denied.
    PermissionDenied,
    /// Path exists but is not of the expected type (e.g. a file where a directory was expected).
    InvalidPath,
    /// Content could not be decoded or parsed (non UTF-8 text, malformed JSON/YAML).
    InvalidFormat,
    /// Other/unknown error category.
    Other,
}

/// Storage error with semantic kind and backend-specific source.
#[derive(Debug)]
pub struct StorageError {
    /// Semantic error category.
    pub kind: StorageErrorKind,
    /// Path context (if applicable).
    pub path: Option<PathBuf>,
    /// Backend identifier (e.g., "Fs", "Mock").
    pub backend: Option<&'static str>,
    /// Human-readable detail for errors without an underlying source.
    pub detail: Option<String>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StorageError {
    /// Create a new storage error.
    #[must_use]
    pub fn new(kind: StorageErrorKind) -> Self {
        Self {
            kind,
            path: None,
            backend: None,
            detail: None,
            source: None,
        }
    }

    /// Attach path context.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attach backend identifier.
    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Attach a detail message.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Downcast the source error to a concrete type.
    #[must_use]
    pub fn downcast_source<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.source.as_ref()?.downcast_ref()
    }

    /// Create a not found error with path.
    #[must_use]
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::new(StorageErrorKind::NotFound).with_path(path)
    }

    /// Create an invalid format error with path and detail.
    #[must_use]
    pub fn invalid_format(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        Self::new(StorageErrorKind::InvalidFormat)
            .with_path(path)
            .with_detail(detail)
    }

    /// Create a storage error from an I/O error.
    #[must_use]
    pub fn io(err: std::io::Error, path: Option<&Path>) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => StorageErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => StorageErrorKind::PermissionDenied,
            std::io::ErrorKind::NotADirectory | std::io::ErrorKind::IsADirectory => {
                StorageErrorKind::InvalidPath
            }
            std::io::ErrorKind::InvalidData => StorageErrorKind::InvalidFormat,
            _ => StorageErrorKind::Other,
        };
        let mut error = Self::new(kind).with_source(err);
        if let Some(p) = path {
            error = error.with_path(p);
        }
        error
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: "[Backend] Kind: message (path: /foo/bar)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        let kind_str = match self.kind {
            StorageErrorKind::NotFound => "Not found",
            StorageErrorKind::PermissionDenied => "Permission denied",
            StorageErrorKind::InvalidPath => "Invalid path",
            StorageErrorKind::InvalidFormat => "Invalid format",
            StorageErrorKind::Other => "Error",
        };

        write!(f, "{kind_str}")?;

        if let Some(detail) = &self.detail {
            write!(f, ": {detail}")?;
        } else if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        if let Some(path) = &self.path {
            write!(f, " (path: {})", path.display())?;
        }

        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Read-only access to content sources.
///
/// The content core never writes: implementations only list directories, read
/// text files and report modification times (used to fingerprint sources for
/// the collection cache).
pub trait Storage: Send + Sync {
    /// List the entries of a directory, sorted by file name.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the directory does not exist or cannot be read.
    /// A missing directory is never reported as an empty listing.
    fn list(&self, dir: &Path) -> Result<Vec<DirEntry>, StorageError>;

    /// Read a file as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the file is missing, unreadable or not UTF-8.
    fn read(&self, path: &Path) -> Result<String, StorageError>;

    /// Get the modification time of a file or directory.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the path doesn't exist or mtime can't be retrieved.
    fn modified(&self, path: &Path) -> Result<SystemTime, StorageError>;
}
