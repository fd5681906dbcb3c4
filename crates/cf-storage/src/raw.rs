//! Raw text sources: one file per entity, filtered by extension.
//!
//! Rule-table definitions and example scripts are plain files living outside the
//! site's content tree. Each matching file becomes one [`RawFile`] whose id is
//! derived from its file name.

use std::path::{Path, PathBuf};

use crate::storage::{Storage, StorageError};

/// Extension-based file filter with id derivation.
///
/// Extensions include the leading dot (`".txt"`, `".R"`) and are matched
/// case-sensitively against the end of the file name. When several extensions
/// match (`".txt"` and `".tar.txt"`), the longest one wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionFilter {
    extensions: Vec<String>,
    keep_extension: bool,
}

impl ExtensionFilter {
    /// Create a filter accepting any of `extensions`; ids drop the matched extension.
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extensions: extensions.into_iter().map(Into::into).collect(),
            keep_extension: false,
        }
    }

    /// Keep the extension in derived ids (`frontdoor.py` stays `frontdoor.py`).
    #[must_use]
    pub fn keeping_extension(mut self) -> Self {
        self.keep_extension = true;
        self
    }

    /// Configured extensions.
    #[must_use]
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Whether derived ids keep the extension.
    #[must_use]
    pub fn keeps_extension(&self) -> bool {
        self.keep_extension
    }

    /// Return the longest configured extension `file_name` ends with.
    ///
    /// A file name consisting only of the extension does not match.
    #[must_use]
    pub fn matched(&self, file_name: &str) -> Option<&str> {
        self.extensions
            .iter()
            .filter(|ext| file_name.len() > ext.len() && file_name.ends_with(ext.as_str()))
            .max_by_key(|ext| ext.len())
            .map(String::as_str)
    }

    /// Derive the entity id for `file_name`, or `None` if the file doesn't match.
    ///
    /// # Examples
    ///
    /// ```
    /// use cf_storage::ExtensionFilter;
    ///
    /// let tables = ExtensionFilter::new([".txt"]);
    /// assert_eq!(tables.id_for("dsep.txt").as_deref(), Some("dsep"));
    /// assert_eq!(tables.id_for("notes.md"), None);
    ///
    /// let code = ExtensionFilter::new([".py", ".R"]).keeping_extension();
    /// assert_eq!(code.id_for("iv.R").as_deref(), Some("iv.R"));
    /// ```
    #[must_use]
    pub fn id_for(&self, file_name: &str) -> Option<String> {
        let ext = self.matched(file_name)?;
        if self.keep_extension {
            Some(file_name.to_owned())
        } else {
            Some(file_name[..file_name.len() - ext.len()].to_owned())
        }
    }
}

/// A raw text file read from a source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFile {
    /// Id derived from the file name.
    pub id: String,
    /// Path the file was read from.
    pub path: PathBuf,
    /// Full file content.
    pub raw: String,
}

/// Read every file in `dir` accepted by `filter`.
///
/// Only regular files directly inside `dir` are considered (no recursion);
/// hidden files are skipped. Results are ordered by file name.
///
/// # Errors
///
/// Returns [`StorageError`] if `dir` is missing or unreadable, or if any matching
/// file cannot be read. A missing directory is an error, not an empty result.
pub fn read_raw_directory(
    storage: &dyn Storage,
    dir: &Path,
    filter: &ExtensionFilter,
) -> Result<Vec<RawFile>, StorageError> {
    let entries = storage.list(dir)?;

    let mut files = Vec::new();
    for entry in entries {
        if !entry.is_file || entry.name.starts_with('.') {
            continue;
        }
        let Some(id) = filter.id_for(&entry.name) else {
            continue;
        };
        let raw = storage.read(&entry.path)?;
        files.push(RawFile {
            id,
            path: entry.path,
            raw,
        });
    }

    tracing::debug!(dir = %dir.display(), count = files.len(), "Read raw directory");
    Ok(files)
}
