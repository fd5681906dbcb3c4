//! Source readers for the CIfly documentation content graph.
//!
//! This crate reads raw content from external sources without validating or
//! cross-referencing it. Three source shapes are supported:
//!
//! - [`read_raw_directory`]: one plain-text file per entity, filtered by extension
//! - [`read_markup_directory`]: one markdown/MDX file per entity, split into
//!   YAML front-matter and body
//! - [`read_structured_file`]: one JSON/YAML file holding an array or map of records
//!
//! All readers go through the [`Storage`] trait so loaders can be tested without
//! touching the real filesystem:
//! - [`FsStorage`] for the filesystem
//! - [`MockStorage`] for tests (behind the `mock` feature flag)
//!
//! Missing directories are errors, never empty results: losing content silently
//! must not pass into a documentation build.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use cf_storage::{read_raw_directory, ExtensionFilter, FsStorage};
//!
//! let tables = read_raw_directory(
//!     &FsStorage::new(),
//!     Path::new("../ruletables"),
//!     &ExtensionFilter::new([".txt"]),
//! )?;
//! for table in tables {
//!     println!("{}: {} bytes", table.id, table.raw.len());
//! }
//! ```

mod fs;
mod markup;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod raw;
mod storage;
mod structured;

pub use fs::FsStorage;
pub use markup::{MarkupFile, parse_markup, read_markup_directory, slugify};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockStorage;
pub use raw::{ExtensionFilter, RawFile, read_raw_directory};
pub use storage::{DirEntry, Storage, StorageError, StorageErrorKind};
pub use structured::{Record, read_structured_file};
