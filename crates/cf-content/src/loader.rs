//! Collection loaders: read sources, validate records, build collections.

use std::path::{Path, PathBuf};
use std::time::Instant;

use cf_config::SourceConfig;
use cf_storage::{
    ExtensionFilter, Storage, StorageError, read_markup_directory, read_raw_directory,
    read_structured_file,
};
use serde_json::{Value, json};

use crate::collection::{Collection, Entry};
use crate::entity::Entity;
use crate::error::{ContentError, SchemaValidationError};
use crate::schema::validate;

/// How a collection's records are read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoaderKind {
    /// One plain-text file per entry, merged across directories.
    ///
    /// Each file becomes a record `{ "raw": <contents> }`.
    RawFileSet {
        dirs: Vec<PathBuf>,
        filter: ExtensionFilter,
    },
    /// One markup file per entry; front-matter is the record, the rest the body.
    MarkupGlob { dir: PathBuf, filter: ExtensionFilter },
    /// One JSON or YAML file holding every record.
    StructuredFile { path: PathBuf },
}

impl From<&SourceConfig> for LoaderKind {
    fn from(source: &SourceConfig) -> Self {
        match source {
            SourceConfig::RawFiles {
                dirs,
                extensions,
                keep_extension,
            } => {
                let filter = ExtensionFilter::new(extensions.iter().map(String::as_str));
                Self::RawFileSet {
                    dirs: dirs.clone(),
                    filter: if *keep_extension {
                        filter.keeping_extension()
                    } else {
                        filter
                    },
                }
            }
            SourceConfig::Markup { dir, extensions } => Self::MarkupGlob {
                dir: dir.clone(),
                filter: ExtensionFilter::new(extensions.iter().map(String::as_str)),
            },
            SourceConfig::DataFile { path } => Self::StructuredFile { path: path.clone() },
        }
    }
}

/// A record read from a source, before validation.
struct SourceRecord {
    id: String,
    data: Value,
    body: Option<String>,
    path: PathBuf,
}

/// Load one collection.
///
/// Every record is checked against `T::SCHEMA` before deserialization; the
/// first failure aborts the load. References are left unbound.
///
/// # Errors
///
/// Returns [`ContentError::Storage`] if a source cannot be read,
/// [`ContentError::Schema`] if a record is invalid, and
/// [`ContentError::DuplicateId`] if two records share an id.
pub fn load<T: Entity>(storage: &dyn Storage, kind: &LoaderKind) -> Result<Collection<T>, ContentError> {
    let start = Instant::now();

    let records = read_records(storage, kind).map_err(|source| ContentError::Storage {
        collection: T::COLLECTION,
        source,
    })?;

    let entries = records
        .into_iter()
        .map(into_entry::<T>)
        .collect::<Result<Vec<_>, _>>()?;
    let collection = Collection::from_entries(entries)?;

    tracing::info!(
        collection = %T::COLLECTION,
        count = collection.len(),
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Collection loaded"
    );
    Ok(collection)
}

fn read_records(storage: &dyn Storage, kind: &LoaderKind) -> Result<Vec<SourceRecord>, StorageError> {
    match kind {
        LoaderKind::RawFileSet { dirs, filter } => {
            let mut records = Vec::new();
            for dir in dirs {
                records.extend(read_raw_directory(storage, dir, filter)?.into_iter().map(|file| {
                    SourceRecord {
                        id: file.id,
                        data: json!({ "raw": file.raw }),
                        body: None,
                        path: file.path,
                    }
                }));
            }
            Ok(records)
        }
        LoaderKind::MarkupGlob { dir, filter } => Ok(read_markup_directory(storage, dir, filter)?
            .into_iter()
            .map(|file| SourceRecord {
                id: file.slug,
                data: Value::Object(file.frontmatter),
                body: Some(file.body),
                path: file.path,
            })
            .collect()),
        LoaderKind::StructuredFile { path } => Ok(read_structured_file(storage, path)?
            .into_iter()
            .map(|record| SourceRecord {
                id: record.id,
                data: record.data,
                body: None,
                path: path.clone(),
            })
            .collect()),
    }
}

fn into_entry<T: Entity>(record: SourceRecord) -> Result<Entry<T>, ContentError> {
    validate(T::COLLECTION, &record.id, &record.data, T::SCHEMA)?;

    let data = serde_json::from_value::<T>(record.data).map_err(|e| SchemaValidationError {
        collection: T::COLLECTION,
        entity: record.id.clone(),
        field: "$".to_owned(),
        expected: format!("{} entry", T::COLLECTION),
        actual: e.to_string(),
    })?;

    Ok(Entry {
        id: record.id,
        data,
        body: record.body,
        path: record.path,
    })
}

/// Source paths a loader reads, for fingerprinting.
///
/// Lists directories the same way the readers do, so a file added, removed or
/// touched changes the result.
pub(crate) fn source_files(storage: &dyn Storage, kind: &LoaderKind) -> Result<Vec<PathBuf>, StorageError> {
    let matching = |dir: &Path, filter: &ExtensionFilter| -> Result<Vec<PathBuf>, StorageError> {
        Ok(storage
            .list(dir)?
            .into_iter()
            .filter(|e| e.is_file && !e.name.starts_with('.') && filter.matched(&e.name).is_some())
            .map(|e| e.path)
            .collect())
    };

    match kind {
        LoaderKind::RawFileSet { dirs, filter } => {
            let mut paths = Vec::new();
            for dir in dirs {
                paths.extend(matching(dir, filter)?);
            }
            Ok(paths)
        }
        LoaderKind::MarkupGlob { dir, filter } => matching(dir, filter),
        LoaderKind::StructuredFile { path } => Ok(vec![path.clone()]),
    }
}
