//! Error types for content loading and graph assembly.
//!
//! Every error is fatal to the build. Each variant carries enough context
//! (collection, entry id, field) to locate the offending source file.

use cf_storage::StorageError;

use crate::name::CollectionName;

/// A record does not match its collection's schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "invalid entry '{entity}' in collection '{collection}': field '{field}' expected {expected}, found {actual}"
)]
pub struct SchemaValidationError {
    /// Collection being loaded.
    pub collection: CollectionName,
    /// Id of the offending entry.
    pub entity: String,
    /// Field path, e.g. `title` or `code[2]`; `$` for the record itself.
    pub field: String,
    /// Expected shape.
    pub expected: String,
    /// Actual shape found in the source.
    pub actual: String,
}

/// A reference field names an id absent from its target collection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "entry '{entity}' in collection '{collection}' references missing {target} entry '{id}' (field '{field}')"
)]
pub struct ReferenceResolutionError {
    /// Collection of the referring entry.
    pub collection: CollectionName,
    /// Id of the referring entry.
    pub entity: String,
    /// Field path of the reference, e.g. `source` or `references[1]`.
    pub field: String,
    /// Collection the reference points into.
    pub target: CollectionName,
    /// The id that could not be found.
    pub id: String,
}

/// Content loading or graph assembly error.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    /// Source directory or file missing, unreadable or malformed.
    #[error("failed to read sources of collection '{collection}': {source}")]
    Storage {
        /// Collection whose sources failed.
        collection: CollectionName,
        /// Underlying storage error.
        #[source]
        source: StorageError,
    },
    /// A record failed schema validation.
    #[error(transparent)]
    Schema(#[from] SchemaValidationError),
    /// A reference could not be resolved.
    #[error(transparent)]
    Reference(#[from] ReferenceResolutionError),
    /// Two sources produced the same id within one collection.
    #[error("duplicate id '{id}' in collection '{collection}' (from {first} and {second})")]
    DuplicateId {
        /// Collection with the collision.
        collection: CollectionName,
        /// Colliding id.
        id: String,
        /// Source of the first entry.
        first: String,
        /// Source of the second entry.
        second: String,
    },
    /// Two entries share an ordering key.
    #[error("entries '{first}' and '{second}' in collection '{collection}' share number {number}")]
    DuplicateNumber {
        /// Collection with the collision.
        collection: CollectionName,
        /// Colliding ordering key.
        number: i64,
        /// Id of the first entry.
        first: String,
        /// Id of the second entry.
        second: String,
    },
    /// Lookup of an id that is not in the collection.
    #[error("no entry '{id}' in collection '{collection}'")]
    UnknownEntry {
        /// Collection searched.
        collection: CollectionName,
        /// Missing id.
        id: String,
    },
}
