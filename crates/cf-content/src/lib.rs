//! Typed content collections and the reference graph of the CIfly site.
//!
//! Six collections are loaded from external sources, validated against a
//! declarative schema and cross-checked: every reference field must name an
//! entry of its target collection, or the build fails.
//!
//! # Architecture
//!
//! - [`loader`]: [`LoaderKind`] and [`load`], turning sources into a [`Collection`]
//! - [`schema`]: per-entity [`FieldSpec`] lists checked before deserialization
//! - [`graph`]: [`ContentGraph`], two-phase assembly and typed lookups
//! - [`cache`]: fingerprint-keyed reuse of loaded collections between builds
//!
//! # Example
//!
//! ```ignore
//! use cf_config::Config;
//! use cf_content::{CollectionSources, ContentGraph, cache};
//! use cf_storage::FsStorage;
//!
//! let config = Config::load(None)?;
//! let sources = CollectionSources::from_config(&config.content_resolved);
//! let cache = cache::from_config(&config.cache);
//! let graph = ContentGraph::build_with_cache(&FsStorage::new(), &sources, cache.as_ref())?;
//!
//! for app in graph.applications().sorted_by_number() {
//!     for code in &app.data.code {
//!         let script = graph.follow(code).expect("bound during build");
//!         println!("{}: {}", app.id, script.id);
//!     }
//! }
//! ```

pub mod cache;
mod collection;
mod entity;
mod error;
pub mod graph;
pub mod loader;
mod name;
mod reference;
pub mod schema;

pub use cache::{
    CollectionCache, Fingerprint, MemoryCollectionCache, NullCollectionCache, load_cached,
};
pub use collection::{Collection, Entry};
pub use entity::{Application, Doc, Entity, RawCode, RawDocument, Reference, RuleTable};
pub use error::{ContentError, ReferenceResolutionError, SchemaValidationError};
pub use graph::{Backlink, CollectionSources, ContentGraph, EntityHandle};
pub use loader::{LoaderKind, load};
pub use name::{CollectionName, UnknownCollection};
pub use reference::{Ref, RefSite};
pub use schema::{FieldSpec, FieldType};
