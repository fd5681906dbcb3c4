//! Collection caching.
//!
//! Provides a trait for caching loaded collections between builds:
//! - [`CollectionCache`]: Trait for cache implementations
//! - [`NullCollectionCache`]: No-op cache (disabled caching)
//! - [`MemoryCollectionCache`]: In-process cache, one slot per collection
//!
//! Entries are keyed by a [`Fingerprint`] of the loader configuration and the
//! path and modification time of every source file. Cached collections hold
//! unbound references; graph assembly rebinds them on every build.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Instant, SystemTime};

use cf_config::CacheConfig;
use cf_storage::{Storage, StorageError};
use sha2::{Digest, Sha256};

use crate::collection::Collection;
use crate::entity::Entity;
use crate::error::ContentError;
use crate::loader::{LoaderKind, load, source_files};
use crate::name::CollectionName;

/// Type-erased cached collection.
pub type CachedCollection = Arc<dyn Any + Send + Sync>;

/// Content hash of a collection's sources.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute the fingerprint of a loader's sources.
    ///
    /// SHA-256 over the collection name, the loader configuration, and each
    /// source path with its modification time in nanoseconds.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if a source directory cannot be listed or a
    /// file's modification time cannot be read.
    pub fn compute(
        storage: &dyn Storage,
        collection: CollectionName,
        kind: &LoaderKind,
    ) -> Result<Self, StorageError> {
        let mut hasher = Sha256::new();
        hasher.update(collection.as_str().as_bytes());
        hasher.update(format!("{kind:?}").as_bytes());
        for path in source_files(storage, kind)? {
            let mtime = storage
                .modified(&path)?
                .duration_since(SystemTime::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos();
            hasher.update(format!("\n{}:{mtime}", path.display()).as_bytes());
        }
        Ok(Self(hex::encode(hasher.finalize())))
    }

    /// Hex digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Trait for collection caching implementations.
///
/// Implementations must be thread-safe (`Send + Sync`) since collections are
/// loaded in parallel.
pub trait CollectionCache: Send + Sync {
    /// Retrieve a cached collection if its fingerprint still matches.
    fn get(&self, collection: CollectionName, fingerprint: &Fingerprint) -> Option<CachedCollection>;

    /// Store a loaded collection, replacing any older entry for the same name.
    fn set(&self, collection: CollectionName, fingerprint: Fingerprint, value: CachedCollection);

    /// Drop every cached collection.
    fn invalidate(&self);

    /// Whether lookups can ever hit. Disabled caches skip fingerprinting.
    fn is_enabled(&self) -> bool {
        true
    }
}

/// No-op cache implementation.
///
/// Always returns cache misses and discards stored collections.
#[derive(Debug, Default)]
pub struct NullCollectionCache;

impl CollectionCache for NullCollectionCache {
    fn get(&self, _collection: CollectionName, _fingerprint: &Fingerprint) -> Option<CachedCollection> {
        None
    }

    fn set(&self, _collection: CollectionName, _fingerprint: Fingerprint, _value: CachedCollection) {}

    fn invalidate(&self) {}

    fn is_enabled(&self) -> bool {
        false
    }
}

/// In-memory cache holding the latest load of each collection.
#[derive(Default)]
pub struct MemoryCollectionCache {
    slots: Mutex<HashMap<CollectionName, (Fingerprint, CachedCollection)>>,
}

impl MemoryCollectionCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached collections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for MemoryCollectionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCollectionCache")
            .field("len", &self.len())
            .finish()
    }
}

impl CollectionCache for MemoryCollectionCache {
    fn get(&self, collection: CollectionName, fingerprint: &Fingerprint) -> Option<CachedCollection> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots
            .get(&collection)
            .filter(|(cached, _)| cached == fingerprint)
            .map(|(_, value)| Arc::clone(value))
    }

    fn set(&self, collection: CollectionName, fingerprint: Fingerprint, value: CachedCollection) {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(collection, (fingerprint, value));
    }

    fn invalidate(&self) {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

/// Create the cache selected by `[cache] enabled`.
#[must_use]
pub fn from_config(config: &CacheConfig) -> Box<dyn CollectionCache> {
    if config.enabled {
        Box::new(MemoryCollectionCache::new())
    } else {
        Box::new(NullCollectionCache)
    }
}

/// Load a collection through a cache.
///
/// A hit returns a clone of the cached collection without reading sources.
/// A disabled cache loads directly, without fingerprinting.
///
/// # Errors
///
/// Returns the same errors as [`load`], plus [`ContentError::Storage`] if the
/// fingerprint cannot be computed.
pub fn load_cached<T: Entity>(
    storage: &dyn Storage,
    kind: &LoaderKind,
    cache: &dyn CollectionCache,
) -> Result<Collection<T>, ContentError> {
    if !cache.is_enabled() {
        return load::<T>(storage, kind);
    }

    let start = Instant::now();
    let fingerprint =
        Fingerprint::compute(storage, T::COLLECTION, kind).map_err(|source| ContentError::Storage {
            collection: T::COLLECTION,
            source,
        })?;

    if let Some(cached) = cache.get(T::COLLECTION, &fingerprint)
        && let Some(collection) = cached.downcast_ref::<Collection<T>>()
    {
        tracing::debug!(
            collection = %T::COLLECTION,
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Collection cache hit"
        );
        return Ok(collection.clone());
    }

    tracing::debug!(collection = %T::COLLECTION, fingerprint = fingerprint.as_str(), "Collection cache miss");
    let collection = load::<T>(storage, kind)?;
    cache.set(T::COLLECTION, fingerprint, Arc::new(collection.clone()));
    Ok(collection)
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};

    use cf_storage::{DirEntry, ExtensionFilter, MockStorage, StorageErrorKind};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::entity::RawDocument;

    /// Memory cache that counts hits.
    #[derive(Default)]
    struct CountingCache {
        inner: MemoryCollectionCache,
        hits: AtomicUsize,
    }

    impl CollectionCache for CountingCache {
        fn get(&self, collection: CollectionName, fingerprint: &Fingerprint) -> Option<CachedCollection> {
            let value = self.inner.get(collection, fingerprint);
            if value.is_some() {
                self.hits.fetch_add(1, Ordering::SeqCst);
            }
            value
        }

        fn set(&self, collection: CollectionName, fingerprint: Fingerprint, value: CachedCollection) {
            self.inner.set(collection, fingerprint, value);
        }

        fn invalidate(&self) {
            self.inner.invalidate();
        }
    }

    /// Backend without modification times.
    struct NoMtime(MockStorage);

    impl Storage for NoMtime {
        fn list(&self, dir: &Path) -> Result<Vec<DirEntry>, StorageError> {
            self.0.list(dir)
        }

        fn read(&self, path: &Path) -> Result<String, StorageError> {
            self.0.read(path)
        }

        fn modified(&self, path: &Path) -> Result<SystemTime, StorageError> {
            Err(StorageError::new(StorageErrorKind::Other)
                .with_path(path)
                .with_detail("mtime unsupported"))
        }
    }

    fn kind() -> LoaderKind {
        LoaderKind::RawFileSet {
            dirs: vec![PathBuf::from("ruletables")],
            filter: ExtensionFilter::new([".txt"]),
        }
    }

    fn storage() -> MockStorage {
        MockStorage::new()
            .with_file("ruletables/a.txt", "A")
            .with_file("ruletables/b.txt", "B")
    }

    #[test]
    fn test_fingerprint_stable() {
        let storage = storage();

        let first = Fingerprint::compute(&storage, CollectionName::RawDocuments, &kind()).unwrap();
        let second = Fingerprint::compute(&storage, CollectionName::RawDocuments, &kind()).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.as_str().len(), 64);
    }

    #[test]
    fn test_fingerprint_changes_on_write() {
        let storage = storage();
        let before = Fingerprint::compute(&storage, CollectionName::RawDocuments, &kind()).unwrap();

        storage.write("ruletables/a.txt", "A2");

        let after = Fingerprint::compute(&storage, CollectionName::RawDocuments, &kind()).unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn test_fingerprint_changes_on_new_file() {
        let storage = storage();
        let before = Fingerprint::compute(&storage, CollectionName::RawDocuments, &kind()).unwrap();

        storage.write("ruletables/c.txt", "C");

        let after = Fingerprint::compute(&storage, CollectionName::RawDocuments, &kind()).unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn test_fingerprint_depends_on_collection() {
        let storage = storage();

        let raw = Fingerprint::compute(&storage, CollectionName::RawDocuments, &kind()).unwrap();
        let code = Fingerprint::compute(&storage, CollectionName::RawCode, &kind()).unwrap();

        assert_ne!(raw, code);
    }

    #[test]
    fn test_null_cache_always_misses() {
        let storage = storage();
        let cache = NullCollectionCache;

        load_cached::<RawDocument>(&storage, &kind(), &cache).unwrap();
        let fingerprint = Fingerprint::compute(&storage, CollectionName::RawDocuments, &kind()).unwrap();

        assert!(cache.get(CollectionName::RawDocuments, &fingerprint).is_none());
    }

    #[test]
    fn test_disabled_cache_does_not_read_mtimes() {
        let storage = NoMtime(storage());

        let collection = load_cached::<RawDocument>(&storage, &kind(), &NullCollectionCache).unwrap();
        assert_eq!(collection.len(), 2);

        let err = load_cached::<RawDocument>(&storage, &kind(), &MemoryCollectionCache::new()).unwrap_err();
        assert!(matches!(err, ContentError::Storage { .. }));
    }

    #[test]
    fn test_from_config_follows_enabled_flag() {
        assert!(from_config(&CacheConfig { enabled: true }).is_enabled());
        assert!(!from_config(&CacheConfig { enabled: false }).is_enabled());
    }

    #[test]
    fn test_hit_then_miss_after_write() {
        let storage = storage();
        let cache = CountingCache::default();

        load_cached::<RawDocument>(&storage, &kind(), &cache).unwrap();
        let cached = load_cached::<RawDocument>(&storage, &kind(), &cache).unwrap();
        assert_eq!(cache.hits.load(Ordering::SeqCst), 1);
        assert_eq!(cached.get("a").unwrap().data.raw, "A");

        storage.write("ruletables/a.txt", "A2");
        let reloaded = load_cached::<RawDocument>(&storage, &kind(), &cache).unwrap();

        assert_eq!(cache.hits.load(Ordering::SeqCst), 1);
        assert_eq!(reloaded.get("a").unwrap().data.raw, "A2");
    }

    #[test]
    fn test_invalidate_forces_reload() {
        let storage = storage();
        let cache = CountingCache::default();

        load_cached::<RawDocument>(&storage, &kind(), &cache).unwrap();
        assert_eq!(cache.inner.len(), 1);

        cache.invalidate();
        assert!(cache.inner.is_empty());

        load_cached::<RawDocument>(&storage, &kind(), &cache).unwrap();
        assert_eq!(cache.hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_removed_source_is_reported() {
        let storage = storage();
        let cache = MemoryCollectionCache::new();
        load_cached::<RawDocument>(&storage, &kind(), &cache).unwrap();

        storage.remove(Path::new("ruletables/b.txt"));
        let reloaded = load_cached::<RawDocument>(&storage, &kind(), &cache).unwrap();

        assert_eq!(reloaded.ids().collect::<Vec<_>>(), vec!["a"]);
    }
}
