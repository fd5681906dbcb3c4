//! The reference graph: every collection, with references bound.
//!
//! Assembly runs in two phases:
//!
//! 1. Every collection is loaded independently and in parallel. Loaders share
//!    no state, so no locking is needed. If several fail, the error of the
//!    first collection in [`CollectionName::ALL`] order is returned.
//! 2. Every reference field of every entry is resolved against its target
//!    collection and bound to the target's position, and `number` keys are
//!    checked for uniqueness. The first failure aborts the build.
//!
//! A [`ContentGraph`] only exists once both phases have succeeded.

use std::collections::HashMap;
use std::time::Instant;

use cf_config::ContentConfig;
use cf_storage::Storage;

use crate::cache::{CollectionCache, NullCollectionCache, load_cached};
use crate::collection::{Collection, Entry};
use crate::entity::{Application, Doc, Entity, RawCode, RawDocument, Reference, RuleTable};
use crate::error::{ContentError, ReferenceResolutionError};
use crate::loader::LoaderKind;
use crate::name::CollectionName;
use crate::reference::Ref;

/// Loader configuration for each collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSources {
    pub ruletables_raw: LoaderKind,
    pub ruletables: LoaderKind,
    pub code_raw: LoaderKind,
    pub applications: LoaderKind,
    pub references: LoaderKind,
    pub docs: LoaderKind,
}

impl CollectionSources {
    /// Loader kinds for resolved content configuration.
    #[must_use]
    pub fn from_config(config: &ContentConfig) -> Self {
        Self {
            ruletables_raw: LoaderKind::from(&config.ruletables_raw),
            ruletables: LoaderKind::from(&config.ruletables),
            code_raw: LoaderKind::from(&config.code_raw),
            applications: LoaderKind::from(&config.applications),
            references: LoaderKind::from(&config.references),
            docs: LoaderKind::from(&config.docs),
        }
    }
}

/// An entry that refers to another one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backlink {
    /// Collection of the referring entry.
    pub collection: CollectionName,
    /// Id of the referring entry.
    pub id: String,
    /// Field holding the reference, e.g. `ruletables[0]`.
    pub field: String,
}

/// A resolved entry of any collection.
#[derive(Debug, Clone, Copy)]
pub enum EntityHandle<'g> {
    RawDocument(&'g Entry<RawDocument>),
    RuleTable(&'g Entry<RuleTable>),
    RawCode(&'g Entry<RawCode>),
    Application(&'g Entry<Application>),
    Reference(&'g Entry<Reference>),
    Doc(&'g Entry<Doc>),
}

impl EntityHandle<'_> {
    /// Collection the entry belongs to.
    #[must_use]
    pub fn collection(&self) -> CollectionName {
        match self {
            Self::RawDocument(_) => CollectionName::RawDocuments,
            Self::RuleTable(_) => CollectionName::RuleTables,
            Self::RawCode(_) => CollectionName::RawCode,
            Self::Application(_) => CollectionName::Applications,
            Self::Reference(_) => CollectionName::References,
            Self::Doc(_) => CollectionName::Docs,
        }
    }

    /// Entry id.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::RawDocument(e) => &e.id,
            Self::RuleTable(e) => &e.id,
            Self::RawCode(e) => &e.id,
            Self::Application(e) => &e.id,
            Self::Reference(e) => &e.id,
            Self::Doc(e) => &e.id,
        }
    }
}

type IdIndexes = HashMap<CollectionName, HashMap<String, usize>>;
type Backlinks = HashMap<CollectionName, HashMap<String, Vec<Backlink>>>;

/// All content collections with every reference resolved.
#[derive(Debug)]
pub struct ContentGraph {
    raw_documents: Collection<RawDocument>,
    rule_tables: Collection<RuleTable>,
    raw_code: Collection<RawCode>,
    applications: Collection<Application>,
    references: Collection<Reference>,
    docs: Collection<Doc>,
    backlinks: Backlinks,
}

impl ContentGraph {
    /// Load every collection and resolve all references.
    ///
    /// # Errors
    ///
    /// Returns the first [`ContentError`] of Phase 1 (in collection order) or
    /// Phase 2.
    pub fn build(storage: &dyn Storage, sources: &CollectionSources) -> Result<Self, ContentError> {
        Self::build_with_cache(storage, sources, &NullCollectionCache)
    }

    /// Like [`ContentGraph::build`], reusing cached collections whose sources
    /// are unchanged. Phase 2 always runs.
    ///
    /// # Errors
    ///
    /// Same as [`ContentGraph::build`].
    pub fn build_with_cache(
        storage: &dyn Storage,
        sources: &CollectionSources,
        cache: &dyn CollectionCache,
    ) -> Result<Self, ContentError> {
        let start = Instant::now();

        let ((raw_documents, rule_tables), ((raw_code, applications), (references, docs))) =
            rayon::join(
                || {
                    rayon::join(
                        || load_cached::<RawDocument>(storage, &sources.ruletables_raw, cache),
                        || load_cached::<RuleTable>(storage, &sources.ruletables, cache),
                    )
                },
                || {
                    rayon::join(
                        || {
                            rayon::join(
                                || load_cached::<RawCode>(storage, &sources.code_raw, cache),
                                || load_cached::<Application>(storage, &sources.applications, cache),
                            )
                        },
                        || {
                            rayon::join(
                                || load_cached::<Reference>(storage, &sources.references, cache),
                                || load_cached::<Doc>(storage, &sources.docs, cache),
                            )
                        },
                    )
                },
            );

        let mut graph = Self {
            raw_documents: raw_documents?,
            rule_tables: rule_tables?,
            raw_code: raw_code?,
            applications: applications?,
            references: references?,
            docs: docs?,
            backlinks: Backlinks::new(),
        };
        graph.bind_references()?;
        graph.check_numbers()?;

        tracing::info!(
            entries = graph.len(),
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Content graph ready"
        );
        Ok(graph)
    }

    fn bind_references(&mut self) -> Result<(), ReferenceResolutionError> {
        let ids: IdIndexes = [
            (CollectionName::RawDocuments, self.raw_documents.id_index().clone()),
            (CollectionName::RuleTables, self.rule_tables.id_index().clone()),
            (CollectionName::RawCode, self.raw_code.id_index().clone()),
            (CollectionName::Applications, self.applications.id_index().clone()),
            (CollectionName::References, self.references.id_index().clone()),
            (CollectionName::Docs, self.docs.id_index().clone()),
        ]
        .into_iter()
        .collect();

        let mut backlinks = Backlinks::new();
        bind_collection(&mut self.raw_documents, &ids, &mut backlinks)?;
        bind_collection(&mut self.rule_tables, &ids, &mut backlinks)?;
        bind_collection(&mut self.raw_code, &ids, &mut backlinks)?;
        bind_collection(&mut self.applications, &ids, &mut backlinks)?;
        bind_collection(&mut self.references, &ids, &mut backlinks)?;
        bind_collection(&mut self.docs, &ids, &mut backlinks)?;
        self.backlinks = backlinks;
        Ok(())
    }

    fn check_numbers(&self) -> Result<(), ContentError> {
        check_unique_numbers(&self.applications)?;
        check_unique_numbers(&self.docs)
    }

    /// Look up an entry by collection and id.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::UnknownEntry`] if the id is not in the collection.
    pub fn resolve(&self, collection: CollectionName, id: &str) -> Result<EntityHandle<'_>, ContentError> {
        let handle = match collection {
            CollectionName::RawDocuments => self.raw_documents.get(id).map(EntityHandle::RawDocument),
            CollectionName::RuleTables => self.rule_tables.get(id).map(EntityHandle::RuleTable),
            CollectionName::RawCode => self.raw_code.get(id).map(EntityHandle::RawCode),
            CollectionName::Applications => self.applications.get(id).map(EntityHandle::Application),
            CollectionName::References => self.references.get(id).map(EntityHandle::Reference),
            CollectionName::Docs => self.docs.get(id).map(EntityHandle::Doc),
        };
        handle.ok_or_else(|| ContentError::UnknownEntry {
            collection,
            id: id.to_owned(),
        })
    }

    /// Follow a bound reference. Unbound references yield `None`.
    #[must_use]
    pub fn follow<T: Entity>(&self, reference: &Ref<T>) -> Option<&Entry<T>> {
        T::collection_in(self).get_index(reference.handle()?)
    }

    /// Typed collection accessor.
    #[must_use]
    pub fn collection<T: Entity>(&self) -> &Collection<T> {
        T::collection_in(self)
    }

    /// Entries that refer to `id` in `target`, in collection then id order.
    #[must_use]
    pub fn referrers(&self, target: CollectionName, id: &str) -> &[Backlink] {
        self.backlinks
            .get(&target)
            .and_then(|by_id| by_id.get(id))
            .map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn raw_documents(&self) -> &Collection<RawDocument> {
        &self.raw_documents
    }

    #[must_use]
    pub fn rule_tables(&self) -> &Collection<RuleTable> {
        &self.rule_tables
    }

    #[must_use]
    pub fn raw_code(&self) -> &Collection<RawCode> {
        &self.raw_code
    }

    #[must_use]
    pub fn applications(&self) -> &Collection<Application> {
        &self.applications
    }

    #[must_use]
    pub fn references(&self) -> &Collection<Reference> {
        &self.references
    }

    #[must_use]
    pub fn docs(&self) -> &Collection<Doc> {
        &self.docs
    }

    /// Total number of entries across all collections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.raw_documents.len()
            + self.rule_tables.len()
            + self.raw_code.len()
            + self.applications.len()
            + self.references.len()
            + self.docs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn bind_collection<T: Entity>(
    collection: &mut Collection<T>,
    ids: &IdIndexes,
    backlinks: &mut Backlinks,
) -> Result<(), ReferenceResolutionError> {
    for entry in collection.entries_mut() {
        let Entry { id, data, .. } = entry;
        for mut site in data.ref_sites() {
            let Some(position) = ids.get(&site.target).and_then(|index| index.get(site.id)).copied()
            else {
                return Err(ReferenceResolutionError {
                    collection: T::COLLECTION,
                    entity: id.clone(),
                    field: site.field,
                    target: site.target,
                    id: site.id.to_owned(),
                });
            };
            site.bind(position);
            backlinks
                .entry(site.target)
                .or_default()
                .entry(site.id.to_owned())
                .or_default()
                .push(Backlink {
                    collection: T::COLLECTION,
                    id: id.clone(),
                    field: site.field,
                });
        }
    }
    Ok(())
}

fn check_unique_numbers<T: Entity>(collection: &Collection<T>) -> Result<(), ContentError> {
    let mut seen: HashMap<i64, &str> = HashMap::new();
    for entry in collection {
        let Some(number) = entry.data.number() else {
            continue;
        };
        if let Some(first) = seen.insert(number, &entry.id) {
            return Err(ContentError::DuplicateNumber {
                collection: T::COLLECTION,
                number,
                first: first.to_owned(),
                second: entry.id.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::time::SystemTime;

    use cf_storage::{DirEntry, ExtensionFilter, FsStorage, MockStorage, StorageError, StorageErrorKind};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::cache::MemoryCollectionCache;

    const DSEP: &str = "---\ntitle: d-separation\ndescription: Test d-separation\nsource: dsep\ngraph: dag\nreferences: [wienobst2025]\n---\nBody\n";
    const BACKDOOR: &str = "---\ntitle: Back-door\ndescription: Back-door adjustment\nsource: backdoor\ngraph: dag\nreferences: []\n---\n";
    const ADJUSTMENT: &str = "---\ntitle: Adjustment sets\nshortTitle: Adjustment\nsummary: Find adjustment sets\ndescription: d\ncode: [adjustment.py, adjustment.R]\nruletables: [backdoor, dsep]\ngraph: dag\nreferences: [wienobst2025, perkovic2018]\nnumber: 1\n---\n";
    const PAPERS: &str = r#"[
        {"id": "wienobst2025", "authors": ["M. Wienöbst", "S. Weichwald", "L. Henckel"], "title": "Linear-time graphical algorithms", "year": "2025", "venue": "arXiv", "url": "https://arxiv.org/abs/2506.15758"},
        {"id": "perkovic2018", "authors": ["E. Perković"], "title": "Complete graphical characterization", "year": "2018", "venue": "JMLR", "url": "https://jmlr.org"}
    ]"#;

    fn doc(number: i64) -> String {
        format!("---\ntitle: Page\nshortTitle: Page\nsummary: s\ndescription: d\nnumber: {number}\n---\n")
    }

    fn site() -> MockStorage {
        MockStorage::new()
            .with_file("ruletables/dsep.txt", "EDGES --> <--")
            .with_file("ruletables/backdoor.txt", "EDGES --> <--")
            .with_file("py/adjustment.py", "import ciflypy")
            .with_file("r/adjustment.R", "library(ciflyr)")
            .with_file("content/ruletables/dsep.md", DSEP)
            .with_file("content/ruletables/backdoor.md", BACKDOOR)
            .with_file("content/applications/adjustment.md", ADJUSTMENT)
            .with_file("content/references/papers.json", PAPERS)
            .with_file("content/docs/intro.md", doc(1))
            .with_file("content/docs/install.md", doc(2))
    }

    fn markup(dir: &str) -> LoaderKind {
        LoaderKind::MarkupGlob {
            dir: PathBuf::from(dir),
            filter: ExtensionFilter::new([".md", ".mdx"]),
        }
    }

    fn sources() -> CollectionSources {
        CollectionSources {
            ruletables_raw: LoaderKind::RawFileSet {
                dirs: vec![PathBuf::from("ruletables")],
                filter: ExtensionFilter::new([".txt"]),
            },
            ruletables: markup("content/ruletables"),
            code_raw: LoaderKind::RawFileSet {
                dirs: vec![PathBuf::from("py"), PathBuf::from("r")],
                filter: ExtensionFilter::new([".py", ".R"]).keeping_extension(),
            },
            applications: markup("content/applications"),
            references: LoaderKind::StructuredFile {
                path: PathBuf::from("content/references/papers.json"),
            },
            docs: markup("content/docs"),
        }
    }

    #[test]
    fn test_build_valid_graph() {
        let graph = ContentGraph::build(&site(), &sources()).unwrap();

        assert_eq!(graph.raw_documents().len(), 2);
        assert_eq!(graph.rule_tables().len(), 2);
        assert_eq!(graph.raw_code().len(), 2);
        assert_eq!(graph.applications().len(), 1);
        assert_eq!(graph.references().len(), 2);
        assert_eq!(graph.docs().len(), 2);
        assert_eq!(graph.len(), 11);
    }

    #[test]
    fn test_every_reference_resolves() {
        let graph = ContentGraph::build(&site(), &sources()).unwrap();

        let app = &graph.applications().get("adjustment").unwrap().data;
        let code: Vec<_> = app
            .code
            .iter()
            .map(|r| graph.follow(r).unwrap().data.raw.as_str())
            .collect();
        assert_eq!(code, vec!["import ciflypy", "library(ciflyr)"]);

        for table in graph.rule_tables() {
            let source = graph.follow(&table.data.source).unwrap();
            assert_eq!(source.id, table.data.source.id());
            for reference in &table.data.references {
                assert!(graph.resolve(CollectionName::References, reference.id()).is_ok());
            }
        }
        for r in &app.ruletables {
            let handle = graph.resolve(CollectionName::RawDocuments, r.id()).unwrap();
            assert_eq!(handle.collection(), CollectionName::RawDocuments);
            assert_eq!(handle.id(), r.id());
        }
        let authors = &graph.follow(&app.references[1]).unwrap().data.authors;
        assert_eq!(authors, &vec!["E. Perković".to_owned()]);
    }

    #[test]
    fn test_dangling_reference_names_id() {
        let storage = site();
        storage.write(
            "content/ruletables/dsep.md",
            DSEP.replace("source: dsep", "source: d-sep"),
        );

        let err = ContentGraph::build(&storage, &sources()).unwrap_err();

        match err {
            ContentError::Reference(err) => {
                assert_eq!(err.collection, CollectionName::RuleTables);
                assert_eq!(err.entity, "dsep");
                assert_eq!(err.field, "source");
                assert_eq!(err.target, CollectionName::RawDocuments);
                assert_eq!(err.id, "d-sep");
            }
            other => panic!("expected Reference, got {other:?}"),
        }
    }

    #[test]
    fn test_dangling_list_reference_names_position() {
        let storage = site();
        storage.write(
            "content/applications/adjustment.md",
            ADJUSTMENT.replace("adjustment.R]", "adjustment.r]"),
        );

        let err = ContentGraph::build(&storage, &sources()).unwrap_err();

        assert!(
            matches!(err, ContentError::Reference(ref e) if e.field == "code[1]" && e.id == "adjustment.r"),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn test_duplicate_number_rejected() {
        let storage = site();
        storage.write("content/docs/install.md", doc(1));

        let err = ContentGraph::build(&storage, &sources()).unwrap_err();

        match err {
            ContentError::DuplicateNumber {
                collection,
                number,
                first,
                second,
            } => {
                assert_eq!(collection, CollectionName::Docs);
                assert_eq!(number, 1);
                assert_eq!(first, "install");
                assert_eq!(second, "intro");
            }
            other => panic!("expected DuplicateNumber, got {other:?}"),
        }
    }

    #[test]
    fn test_first_error_in_collection_order() {
        let storage = site();
        let mut sources = sources();
        sources.ruletables_raw = LoaderKind::RawFileSet {
            dirs: vec![PathBuf::from("missing")],
            filter: ExtensionFilter::new([".txt"]),
        };
        sources.docs = markup("also-missing");

        let err = ContentGraph::build(&storage, &sources).unwrap_err();

        assert!(
            matches!(err, ContentError::Storage { collection: CollectionName::RawDocuments, ref source } if source.kind == StorageErrorKind::NotFound),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn test_resolve_unknown_entry() {
        let graph = ContentGraph::build(&site(), &sources()).unwrap();

        let err = graph.resolve(CollectionName::Docs, "missing").unwrap_err();

        assert_eq!(err.to_string(), "no entry 'missing' in collection 'docs'");
    }

    #[test]
    fn test_referrers() {
        let graph = ContentGraph::build(&site(), &sources()).unwrap();

        assert_eq!(
            graph.referrers(CollectionName::RawDocuments, "dsep"),
            &[
                Backlink {
                    collection: CollectionName::RuleTables,
                    id: "dsep".to_owned(),
                    field: "source".to_owned(),
                },
                Backlink {
                    collection: CollectionName::Applications,
                    id: "adjustment".to_owned(),
                    field: "ruletables[1]".to_owned(),
                },
            ]
        );
        assert!(graph.referrers(CollectionName::Docs, "intro").is_empty());
    }

    #[test]
    fn test_unbound_reference_not_followed() {
        let graph = ContentGraph::build(&site(), &sources()).unwrap();

        assert!(graph.follow(&Ref::<RawDocument>::new("dsep")).is_none());
    }

    #[test]
    fn test_navigation_order() {
        let graph = ContentGraph::build(&site(), &sources()).unwrap();

        let order: Vec<_> = graph
            .collection::<Doc>()
            .sorted_by_number()
            .into_iter()
            .map(|e| e.id.as_str())
            .collect();

        assert_eq!(order, vec!["intro", "install"]);
    }

    #[test]
    fn test_cached_build_rebinds_references() {
        let storage = site();
        let cache = MemoryCollectionCache::new();

        ContentGraph::build_with_cache(&storage, &sources(), &cache).unwrap();
        assert_eq!(cache.len(), 6);

        storage.write("ruletables/aaa.txt", "shifts every position");
        let graph = ContentGraph::build_with_cache(&storage, &sources(), &cache).unwrap();

        let table = graph.rule_tables().get("dsep").unwrap();
        assert_eq!(graph.follow(&table.data.source).unwrap().id, "dsep");
        let app = graph.applications().get("adjustment").unwrap();
        assert_eq!(graph.follow(&app.data.ruletables[0]).unwrap().id, "backdoor");
    }

    #[test]
    fn test_cache_does_not_hide_new_errors() {
        let storage = site();
        let cache = MemoryCollectionCache::new();
        ContentGraph::build_with_cache(&storage, &sources(), &cache).unwrap();

        storage.remove(Path::new("ruletables/backdoor.txt"));
        let err = ContentGraph::build_with_cache(&storage, &sources(), &cache).unwrap_err();

        assert!(matches!(err, ContentError::Reference(ref e) if e.id == "backdoor"));
    }

    /// Backend that cannot report modification times.
    struct NoMtime(MockStorage);

    impl Storage for NoMtime {
        fn list(&self, dir: &Path) -> Result<Vec<DirEntry>, StorageError> {
            self.0.list(dir)
        }

        fn read(&self, path: &Path) -> Result<String, StorageError> {
            self.0.read(path)
        }

        fn modified(&self, path: &Path) -> Result<SystemTime, StorageError> {
            Err(StorageError::new(StorageErrorKind::Other).with_path(path))
        }
    }

    #[test]
    fn test_uncached_build_needs_no_mtimes() {
        let graph = ContentGraph::build(&NoMtime(site()), &sources()).unwrap();

        assert_eq!(graph.len(), 11);
    }

    #[test]
    fn test_build_from_default_layout_on_disk() {
        let root = tempfile::tempdir().unwrap();
        let write = |rel: &str, content: &str| {
            let path = root.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        };
        write("ruletables/dsep.txt", "EDGES --> <--");
        write("ruletables/backdoor.txt", "EDGES --> <--");
        write("examples/ciflypy-examples/ciflypy_examples/adjustment.py", "import ciflypy");
        write("examples/ciflyr-examples/R/adjustment.R", "library(ciflyr)");
        write("website/src/content/ruletables/dsep.mdx", DSEP);
        write("website/src/content/ruletables/backdoor.mdx", BACKDOOR);
        write("website/src/content/applications/adjustment.mdx", ADJUSTMENT);
        write("website/src/content/references/papers.json", PAPERS);
        write("website/src/content/docs/intro.mdx", &doc(1));

        let config = ContentConfig::defaults_at(&root.path().join("website"));
        let graph = ContentGraph::build(&FsStorage::new(), &CollectionSources::from_config(&config)).unwrap();

        assert_eq!(graph.len(), 10);
        let app = graph.applications().get("adjustment").unwrap();
        assert_eq!(graph.follow(&app.data.code[0]).unwrap().id, "adjustment.py");
    }

    #[test]
    fn test_graph_is_send_sync() {
        static_assertions::assert_impl_all!(ContentGraph: Send, Sync);
    }
}
