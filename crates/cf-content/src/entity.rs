//! Entity types of the six content collections.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::collection::Collection;
use crate::graph::ContentGraph;
use crate::name::CollectionName;
use crate::reference::{Ref, RefSite, list_sites};
use crate::schema::{FieldSpec, FieldType};

/// A typed entry payload of one collection.
///
/// The schema is checked before deserialization; reference fields are
/// exposed through [`Entity::ref_sites`] so graph assembly can bind them.
pub trait Entity: DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection this entity type belongs to.
    const COLLECTION: CollectionName;

    /// Fields checked before deserialization.
    const SCHEMA: &'static [FieldSpec];

    /// Reference fields of this entity, in declaration order.
    fn ref_sites(&mut self) -> Vec<RefSite<'_>> {
        Vec::new()
    }

    /// Ordering key, for collections that have one.
    fn number(&self) -> Option<i64> {
        None
    }

    /// This entity's collection inside a built graph.
    fn collection_in(graph: &ContentGraph) -> &Collection<Self>;
}

/// A rule-table definition read verbatim from a `.txt` file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDocument {
    /// File contents.
    pub raw: String,
}

impl Entity for RawDocument {
    const COLLECTION: CollectionName = CollectionName::RawDocuments;
    const SCHEMA: &'static [FieldSpec] = &[FieldSpec::required("raw", FieldType::Text)];

    fn collection_in(graph: &ContentGraph) -> &Collection<Self> {
        graph.raw_documents()
    }
}

/// A rule-table page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTable {
    pub title: String,
    pub description: String,
    /// The rule-table definition this page documents.
    pub source: Ref<RawDocument>,
    pub graph: String,
    pub references: Vec<Ref<Reference>>,
}

impl Entity for RuleTable {
    const COLLECTION: CollectionName = CollectionName::RuleTables;
    const SCHEMA: &'static [FieldSpec] = &[
        FieldSpec::required("title", FieldType::Text),
        FieldSpec::required("description", FieldType::Text),
        FieldSpec::required("source", FieldType::Reference(CollectionName::RawDocuments)),
        FieldSpec::required("graph", FieldType::Text),
        FieldSpec::required(
            "references",
            FieldType::ReferenceList(CollectionName::References),
        ),
    ];

    fn ref_sites(&mut self) -> Vec<RefSite<'_>> {
        let mut sites = vec![self.source.site("source")];
        sites.extend(list_sites("references", &mut self.references));
        sites
    }

    fn collection_in(graph: &ContentGraph) -> &Collection<Self> {
        graph.rule_tables()
    }
}

/// An example script read verbatim; the id keeps its extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCode {
    /// File contents.
    pub raw: String,
}

impl Entity for RawCode {
    const COLLECTION: CollectionName = CollectionName::RawCode;
    const SCHEMA: &'static [FieldSpec] = &[FieldSpec::required("raw", FieldType::Text)];

    fn collection_in(graph: &ContentGraph) -> &Collection<Self> {
        graph.raw_code()
    }
}

/// An application page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub title: String,
    pub short_title: String,
    pub summary: String,
    pub description: String,
    /// Example scripts, in display order.
    pub code: Vec<Ref<RawCode>>,
    /// Rule tables used by the application.
    pub ruletables: Vec<Ref<RawDocument>>,
    pub graph: String,
    pub references: Vec<Ref<Reference>>,
    /// Navigation order; unique within the collection.
    pub number: i64,
}

impl Entity for Application {
    const COLLECTION: CollectionName = CollectionName::Applications;
    const SCHEMA: &'static [FieldSpec] = &[
        FieldSpec::required("title", FieldType::Text),
        FieldSpec::required("shortTitle", FieldType::Text),
        FieldSpec::required("summary", FieldType::Text),
        FieldSpec::required("description", FieldType::Text),
        FieldSpec::required("code", FieldType::ReferenceList(CollectionName::RawCode)),
        FieldSpec::required(
            "ruletables",
            FieldType::ReferenceList(CollectionName::RawDocuments),
        ),
        FieldSpec::required("graph", FieldType::Text),
        FieldSpec::required(
            "references",
            FieldType::ReferenceList(CollectionName::References),
        ),
        FieldSpec::required("number", FieldType::Integer),
    ];

    fn ref_sites(&mut self) -> Vec<RefSite<'_>> {
        list_sites("code", &mut self.code)
            .chain(list_sites("ruletables", &mut self.ruletables))
            .chain(list_sites("references", &mut self.references))
            .collect()
    }

    fn number(&self) -> Option<i64> {
        Some(self.number)
    }

    fn collection_in(graph: &ContentGraph) -> &Collection<Self> {
        graph.applications()
    }
}

/// A bibliography entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// Author names, in citation order.
    pub authors: Vec<String>,
    pub title: String,
    /// Publication year as written (may be e.g. "2025+").
    pub year: String,
    pub venue: String,
    pub url: String,
}

impl Entity for Reference {
    const COLLECTION: CollectionName = CollectionName::References;
    const SCHEMA: &'static [FieldSpec] = &[
        FieldSpec::required("authors", FieldType::TextList),
        FieldSpec::required("title", FieldType::Text),
        FieldSpec::required("year", FieldType::Text),
        FieldSpec::required("venue", FieldType::Text),
        FieldSpec::required("url", FieldType::Text),
    ];

    fn collection_in(graph: &ContentGraph) -> &Collection<Self> {
        graph.references()
    }
}

/// A documentation page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Doc {
    pub title: String,
    pub short_title: String,
    pub summary: String,
    pub description: String,
    /// Navigation order; unique within the collection.
    pub number: i64,
}

impl Entity for Doc {
    const COLLECTION: CollectionName = CollectionName::Docs;
    const SCHEMA: &'static [FieldSpec] = &[
        FieldSpec::required("title", FieldType::Text),
        FieldSpec::required("shortTitle", FieldType::Text),
        FieldSpec::required("summary", FieldType::Text),
        FieldSpec::required("description", FieldType::Text),
        FieldSpec::required("number", FieldType::Integer),
    ];

    fn number(&self) -> Option<i64> {
        Some(self.number)
    }

    fn collection_in(graph: &ContentGraph) -> &Collection<Self> {
        graph.docs()
    }
}
