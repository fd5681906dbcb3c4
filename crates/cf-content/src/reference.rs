//! Typed cross-collection references.
//!
//! A [`Ref<T>`] starts out holding only the target id as written in the
//! source. Graph assembly binds it to the target's position in its collection
//! exactly once; afterwards [`crate::ContentGraph::follow`] is an index lookup.

use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::entity::Entity;
use crate::name::CollectionName;

/// Reference to an entry of collection `T::COLLECTION`.
pub struct Ref<T> {
    id: String,
    handle: Option<usize>,
    _target: PhantomData<fn() -> T>,
}

impl<T> Ref<T> {
    /// Create an unbound reference.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            handle: None,
            _target: PhantomData,
        }
    }

    /// Target id as written in the source.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Position of the target in its collection, once bound.
    #[must_use]
    pub fn handle(&self) -> Option<usize> {
        self.handle
    }

    /// Whether graph assembly has bound this reference.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.handle.is_some()
    }
}

impl<T: Entity> Ref<T> {
    /// Binding site for this reference, reported under `field`.
    pub(crate) fn site(&mut self, field: impl Into<String>) -> RefSite<'_> {
        RefSite {
            field: field.into(),
            target: T::COLLECTION,
            id: &self.id,
            handle: &mut self.handle,
        }
    }
}

/// Binding sites for a list field; element `i` is reported as `field[i]`.
pub(crate) fn list_sites<'a, T: Entity>(
    field: &str,
    refs: &'a mut [Ref<T>],
) -> impl Iterator<Item = RefSite<'a>> {
    refs.iter_mut()
        .enumerate()
        .map(move |(index, r)| r.site(format!("{field}[{index}]")))
}

/// A reference field awaiting resolution during graph assembly.
#[derive(Debug)]
pub struct RefSite<'a> {
    /// Field path, e.g. `source` or `code[1]`.
    pub field: String,
    /// Collection the reference points into.
    pub target: CollectionName,
    /// Target id.
    pub id: &'a str,
    pub(crate) handle: &'a mut Option<usize>,
}

impl RefSite<'_> {
    pub(crate) fn bind(&mut self, position: usize) {
        *self.handle = Some(position);
    }
}

// Manual impls: `T` is a marker and need not implement these traits itself.

impl<T> Clone for Ref<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            handle: self.handle,
            _target: PhantomData,
        }
    }
}

impl<T> PartialEq for Ref<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Ref<T> {}

impl<T> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ref")
            .field("id", &self.id)
            .field("handle", &self.handle)
            .finish()
    }
}

impl<T> Serialize for Ref<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.id)
    }
}

impl<'de, T> Deserialize<'de> for Ref<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::entity::{RawCode, RawDocument};

    #[test]
    fn test_deserialize_from_id() {
        let r: Ref<RawDocument> = serde_json::from_str(r#""dsep""#).unwrap();

        assert_eq!(r.id(), "dsep");
        assert!(!r.is_bound());
    }

    #[test]
    fn test_serialize_as_id() {
        let mut r = Ref::<RawDocument>::new("dsep");
        r.site("source").bind(4);

        assert_eq!(serde_json::to_string(&r).unwrap(), r#""dsep""#);
    }

    #[test]
    fn test_site_binds_handle() {
        let mut r = Ref::<RawDocument>::new("dsep");

        let mut site = r.site("source");
        assert_eq!(site.target, CollectionName::RawDocuments);
        assert_eq!(site.id, "dsep");
        site.bind(2);

        assert_eq!(r.handle(), Some(2));
    }

    #[test]
    fn test_list_sites_name_elements() {
        let mut refs = vec![Ref::<RawCode>::new("a.py"), Ref::new("b.R")];

        let fields: Vec<_> = list_sites("code", &mut refs).map(|s| s.field).collect();

        assert_eq!(fields, vec!["code[0]", "code[1]"]);
    }

    #[test]
    fn test_equality_ignores_binding() {
        let mut bound = Ref::<RawDocument>::new("dsep");
        bound.site("source").bind(0);

        assert_eq!(bound, Ref::new("dsep"));
    }
}
