//! Immutable, id-indexed collections of entries.

use std::collections::HashMap;
use std::collections::hash_map::Entry as MapEntry;
use std::path::PathBuf;

use crate::entity::Entity;
use crate::error::ContentError;
use crate::name::CollectionName;

/// One loaded entry of a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<T> {
    /// Unique id within the collection.
    pub id: String,
    /// Typed payload.
    pub data: T,
    /// Unparsed markup body, for markup-backed collections.
    pub body: Option<String>,
    /// Source file the entry was read from.
    pub path: PathBuf,
}

/// A named collection of entries, sorted by id.
#[derive(Debug, Clone)]
pub struct Collection<T> {
    entries: Vec<Entry<T>>,
    index: HashMap<String, usize>,
}

impl<T: Entity> Collection<T> {
    /// Build a collection, rejecting duplicate ids.
    ///
    /// Entries are reordered by id; `first` in a [`ContentError::DuplicateId`]
    /// is whichever colliding entry came first in `entries`.
    pub fn from_entries(mut entries: Vec<Entry<T>>) -> Result<Self, ContentError> {
        let mut seen: HashMap<&str, usize> = HashMap::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            match seen.entry(entry.id.as_str()) {
                MapEntry::Occupied(first) => {
                    return Err(ContentError::DuplicateId {
                        collection: T::COLLECTION,
                        id: entry.id.clone(),
                        first: entries[*first.get()].path.display().to_string(),
                        second: entry.path.display().to_string(),
                    });
                }
                MapEntry::Vacant(slot) => {
                    slot.insert(position);
                }
            }
        }

        entries.sort_by(|a, b| a.id.cmp(&b.id));
        let index = entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (entry.id.clone(), position))
            .collect();

        Ok(Self { entries, index })
    }

    /// Collection name.
    #[must_use]
    pub fn name(&self) -> CollectionName {
        T::COLLECTION
    }

    /// Look up an entry by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Entry<T>> {
        self.position(id).and_then(|position| self.entries.get(position))
    }

    /// Position of an id in sorted order.
    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Entry at a position.
    #[must_use]
    pub fn get_index(&self, position: usize) -> Option<&Entry<T>> {
        self.entries.get(position)
    }

    /// Whether an id is present.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Entries in id order.
    pub fn iter(&self) -> std::slice::Iter<'_, Entry<T>> {
        self.entries.iter()
    }

    /// Ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.id.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries ordered by their `number` field, for navigation.
    ///
    /// Entries without a number sort last, by id.
    #[must_use]
    pub fn sorted_by_number(&self) -> Vec<&Entry<T>> {
        let mut sorted: Vec<&Entry<T>> = self.entries.iter().collect();
        sorted.sort_by_key(|entry| (entry.data.number().is_none(), entry.data.number()));
        sorted
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [Entry<T>] {
        &mut self.entries
    }

    pub(crate) fn id_index(&self) -> &HashMap<String, usize> {
        &self.index
    }
}

impl<'a, T> IntoIterator for &'a Collection<T> {
    type Item = &'a Entry<T>;
    type IntoIter = std::slice::Iter<'a, Entry<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
