//! Id-to-key lookup built while fetching a project.

use catsync_types::{Category, Key, Reference, ReferenceTypeId, ResourceId};
use std::collections::HashMap;

/// Maps `(typeId, id)` of every resource observed during a fetch to its key.
///
/// Populated from the fetched categories themselves and from every expanded
/// reference target, so the rewriter never needs another round-trip.
#[derive(Debug, Clone, Default)]
pub struct KeyLookup {
    keys: HashMap<(ReferenceTypeId, ResourceId), Key>,
}

impl KeyLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a lookup from a full listing.
    pub fn from_categories<'a>(categories: impl IntoIterator<Item = &'a Category>) -> Self {
        let mut lookup = Self::new();
        for category in categories {
            lookup.observe(category);
        }
        lookup
    }

    /// Records a category and every expanded reference it holds.
    pub fn observe(&mut self, category: &Category) {
        if let Some(key) = &category.key {
            self.insert(ReferenceTypeId::Category, category.id, key.clone());
        }
        if let Some(parent) = &category.parent {
            self.observe_reference(parent);
        }
        if let Some(custom) = &category.custom {
            self.observe_reference(&custom.type_ref);
        }
    }

    fn observe_reference(&mut self, reference: &Reference) {
        if let Some(key) = reference.expanded_key() {
            self.insert(reference.type_id, reference.id, key.clone());
        }
    }

    pub fn insert(&mut self, type_id: ReferenceTypeId, id: ResourceId, key: Key) {
        self.keys.insert((type_id, id), key);
    }

    /// The key of the resource a reference points at.
    pub fn resolve<'a>(&'a self, reference: &'a Reference) -> Option<&'a Key> {
        reference
            .expanded_key()
            .or_else(move || self.get(reference.type_id, reference.id))
    }

    pub fn get(&self, type_id: ReferenceTypeId, id: ResourceId) -> Option<&Key> {
        self.keys.get(&(type_id, id))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
