use std::collections::HashMap;

use crate::model::{CatalogItem, SizeKey};
use crate::normalizer::{decompose_id, normalize_id};

/// Normalized id -> item. Built per load cycle and replaced as a whole.
#[derive(Debug, Clone, Default)]
pub struct ItemIndex {
    items: HashMap<String, CatalogItem>,
}

/// An index hit together with the size key recovered from the requested id, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved<'a> {
    pub item: &'a CatalogItem,
    pub size: Option<SizeKey>,
}

impl ItemIndex {
    /// Items without an id are left out. A later row with the same id replaces an earlier one.
    pub fn build(items: &[CatalogItem]) -> Self {
        let mut map = HashMap::with_capacity(items.len());
        for item in items {
            let key = normalize_id(&item.id);
            if key.is_empty() {
                continue;
            }
            map.insert(key, item.clone());
        }
        Self { items: map }
    }

    /// Left-biased union: entries already in `self` are never overwritten.
    pub fn merge(mut self, secondary: ItemIndex) -> Self {
        for (key, item) in secondary.items {
            self.items.entry(key).or_insert(item);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, normalized_id: &str) -> Option<&CatalogItem> {
        self.items.get(normalized_id)
    }

    /// Exact match on the normalized id first, then on its base id with the size suffix split off.
    pub fn resolve(&self, raw_id: &str) -> Option<Resolved<'_>> {
        let normalized = normalize_id(raw_id);
        if normalized.is_empty() {
            return None;
        }
        if let Some(item) = self.items.get(&normalized) {
            return Some(Resolved { item, size: None });
        }
        let id = decompose_id(&normalized);
        let size = id.size?;
        self.items
            .get(&id.base)
            .map(|item| Resolved { item, size: Some(size) })
    }
}
