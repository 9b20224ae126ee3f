//! Process-wide memo of inferred types.
//!
//! Titles and category names share one key space: a category and an article with the same
//! lower-cased name are treated as the same classification subject. A stored `None` records that
//! the subject was examined and no type could be found, so it is not derived again.
//!
//! Individual operations are atomic. There is no atomicity across operations: two workers may
//! both miss, both compute, and both write. Writers from the same vote agree, so last write wins.

use dashmap::DashMap;
use std::sync::Arc;

use super::types::EntityType;

#[derive(Clone, Debug, Default)]
pub struct TypeCache {
    entries: Arc<DashMap<String, Option<EntityType>>>,
}

impl TypeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        TypeCache {
            entries: Arc::new(DashMap::with_capacity(capacity)),
        }
    }

    /// `None` on a miss, `Some(None)` for a cached absence, `Some(Some(t))` for a cached type.
    pub fn get(&self, key: &str) -> Option<Option<EntityType>> {
        self.entries
            .get(&normalize_key(key))
            .map(|entry| *entry.value())
    }

    /// Cached type for `key`, treating misses and cached absences alike.
    pub fn get_type(&self, key: &str) -> Option<EntityType> {
        self.get(key).flatten()
    }

    pub fn put(&self, key: &str, entity_type: Option<EntityType>) {
        self.entries.insert(normalize_key(key), entity_type);
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&normalize_key(key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}
