use async_trait::async_trait;
use dashmap::DashMap;

use super::RecordStore;
use crate::error::Result;
use crate::record::{Language, Record};

/// In-process record store, indexed by id and by exact title.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: DashMap<(Language, i64), Record>,
    titles: DashMap<(Language, String), i64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a record.
    pub fn insert(&self, language: Language, record: Record) {
        if let Some(previous) = self.records.get(&(language, record.id)) {
            self.titles.remove(&(language, previous.title.clone()));
        }
        self.titles
            .insert((language, record.title.clone()), record.id);
        self.records.insert((language, record.id), record);
    }

    pub fn get(&self, language: Language, id: i64) -> Option<Record> {
        self.records
            .get(&(language, id))
            .map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn fetch_by_id(&self, language: Language, id: i64) -> Result<Option<Record>> {
        Ok(self.get(language, id))
    }

    async fn fetch_by_title(&self, language: Language, title: &str) -> Result<Option<Record>> {
        let id = self
            .titles
            .get(&(language, title.to_string()))
            .map(|entry| *entry.value());
        Ok(id.and_then(|id| self.get(language, id)))
    }

    async fn fetch_categories(&self, language: Language, id: i64) -> Result<Vec<String>> {
        Ok(self
            .get(language, id)
            .map(|record| record.categories)
            .unwrap_or_default())
    }

    async fn update_record(&self, language: Language, record: &Record) -> Result<()> {
        if let Some(mut stored) = self.records.get_mut(&(language, record.id)) {
            stored.body = record.body.clone();
            stored.entity_type = record.entity_type;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityType;
    use crate::record::Pair;

    #[tokio::test]
    async fn test_lookup_by_id_and_title() {
        let store = MemoryStore::new();
        store.insert(
            Language::Dutch,
            Record::new(1, "Utrecht", "Stad").with_categories(["Stad in Utrecht"]),
        );
        store.insert(Language::English, Record::new(1, "Utrecht", "City"));

        let dutch = store.fetch_by_id(Language::Dutch, 1).await.unwrap().unwrap();
        assert_eq!(dutch.body, "Stad");
        assert_eq!(
            store.fetch_categories(Language::Dutch, 1).await.unwrap(),
            vec!["Stad in Utrecht"]
        );

        let english = store
            .fetch_by_title(Language::English, "Utrecht")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(english.body, "City");
        assert!(store.fetch_by_title(Language::English, "utrecht").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reinsert_replaces_title_index() {
        let store = MemoryStore::new();
        store.insert(Language::English, Record::new(2, "Old title", "body"));
        store.insert(Language::English, Record::new(2, "New title", "body"));

        assert!(store.fetch_by_title(Language::English, "Old title").await.unwrap().is_none());
        assert!(store.fetch_by_title(Language::English, "New title").await.unwrap().is_some());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_save_pairs_updates_both_languages() {
        let store = MemoryStore::new();
        store.insert(Language::Dutch, Record::new(3, "Rotterdam", "Havenstad"));
        store.insert(Language::English, Record::new(8, "Rotterdam", "Port city"));

        let pair = Pair::new(
            Record::new(3, "Rotterdam", "Havenstad"),
            Some(Record::new(8, "Rotterdam", "Port city")),
        )
        .with_entity_type(Some(EntityType::Location));

        store.save_pairs(Language::Dutch, &[pair]).await.unwrap();

        assert_eq!(
            store.get(Language::Dutch, 3).unwrap().entity_type,
            Some(EntityType::Location)
        );
        assert_eq!(
            store.get(Language::English, 8).unwrap().entity_type,
            Some(EntityType::Location)
        );
    }
}
