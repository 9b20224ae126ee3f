use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use super::wikitext::{bold_terms, redirect_target};
use super::TARGET_ENTITY;
use crate::error::Result;
use crate::record::{Language, Record};
use crate::store::RecordStore;

/// Upper bound on redirect hops followed by the alternate resolver.
const MAX_REDIRECT_HOPS: usize = 8;

/// Finds the counterpart of an origin-language record in the target language.
#[derive(Clone)]
pub struct CrossLingualResolver {
    store: Arc<dyn RecordStore>,
    origin: Language,
    target: Language,
}

impl CrossLingualResolver {
    pub fn new(store: Arc<dyn RecordStore>, origin: Language) -> Self {
        CrossLingualResolver {
            store,
            origin,
            target: origin.counterpart(),
        }
    }

    pub fn origin(&self) -> Language {
        self.origin
    }

    pub fn target(&self) -> Language {
        self.target
    }

    /// Follows a record's redirect directive within `language`. `None` if the record is not a
    /// redirect or its destination does not exist.
    pub async fn follow_redirect(&self, record: &Record, language: Language) -> Result<Option<Record>> {
        match redirect_target(&record.body) {
            Some(destination) => {
                debug!(
                    target: TARGET_ENTITY,
                    "Following redirect '{}' -> '{}' in {}", record.title, destination, language
                );
                self.store.find_by_title(language, &destination).await
            }
            None => Ok(None),
        }
    }

    /// Interlanguage link, else identical title, else the alternate strategies.
    pub async fn resolve_equivalent(&self, record: &Record) -> Result<Option<Record>> {
        if let Some(found) = self.resolve_direct(record).await? {
            return Ok(Some(found));
        }
        self.resolve_alternate(record).await
    }

    /// Lookup by link hint when the record carries one, otherwise by its own title. A redirect
    /// found in the target language is followed once.
    pub async fn resolve_direct(&self, record: &Record) -> Result<Option<Record>> {
        let title = record.cross_link_hint().unwrap_or(record.title.as_str());

        match self.store.find_by_title(self.target, title).await? {
            Some(found) if redirect_target(&found.body).is_some() => {
                self.follow_redirect(&found, self.target).await
            }
            other => Ok(other),
        }
    }

    /// Follows the origin-language redirect chain and tries each hop directly; a record that is not
    /// a redirect is matched through its bold lead terms instead.
    pub async fn resolve_alternate(&self, record: &Record) -> Result<Option<Record>> {
        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(record.key());

        let mut current = record.clone();
        for _ in 0..MAX_REDIRECT_HOPS {
            let destination = match redirect_target(&current.body) {
                Some(destination) => destination,
                None => return self.resolve_by_bold_terms(&current).await,
            };

            if !visited.insert(destination.to_lowercase()) {
                debug!(
                    target: TARGET_ENTITY,
                    "Redirect cycle at '{}' while resolving '{}'", destination, record.title
                );
                return Ok(None);
            }

            current = match self.store.find_by_title(self.origin, &destination).await? {
                Some(next) => next,
                None => return Ok(None),
            };

            if let Some(found) = self.resolve_direct(&current).await? {
                return Ok(Some(found));
            }
        }

        debug!(
            target: TARGET_ENTITY,
            "Redirect chain from '{}' exceeded {} hops", record.title, MAX_REDIRECT_HOPS
        );
        Ok(None)
    }

    async fn resolve_by_bold_terms(&self, record: &Record) -> Result<Option<Record>> {
        for term in bold_terms(&record.body) {
            if let Some(found) = self.store.find_by_title(self.target, &term).await? {
                debug!(
                    target: TARGET_ENTITY,
                    "Resolved '{}' to '{}' through bold term", record.title, found.title
                );
                return Ok(Some(found));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn resolver(store: MemoryStore) -> CrossLingualResolver {
        CrossLingualResolver::new(Arc::new(store), Language::Dutch)
    }

    #[tokio::test]
    async fn test_link_hint_redirect_returns_destination() {
        let store = MemoryStore::new();
        store.insert(Language::English, Record::new(20, "The Hague", "City in Holland"));
        store.insert(Language::English, Record::new(21, "Hague", "#REDIRECT [[The Hague]]"));
        let resolver = resolver(store);

        let record = Record::new(1, "Den Haag", "'''Den Haag''' is een stad.").with_cross_link("Hague");
        let found = resolver.resolve_equivalent(&record).await.unwrap().unwrap();
        assert_eq!(found.id, 20);
        assert_eq!(found.title, "The Hague");
    }

    #[tokio::test]
    async fn test_identical_title_when_no_hint() {
        let store = MemoryStore::new();
        store.insert(Language::English, Record::new(30, "Rembrandt", "Painter"));
        let resolver = resolver(store);

        let record = Record::new(2, "Rembrandt", "Schilder");
        let found = resolver.resolve_equivalent(&record).await.unwrap();
        assert_eq!(found.map(|r| r.id), Some(30));
    }

    #[tokio::test]
    async fn test_redirect_to_missing_destination_is_none() {
        let store = MemoryStore::new();
        store.insert(Language::English, Record::new(31, "Holland", "#REDIRECT [[Nowhere]]"));
        let resolver = resolver(store);

        let record = Record::new(3, "Holland", "Landstreek");
        assert!(resolver.resolve_direct(&record).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_alternate_follows_origin_redirect() {
        let store = MemoryStore::new();
        store.insert(Language::Dutch, Record::new(5, "Vincent van Gogh", "Schilder").with_cross_link("Vincent van Gogh"));
        store.insert(Language::English, Record::new(40, "Vincent van Gogh", "Painter"));
        let resolver = resolver(store);

        let redirect = Record::new(4, "Van Gogh", "#DOORVERWIJZING [[Vincent van Gogh]]");
        let found = resolver.resolve_equivalent(&redirect).await.unwrap();
        assert_eq!(found.map(|r| r.id), Some(40));
    }

    #[tokio::test]
    async fn test_alternate_uses_first_resolvable_bold_term() {
        let store = MemoryStore::new();
        store.insert(Language::English, Record::new(50, "Zuiderzee Works", "Dams"));
        let resolver = resolver(store);

        let record = Record::new(
            6,
            "Zuiderzeewerken",
            "De '''Zuiderzeewerken''' (ook '''Zuiderzee Works''') zijn dammen.",
        );
        let found = resolver.resolve_equivalent(&record).await.unwrap();
        assert_eq!(found.map(|r| r.id), Some(50));
    }

    #[tokio::test]
    async fn test_redirect_cycle_terminates() {
        let store = MemoryStore::new();
        store.insert(Language::Dutch, Record::new(7, "A", "#DOORVERWIJZING [[B]]"));
        store.insert(Language::Dutch, Record::new(8, "B", "#DOORVERWIJZING [[A]]"));
        let resolver = resolver(store);

        let record = Record::new(7, "A", "#DOORVERWIJZING [[B]]");
        assert!(resolver.resolve_equivalent(&record).await.unwrap().is_none());
    }
}
