use std::collections::HashSet;
use tracing::{debug, trace};

use super::classifier::find_category_pages;
use super::typer::EntityTyper;
use super::types::{EntityType, TypeTally};
use super::wikitext::linked_entities;
use super::TARGET_ENTITY;
use crate::error::Result;
use crate::record::Record;

/// Rounds of category ascent tried before giving up on the origin-language fallback.
pub const MAX_FALLBACK_ROUNDS: usize = 3;

impl EntityTyper {
    /// Plurality vote over the entities linked from a disambiguation record.
    pub async fn classify_disambiguation(&self, record: &Record) -> Result<Option<EntityType>> {
        if let Some(cached) = self.cache.get(&record.title) {
            return Ok(cached);
        }

        let tally = self.disambiguation_tally(record).await?;
        let decided = tally.leader();
        debug!(
            target: TARGET_ENTITY,
            "Disambiguation '{}' voted {:?} ({})", record.title, decided, tally
        );
        Ok(decided)
    }

    /// One vote per linked entity that is cached or classifiable in the origin language.
    pub async fn disambiguation_tally(&self, record: &Record) -> Result<TypeTally> {
        let mut tally = TypeTally::new();

        for entity in linked_entities(&record.body) {
            if let Some(cached) = self.cache.get(&entity) {
                if let Some(entity_type) = cached {
                    tally.vote(entity_type);
                }
                continue;
            }

            let linked = match self.store.find_by_title(self.origin(), &entity).await? {
                Some(linked) => linked,
                None => {
                    trace!(target: TARGET_ENTITY, "Linked entity '{}' not found", entity);
                    continue;
                }
            };

            if let Some(entity_type) = self.origin_classifier.classify_record(&linked).await? {
                self.cache.put(&entity, Some(entity_type));
                tally.vote(entity_type);
            }
        }

        Ok(tally)
    }

    /// Used when a record has no counterpart: its categories are mapped to their counterparts
    /// and those are classified instead.
    pub async fn classify_by_origin_language_categories(
        &self,
        record: &Record,
    ) -> Result<Option<EntityType>> {
        let tally = self.origin_category_tally(record).await?;
        let decided = tally.leader();
        debug!(
            target: TARGET_ENTITY,
            "Origin-language categories of '{}' voted {:?} ({})", record.title, decided, tally
        );
        Ok(decided)
    }

    pub async fn origin_category_tally(&self, record: &Record) -> Result<TypeTally> {
        let store = self.store.as_ref();
        let origin = self.origin();

        let mut working_set = record.categories.clone();
        let mut seen_pages: HashSet<i64> = HashSet::new();
        let mut cached_categories: Vec<String> = Vec::new();
        let mut counterparts: Vec<Record> = Vec::new();
        let mut seen_counterparts: HashSet<i64> = HashSet::new();

        for round in 0..MAX_FALLBACK_ROUNDS {
            let mut uncached = Vec::new();
            for category in working_set.drain(..) {
                if self.cache.contains_key(&category) {
                    cached_categories.push(category);
                } else {
                    uncached.push(category);
                }
            }

            let fresh: Vec<Record> = find_category_pages(store, origin, &uncached)
                .await?
                .into_iter()
                .filter(|page| seen_pages.insert(page.id))
                .collect();

            for page in &fresh {
                if let Some(counterpart) = self.resolver.resolve_equivalent(page).await? {
                    if seen_counterparts.insert(counterpart.id) {
                        counterparts.push(counterpart);
                    }
                }
            }

            if !counterparts.is_empty() || !cached_categories.is_empty() {
                break;
            }

            let mut next = Vec::new();
            for page in &fresh {
                for super_category in find_category_pages(store, origin, &page.categories).await? {
                    for category in super_category.categories {
                        if !next.contains(&category) {
                            next.push(category);
                        }
                    }
                }
            }
            if next.is_empty() {
                trace!(
                    target: TARGET_ENTITY,
                    "Category ascent for '{}' exhausted after round {}", record.title, round + 1
                );
                break;
            }
            working_set = next;
        }

        let mut tally = TypeTally::new();
        for counterpart in &counterparts {
            if let Some(entity_type) = self.target_classifier.classify_record(counterpart).await? {
                self.cache.put(&counterpart.title, Some(entity_type));
                tally.vote(entity_type);
            }
        }
        for category in &cached_categories {
            if let Some(entity_type) = self.cache.get_type(category) {
                tally.vote(entity_type);
            }
        }

        Ok(tally)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{CategoryTaxonomy, TypeCache};
    use crate::record::Language;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn taxonomy() -> Arc<CategoryTaxonomy> {
        Arc::new(CategoryTaxonomy::from_pairs([
            ("kunstschilder", "PERSON"),
            ("^persoon", "PERSON"),
            ("poets", "PERSON"),
            ("writers", "PERSON"),
        ]))
    }

    fn typer(store: MemoryStore, cache: TypeCache) -> EntityTyper {
        EntityTyper::new(Arc::new(store), taxonomy(), cache, Language::Dutch)
    }

    fn painter(id: i64, title: &str) -> Record {
        Record::new(id, title, "Schilder").with_categories([
            "Nederlands kunstschilder",
            "Persoon in de 17e eeuw",
            "Kunstschilder in de Gouden Eeuw",
        ])
    }

    #[tokio::test]
    async fn test_disambiguation_plurality_of_linked_entities() {
        let store = MemoryStore::new();
        store.insert(Language::Dutch, painter(1, "Jan Steen"));
        store.insert(Language::Dutch, painter(2, "Jan van Goyen"));
        let cache = TypeCache::new();
        cache.put("Steen (gesteente)", Some(EntityType::Misc));
        let typer = typer(store, cache.clone());

        let page = Record::new(
            10,
            "Jan",
            "* [[Jan Steen]]\n* [[Jan van Goyen|Van Goyen]]\n* [[Steen (gesteente)]]\n* [[Onbekende Jan]]",
        )
        .as_disambiguation();

        let tally = typer.disambiguation_tally(&page).await.unwrap();
        assert_eq!(tally.person, 2);
        assert_eq!(tally.misc, 1);
        assert_eq!(tally.total(), 3);

        assert_eq!(
            typer.classify_disambiguation(&page).await.unwrap(),
            Some(EntityType::Person)
        );
        assert_eq!(cache.get_type("jan steen"), Some(EntityType::Person));
    }

    #[tokio::test]
    async fn test_disambiguation_tie_is_undetermined() {
        let cache = TypeCache::new();
        cache.put("Oranje (kleur)", Some(EntityType::Misc));
        cache.put("Oranje (rivier)", Some(EntityType::Location));
        let typer = typer(MemoryStore::new(), cache);

        let page = Record::new(11, "Oranje", "[[Oranje (kleur)]] [[Oranje (rivier)]]").as_disambiguation();
        assert_eq!(typer.classify_disambiguation(&page).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_disambiguation_cached_title_short_circuits() {
        let cache = TypeCache::new();
        cache.put("Mercurius", Some(EntityType::Misc));
        let typer = typer(MemoryStore::new(), cache);

        let page = Record::new(12, "Mercurius", "[[Freddie Mercury]]").as_disambiguation();
        assert_eq!(
            typer.classify_disambiguation(&page).await.unwrap(),
            Some(EntityType::Misc)
        );
    }

    #[tokio::test]
    async fn test_origin_categories_resolved_through_counterparts() {
        let store = MemoryStore::new();
        store.insert(
            Language::Dutch,
            Record::new(20, "Categorie:Nederlands dichter", "Dichters uit Nederland")
                .with_cross_link("Category:Dutch poets"),
        );
        store.insert(
            Language::English,
            Record::new(200, "Category:Dutch poets", "Poets from the Netherlands").with_categories([
                "Dutch poets",
                "Poets by nationality",
                "Dutch writers",
            ]),
        );
        let cache = TypeCache::new();
        let typer = typer(store, cache.clone());

        let record = Record::new(21, "Joost van den Vondel", "Dichter").with_categories(["Nederlands dichter"]);
        assert_eq!(
            typer.classify_by_origin_language_categories(&record).await.unwrap(),
            Some(EntityType::Person)
        );
        assert_eq!(cache.get_type("Category:Dutch poets"), Some(EntityType::Person));
    }

    #[tokio::test]
    async fn test_origin_categories_ascend_when_nothing_resolves() {
        let store = MemoryStore::new();
        store.insert(
            Language::Dutch,
            Record::new(30, "Categorie:Vondel", "Over Vondel").with_categories(["Nederlands toneelschrijver"]),
        );
        store.insert(
            Language::Dutch,
            Record::new(31, "Categorie:Nederlands toneelschrijver", "Toneelschrijvers")
                .with_categories(["Nederlands dichter"]),
        );
        store.insert(
            Language::Dutch,
            Record::new(32, "Categorie:Nederlands dichter", "Dichters").with_cross_link("Category:Dutch poets"),
        );
        store.insert(
            Language::English,
            Record::new(300, "Category:Dutch poets", "Poets").with_categories([
                "Dutch poets",
                "Poets by nationality",
                "Dutch writers",
            ]),
        );
        let typer = typer(store, TypeCache::new());

        let record = Record::new(33, "Gijsbrecht van Aemstel", "Treurspel").with_categories(["Vondel"]);
        let tally = typer.origin_category_tally(&record).await.unwrap();
        assert_eq!(tally.person, 1);
        assert_eq!(tally.leader(), Some(EntityType::Person));
    }

    #[tokio::test]
    async fn test_origin_categories_use_cached_votes() {
        let cache = TypeCache::new();
        cache.put("Nederlands dichter", Some(EntityType::Person));
        cache.put("Lege categorie", None);
        let typer = typer(MemoryStore::new(), cache);

        let record = Record::new(40, "Hooft", "Dichter").with_categories(["Nederlands dichter", "Lege categorie"]);
        let tally = typer.origin_category_tally(&record).await.unwrap();
        assert_eq!(tally.person, 1);
        assert_eq!(tally.total(), 1);
    }

    #[tokio::test]
    async fn test_origin_categories_tie_is_undetermined() {
        let cache = TypeCache::new();
        cache.put("Nederlands dichter", Some(EntityType::Person));
        cache.put("Vlaams schrijver", Some(EntityType::Person));
        cache.put("Uitgeverij", Some(EntityType::Organization));
        cache.put("Drukkerij", Some(EntityType::Organization));
        let typer = typer(MemoryStore::new(), cache);

        let record = Record::new(41, "Elsevier", "Uitgever").with_categories([
            "Nederlands dichter",
            "Vlaams schrijver",
            "Uitgeverij",
            "Drukkerij",
        ]);
        let tally = typer.origin_category_tally(&record).await.unwrap();
        assert_eq!(tally.person, 2);
        assert_eq!(tally.organization, 2);
        assert_eq!(
            typer.classify_by_origin_language_categories(&record).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_no_categories_yields_empty_tally() {
        let typer = typer(MemoryStore::new(), TypeCache::new());
        let record = Record::new(42, "Niets", "Leeg artikel");
        assert_eq!(typer.origin_category_tally(&record).await.unwrap().total(), 0);
    }
}
