use std::sync::Arc;
use tracing::debug;

use super::cache::TypeCache;
use super::classifier::TypeClassifier;
use super::resolver::CrossLingualResolver;
use super::taxonomy::CategoryTaxonomy;
use super::types::EntityType;
use super::TARGET_ENTITY;
use crate::error::Result;
use crate::record::{Language, Pair, Record};
use crate::store::RecordStore;

/// Everything one worker needs to classify origin-language records.
///
/// Owns no mutable state of its own: per-call state lives in the classifier's context and the
/// shared cache is the only thing written across calls.
#[derive(Clone)]
pub struct EntityTyper {
    pub(super) store: Arc<dyn RecordStore>,
    pub(super) cache: TypeCache,
    pub(super) origin_classifier: TypeClassifier,
    pub(super) target_classifier: TypeClassifier,
    pub(super) resolver: CrossLingualResolver,
}

impl EntityTyper {
    pub fn new(
        store: Arc<dyn RecordStore>,
        taxonomy: Arc<CategoryTaxonomy>,
        cache: TypeCache,
        origin: Language,
    ) -> Self {
        let origin_classifier =
            TypeClassifier::new(store.clone(), taxonomy.clone(), cache.clone(), origin);
        let target_classifier =
            TypeClassifier::new(store.clone(), taxonomy, cache.clone(), origin.counterpart());
        let resolver = CrossLingualResolver::new(store.clone(), origin);

        EntityTyper {
            store,
            cache,
            origin_classifier,
            target_classifier,
            resolver,
        }
    }

    pub fn origin(&self) -> Language {
        self.resolver.origin()
    }

    pub fn target(&self) -> Language {
        self.resolver.target()
    }

    pub fn cache(&self) -> &TypeCache {
        &self.cache
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub fn resolver(&self) -> &CrossLingualResolver {
        &self.resolver
    }

    /// Classifier over target-language records.
    pub fn target_classifier(&self) -> &TypeClassifier {
        &self.target_classifier
    }

    /// Builds the pair for an origin record. Disambiguation records get no counterpart.
    pub async fn pair_for(&self, record: Record) -> Result<Pair> {
        if record.is_disambiguation {
            return Ok(Pair::new(record, None));
        }
        let counterpart = self.resolver.resolve_equivalent(&record).await?;
        Ok(Pair::new(record, counterpart))
    }

    /// Decides a pair's type: the counterpart's categories first, then the disambiguation vote
    /// for disambiguation records, then the origin-language category fallback.
    pub async fn classify_pair(&self, pair: &Pair) -> Result<Option<EntityType>> {
        if let Some(counterpart) = pair.counterpart() {
            if counterpart.entity_type.is_some() {
                return Ok(counterpart.entity_type);
            }
            if let Some(decided) = self.target_classifier.classify_record(counterpart).await? {
                return Ok(Some(decided));
            }
            debug!(
                target: TARGET_ENTITY,
                "No type from counterpart '{}' of '{}'", counterpart.title, pair.origin().title
            );
        }

        let origin = pair.origin();
        if origin.is_disambiguation {
            return self.classify_disambiguation(origin).await;
        }
        self.classify_by_origin_language_categories(origin).await
    }

    /// Classifies the pair, applies the type to both halves and caches it under both titles.
    pub async fn resolve_pair(&self, pair: Pair) -> Result<Pair> {
        let entity_type = self.classify_pair(&pair).await?;
        if let Some(decided) = entity_type {
            self.cache.put(&pair.origin().title, Some(decided));
            if let Some(counterpart) = pair.counterpart() {
                self.cache.put(&counterpart.title, Some(decided));
            }
        }
        Ok(pair.with_entity_type(entity_type))
    }
}
