//! Recursive category vote.
//!
//! A record's categories are matched against the taxonomy (or the type cache) and tallied. When no
//! type reaches the threshold with a strict lead, the walk ascends to the category pages of the
//! record's categories, one level per recursion, until the depth budget is spent. The tally is
//! shared by the whole walk of one top-level call, so votes gathered lower down count again
//! higher up. A depth-escalation retry starts from an empty tally.

use futures::future::{BoxFuture, FutureExt};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, trace};

use super::cache::TypeCache;
use super::taxonomy::CategoryTaxonomy;
use super::types::{EntityType, TypeTally, TYPE_THRESHOLD};
use super::TARGET_ENTITY;
use crate::error::Result;
use crate::record::{Language, Record};
use crate::store::RecordStore;

/// Depth budget at the start of every top-level call.
pub const INITIAL_DEPTH_BUDGET: u32 = 1;
/// The budget is never raised past this.
pub const MAX_DEPTH_BUDGET: u32 = 3;

/// Per-call state threaded through the recursion.
#[derive(Debug)]
pub struct ClassifyContext {
    depth_budget: u32,
    tally: TypeTally,
    visited: HashSet<i64>,
}

impl Default for ClassifyContext {
    fn default() -> Self {
        ClassifyContext {
            depth_budget: INITIAL_DEPTH_BUDGET,
            tally: TypeTally::default(),
            visited: HashSet::new(),
        }
    }
}

impl ClassifyContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth_budget(&self) -> u32 {
        self.depth_budget
    }

    pub fn tally(&self) -> &TypeTally {
        &self.tally
    }
}

/// Classifies records of one language by their categories.
#[derive(Clone)]
pub struct TypeClassifier {
    store: Arc<dyn RecordStore>,
    taxonomy: Arc<CategoryTaxonomy>,
    cache: TypeCache,
    language: Language,
}

impl TypeClassifier {
    pub fn new(
        store: Arc<dyn RecordStore>,
        taxonomy: Arc<CategoryTaxonomy>,
        cache: TypeCache,
        language: Language,
    ) -> Self {
        TypeClassifier {
            store,
            taxonomy,
            cache,
            language,
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Top-level classification with a fresh context.
    pub async fn classify_record(&self, record: &Record) -> Result<Option<EntityType>> {
        let mut ctx = ClassifyContext::new();
        self.classify(record, 0, true, &mut ctx).await
    }

    pub fn classify<'a>(
        &'a self,
        record: &'a Record,
        depth: u32,
        reset_depth_budget: bool,
        ctx: &'a mut ClassifyContext,
    ) -> BoxFuture<'a, Result<Option<EntityType>>> {
        async move {
            if let Some(cached) = self.cache.get(&record.title) {
                trace!(target: TARGET_ENTITY, "Cache hit for '{}'", record.title);
                return Ok(cached);
            }

            if reset_depth_budget {
                ctx.depth_budget = INITIAL_DEPTH_BUDGET;
            }
            if depth > ctx.depth_budget {
                return Ok(None);
            }
            if depth == 0 {
                ctx.tally.reset();
                ctx.visited.clear();
            }
            if !ctx.visited.insert(record.id) {
                debug!(
                    target: TARGET_ENTITY,
                    "Category cycle at '{}' (id {}), not re-entering", record.title, record.id
                );
                return Ok(None);
            }

            if let Some(decided) = self.vote_categories(record, &mut ctx.tally) {
                debug!(
                    target: TARGET_ENTITY,
                    "'{}' decided as {} at depth {} ({})", record.title, decided, depth, ctx.tally
                );
                return Ok(Some(decided));
            }

            for super_category in self.super_categories(record).await? {
                if ctx.visited.contains(&super_category.id) {
                    continue;
                }
                if let Some(decided) = self
                    .classify(&super_category, depth + 1, false, ctx)
                    .await?
                {
                    self.cache.put(&super_category.title, Some(decided));
                    debug!(
                        target: TARGET_ENTITY,
                        "'{}' decided as {} through '{}'", record.title, decided, super_category.title
                    );
                    return Ok(Some(decided));
                }
            }

            if depth == 0 && ctx.depth_budget < MAX_DEPTH_BUDGET {
                ctx.depth_budget += 1;
                ctx.tally.reset();
                ctx.visited.clear();
                debug!(
                    target: TARGET_ENTITY,
                    "Retrying '{}' with depth budget {}", record.title, ctx.depth_budget
                );
                return self.classify(record, 1, false, ctx).await;
            }

            Ok(None)
        }
        .boxed()
    }

    /// Tallies the record's categories in stored order and stops as soon as one type is decisive.
    pub fn vote_categories(&self, record: &Record, tally: &mut TypeTally) -> Option<EntityType> {
        for category in &record.categories {
            let vote = match self.cache.get(category) {
                Some(cached) => cached,
                None => self.taxonomy.classify_category(category),
            };
            if let Some(entity_type) = vote {
                tally.vote(entity_type);
            }
            if let Some(decided) = tally.decisive(TYPE_THRESHOLD) {
                return Some(decided);
            }
        }
        None
    }

    /// Category pages of the record's categories, deduplicated by id, in category order.
    pub async fn super_categories(&self, record: &Record) -> Result<Vec<Record>> {
        find_category_pages(self.store.as_ref(), self.language, &record.categories).await
    }
}

/// Looks up the category page of each name, dropping missing pages and duplicates.
pub(crate) async fn find_category_pages(
    store: &dyn RecordStore,
    language: Language,
    categories: &[String],
) -> Result<Vec<Record>> {
    let mut seen = HashSet::new();
    let mut pages = Vec::new();
    for category in categories {
        if let Some(page) = store.find_category(language, category).await? {
            if seen.insert(page.id) {
                pages.push(page);
            }
        }
    }
    Ok(pages)
}
