use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use crate::entity::wikitext::{annotate_links, annotate_recurring, is_redirect, linked_entities, ngrams};
use crate::entity::{EntityType, EntityTyper};
use crate::error::Result;
use crate::record::Record;
use crate::{WorkerDetail, TARGET_WORKER};

/// Word counts of the n-grams tried by the second pass.
pub const MIN_NGRAM_SIZE: usize = 2;
pub const MAX_NGRAM_SIZE: usize = 4;

/// What happened to one origin record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Processed and saved; carries the number of entities that received a type.
    Processed { classified: usize },
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotFound,
    Disambiguation,
    Redirect,
}

/// The passes a worker can make over its partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// Types linked entities and their plain-text repeats.
    Links,
    /// Looks for unlinked titles among word n-grams.
    NGrams,
}

impl Pass {
    pub fn worker_name(self) -> &'static str {
        match self {
            Pass::Links => "extraction worker",
            Pass::NGrams => "n-gram worker",
        }
    }

    pub async fn process(
        self,
        typer: &EntityTyper,
        worker_detail: &WorkerDetail,
        id: i64,
    ) -> Result<RecordOutcome> {
        match self {
            Pass::Links => process_record(typer, worker_detail, id).await,
            Pass::NGrams => process_ngrams(typer, worker_detail, id).await,
        }
    }
}

/// Fetches an origin record and decides whether a pass should skip it.
async fn origin_record(
    typer: &EntityTyper,
    worker_detail: &WorkerDetail,
    id: i64,
) -> Result<std::result::Result<Record, SkipReason>> {
    let record = match typer.store().find_by_id(typer.origin(), id).await? {
        Some(record) => record,
        None => {
            debug!(target: TARGET_WORKER, "[{} {}]: id {} unavailable.", worker_detail.name, worker_detail.id, id);
            return Ok(Err(SkipReason::NotFound));
        }
    };
    if record.is_disambiguation {
        info!(target: TARGET_WORKER, "[{} {}]: '{}' ({}) is a disambiguation page, skipping.", worker_detail.name, worker_detail.id, record.title, id);
        return Ok(Err(SkipReason::Disambiguation));
    }
    if is_redirect(&record.body) {
        info!(target: TARGET_WORKER, "[{} {}]: '{}' ({}) is a redirect, skipping.", worker_detail.name, worker_detail.id, record.title, id);
        return Ok(Err(SkipReason::Redirect));
    }
    Ok(Ok(record))
}

/// Classifies every entity linked from one origin record, annotates its body and saves the
/// record together with the pairs it produced. Plain-text repeats of typed titles are annotated
/// as well.
pub async fn process_record(
    typer: &EntityTyper,
    worker_detail: &WorkerDetail,
    id: i64,
) -> Result<RecordOutcome> {
    let origin = typer.origin();
    let store = typer.store();

    let mut record = match origin_record(typer, worker_detail, id).await? {
        Ok(record) => record,
        Err(reason) => return Ok(RecordOutcome::Skipped(reason)),
    };

    let (articles, mention_titles) = linked_articles(typer, &record).await?;

    let mut pairs = Vec::with_capacity(articles.len());
    for article in articles {
        let pair = typer.pair_for(article).await?;
        pairs.push(typer.resolve_pair(pair).await?);
    }

    let types: HashMap<String, Option<EntityType>> = pairs
        .iter()
        .map(|pair| (pair.origin().key(), pair.entity_type()))
        .collect();
    let classified = types.values().filter(|t| t.is_some()).count();

    let cache = typer.cache();
    let type_of = |target: &str| {
        let key = target.to_lowercase();
        let title = mention_titles.get(&key).unwrap_or(&key);
        types
            .get(title)
            .copied()
            .flatten()
            .or_else(|| cache.get_type(target))
    };

    let mut recurring: Vec<(String, EntityType)> = linked_entities(&record.body)
        .into_iter()
        .filter_map(|target| type_of(target.as_str()).map(|entity_type| (target, entity_type)))
        .collect();
    recurring.extend(pairs.iter().filter_map(|pair| {
        pair.entity_type()
            .map(|entity_type| (pair.origin().title.clone(), entity_type))
    }));

    let linked = annotate_links(&record.body, &type_of);
    record.body = annotate_recurring(&linked, &recurring);

    store.update_record(origin, &record).await?;
    store.save_pairs(origin, &pairs).await?;

    debug!(
        target: TARGET_WORKER,
        "[{} {}]: '{}' saved with {} of {} linked entities typed.",
        worker_detail.name, worker_detail.id, record.title, classified, pairs.len()
    );
    Ok(RecordOutcome::Processed { classified })
}

/// Second pass over one origin record: unlinked word n-grams naming an origin record with a
/// counterpart are classified and annotated in place. The record is only written when something
/// was typed.
pub async fn process_ngrams(
    typer: &EntityTyper,
    worker_detail: &WorkerDetail,
    id: i64,
) -> Result<RecordOutcome> {
    let origin = typer.origin();
    let store = typer.store();

    let mut record = match origin_record(typer, worker_detail, id).await? {
        Ok(record) => record,
        Err(reason) => return Ok(RecordOutcome::Skipped(reason)),
    };

    let mut tried = HashSet::new();
    let mut typed: Vec<(String, EntityType)> = Vec::new();
    let mut pairs = Vec::new();

    for size in MIN_NGRAM_SIZE..=MAX_NGRAM_SIZE {
        for gram in ngrams(&record.body, size) {
            if !tried.insert(gram.to_lowercase()) {
                continue;
            }
            if let Some(cached) = typer.cache().get(&gram) {
                if let Some(entity_type) = cached {
                    typed.push((gram, entity_type));
                }
                continue;
            }

            let article = match find_article(typer, &gram).await? {
                Some(article) => article,
                None => continue,
            };
            let pair = typer.pair_for(article).await?;
            if pair.counterpart().is_none() {
                continue;
            }
            let pair = typer.resolve_pair(pair).await?;
            if let Some(entity_type) = pair.entity_type() {
                typed.push((gram, entity_type));
                pairs.push(pair);
            }
        }
    }

    let classified = typed.len();
    if classified > 0 {
        record.body = annotate_recurring(&record.body, &typed);
        store.update_record(origin, &record).await?;
        store.save_pairs(origin, &pairs).await?;
    }

    debug!(
        target: TARGET_WORKER,
        "[{} {}]: '{}' has {} n-gram entities typed.",
        worker_detail.name, worker_detail.id, record.title, classified
    );
    Ok(RecordOutcome::Processed { classified })
}

/// Origin record titled `title`, with a redirect followed once.
async fn find_article(typer: &EntityTyper, title: &str) -> Result<Option<Record>> {
    let origin = typer.origin();
    let article = match typer.store().find_by_title(origin, title).await? {
        Some(article) => article,
        None => return Ok(None),
    };
    if is_redirect(&article.body) {
        return typer.resolver().follow_redirect(&article, origin).await;
    }
    Ok(Some(article))
}

/// Origin records of the uncached mentions in `record`, with redirects followed, deduplicated by
/// id. Also returns the lower-cased mention to lower-cased article title mapping.
async fn linked_articles(
    typer: &EntityTyper,
    record: &Record,
) -> Result<(Vec<Record>, HashMap<String, String>)> {
    let mut seen = HashSet::new();
    let mut articles = Vec::new();
    let mut mention_titles = HashMap::new();

    for mention in linked_entities(&record.body) {
        if typer.cache().contains_key(&mention) {
            continue;
        }
        let article = match find_article(typer, &mention).await? {
            Some(article) => article,
            None => continue,
        };

        mention_titles.insert(mention.to_lowercase(), article.key());
        if seen.insert(article.id) {
            articles.push(article);
        }
    }

    Ok((articles, mention_titles))
}
