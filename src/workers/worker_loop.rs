use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{error, info, warn};

use super::common::{partition_ids, ExtractionStats};
use super::extraction::{Pass, RecordOutcome};
use crate::config::ExtractionConfig;
use crate::entity::{CategoryTaxonomy, EntityTyper, TypeCache};
use crate::store::RecordStore;
use crate::{WorkerDetail, TARGET_WORKER};

/// Makes one pass over every id of one worker's partition in ascending order. A failing record is
/// logged and counted; it never stops the loop.
pub async fn extraction_loop(
    worker_detail: WorkerDetail,
    typer: EntityTyper,
    pass: Pass,
    start_id: i64,
    end_id: i64,
    workers: usize,
) -> ExtractionStats {
    let mut stats = ExtractionStats::default();
    let started = Instant::now();

    info!(target: TARGET_WORKER, "[{} {}]: starting extraction_loop over ({}, {}] in {}.", worker_detail.name, worker_detail.id, start_id, end_id, typer.origin());

    for id in partition_ids(start_id, end_id, worker_detail.id as usize, workers) {
        match pass.process(&typer, &worker_detail, id).await {
            Ok(RecordOutcome::Processed { classified }) => match pass {
                Pass::Links => {
                    stats.processed += 1;
                    stats.classified += classified as u64;
                }
                Pass::NGrams => stats.ngram_classified += classified as u64,
            },
            Ok(RecordOutcome::Skipped(_)) => {
                if pass == Pass::Links {
                    stats.skipped += 1;
                }
            }
            Err(err) => {
                stats.failed += 1;
                error!(target: TARGET_WORKER, "[{} {}]: failed to process id {}: {}", worker_detail.name, worker_detail.id, id, err);
            }
        }
    }

    info!(target: TARGET_WORKER, "[{} {}]: finished in {:?}: {}.", worker_detail.name, worker_detail.id, started.elapsed(), stats);
    stats
}

/// Runs the link pass, then the n-gram pass when enabled, and sums their counters. Only the type
/// cache is shared between workers.
pub async fn run_workers(
    config: &ExtractionConfig,
    store: Arc<dyn RecordStore>,
    taxonomy: Arc<CategoryTaxonomy>,
    cache: TypeCache,
) -> Result<ExtractionStats> {
    let mut total = run_pass(Pass::Links, config, &store, &taxonomy, &cache).await?;
    if config.second_pass {
        total += run_pass(Pass::NGrams, config, &store, &taxonomy, &cache).await?;
    }

    info!(target: TARGET_WORKER, "All extraction workers finished: {}; {} cache entries.", total, cache.len());
    Ok(total)
}

/// Spawns one task per configured worker over disjoint partitions of the id range and waits for
/// all of them.
async fn run_pass(
    pass: Pass,
    config: &ExtractionConfig,
    store: &Arc<dyn RecordStore>,
    taxonomy: &Arc<CategoryTaxonomy>,
    cache: &TypeCache,
) -> Result<ExtractionStats> {
    let workers = config.workers.max(1);
    let mut handles = Vec::with_capacity(workers);

    for worker_id in 0..workers {
        let worker_detail = WorkerDetail {
            name: pass.worker_name().to_string(),
            id: i16::try_from(worker_id).context("Too many extraction workers")?,
        };
        let typer = EntityTyper::new(
            store.clone(),
            taxonomy.clone(),
            cache.clone(),
            config.origin_language,
        );
        let (start_id, end_id) = (config.start_id, config.end_id);

        handles.push(tokio::spawn(async move {
            extraction_loop(worker_detail, typer, pass, start_id, end_id, workers).await
        }));
    }

    let mut total = ExtractionStats::default();
    for (worker_id, handle) in handles.into_iter().enumerate() {
        match handle.await {
            Ok(stats) => total += stats,
            Err(err) => warn!(target: TARGET_WORKER, "{} {} did not finish: {}", pass.worker_name(), worker_id, err),
        }
    }
    Ok(total)
}
