use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::main;
use tracing::{error, info};

use wikitype::config::ExtractionConfig;
use wikitype::db::Database;
use wikitype::entity::{CategoryTaxonomy, TypeCache, TARGET_ENTITY};
use wikitype::record::Language;
use wikitype::workers::run_workers;
use wikitype::TARGET_WORKER;

/// Initial capacity of the shared type cache.
const CACHE_CAPACITY: usize = 1_000_000;

#[derive(Parser)]
#[command(author, version, about = "Infers entity types for linked mentions across a bilingual corpus", long_about = None)]
struct Cli {
    /// SQLite corpus database (overrides DATABASE_PATH)
    #[arg(short, long)]
    database: Option<String>,

    /// Category taxonomy file (overrides TAXONOMY_PATH)
    #[arg(short, long)]
    taxonomy: Option<String>,

    /// Number of extraction workers (overrides EXTRACTION_WORKERS)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Exclusive lower bound of the page id range (overrides START_ID)
    #[arg(long)]
    start_id: Option<i64>,

    /// Inclusive upper bound of the page id range (overrides END_ID)
    #[arg(long)]
    end_id: Option<i64>,

    /// Language of the records being processed, EN or NL (overrides ORIGIN_LANGUAGE)
    #[arg(short, long)]
    origin: Option<Language>,

    /// Also run the n-gram pass over the same range (sets SECOND_PASS)
    #[arg(long)]
    second_pass: bool,
}

impl Cli {
    fn apply(self, mut config: ExtractionConfig) -> ExtractionConfig {
        if let Some(database) = self.database {
            config.database_path = database;
        }
        if let Some(taxonomy) = self.taxonomy {
            config.taxonomy_path = taxonomy;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(start_id) = self.start_id {
            config.start_id = start_id;
        }
        if let Some(end_id) = self.end_id {
            config.end_id = end_id;
        }
        if let Some(origin) = self.origin {
            config.origin_language = origin;
        }
        if self.second_pass {
            config.second_pass = true;
        }
        config
    }
}

#[main]
async fn main() -> Result<()> {
    wikitype::logging::configure_logging();

    let cli = Cli::parse();
    let config = cli.apply(ExtractionConfig::from_env().context("Failed to read configuration")?);
    config.validate().context("Invalid configuration")?;

    // Nothing is classified without a taxonomy
    let taxonomy = match CategoryTaxonomy::load(&config.taxonomy_path) {
        Ok(taxonomy) => Arc::new(taxonomy),
        Err(err) => {
            error!(target: TARGET_ENTITY, "{}", err);
            return Err(err).context("Cannot start without a category taxonomy");
        }
    };

    let db = Database::new(&config.database_path)
        .await
        .with_context(|| format!("Failed to open database '{}'", config.database_path))?;
    info!(target: TARGET_WORKER, "Corpus pages (EN:NL): {}", db.collect_stats().await?);

    info!(
        target: TARGET_WORKER,
        "Starting {} extraction workers over ({}, {}] in {} (second pass: {})",
        config.workers, config.start_id, config.end_id, config.origin_language, config.second_pass
    );

    let cache = TypeCache::with_capacity(CACHE_CAPACITY);
    let stats = run_workers(&config, Arc::new(db), taxonomy, cache.clone()).await?;

    println!("{}", serde_json::to_string_pretty(&stats)?);
    info!(target: TARGET_WORKER, "Done: {}; {} types cached.", stats, cache.len());

    Ok(())
}
