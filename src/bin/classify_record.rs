use anyhow::{anyhow, Context, Result};
use clap::Parser;
use serde_json::json;
use std::sync::Arc;
use tokio::main;

use wikitype::config::ExtractionConfig;
use wikitype::db::Database;
use wikitype::entity::{CategoryTaxonomy, EntityTyper, TypeCache};
use wikitype::record::Language;
use wikitype::store::RecordStore;

/// Classifies a single record by title and prints the verdict as JSON. Nothing is written back.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Title of the record to classify
    title: String,

    /// Language the title belongs to, EN or NL
    #[arg(short, long, default_value = "NL")]
    language: Language,

    /// SQLite corpus database (overrides DATABASE_PATH)
    #[arg(short, long)]
    database: Option<String>,

    /// Category taxonomy file (overrides TAXONOMY_PATH)
    #[arg(short, long)]
    taxonomy: Option<String>,
}

#[main]
async fn main() -> Result<()> {
    wikitype::logging::configure_logging();

    let cli = Cli::parse();
    let config = ExtractionConfig::from_env()?;
    let database_path = cli.database.unwrap_or(config.database_path);
    let taxonomy_path = cli.taxonomy.unwrap_or(config.taxonomy_path);

    let taxonomy = Arc::new(
        CategoryTaxonomy::load(&taxonomy_path).context("Cannot classify without a taxonomy")?,
    );
    let db = Database::new(&database_path)
        .await
        .with_context(|| format!("Failed to open database '{}'", database_path))?;
    let store: Arc<dyn RecordStore> = Arc::new(db);

    let record = store
        .find_by_title(cli.language, &cli.title)
        .await?
        .ok_or_else(|| anyhow!("No usable record titled '{}' in {}", cli.title, cli.language))?;

    let typer = EntityTyper::new(store, taxonomy, TypeCache::new(), cli.language);
    let pair = typer.resolve_pair(typer.pair_for(record).await?).await?;

    let verdict = json!({
        "title": pair.origin().title,
        "language": cli.language.abbreviation(),
        "is_disambiguation": pair.origin().is_disambiguation,
        "counterpart": pair.counterpart().map(|c| &c.title),
        "entity_type": pair.entity_type().map(|t| t.tag()),
    });
    println!("{}", serde_json::to_string_pretty(&verdict)?);

    Ok(())
}
