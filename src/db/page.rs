use async_trait::async_trait;
use rand::Rng;
use sqlx::sqlite::SqliteRow;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info, instrument, warn};

use super::core::{Database, DbLockErrorExt};
use crate::db::Row;
use crate::entity::EntityType;
use crate::error::{Error, Result};
use crate::record::{Language, Record};
use crate::store::RecordStore;
use crate::TARGET_DB;

const PAGE_COLUMNS: &str = "id, title, body, cross_link, entity_type, is_disambiguation";

impl Database {
    /// Inserts or replaces a page together with its categories.
    #[instrument(target = "db", level = "debug", skip(self, record), fields(id = record.id))]
    pub async fn insert_record(&self, language: Language, record: &Record) -> Result<()> {
        let mut tx = self.pool().begin().await?;

        sqlx::query(
            r#"
            INSERT INTO pages (language, id, title, body, cross_link, entity_type, is_disambiguation)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(language, id) DO UPDATE SET
                title = excluded.title,
                body = excluded.body,
                cross_link = excluded.cross_link,
                entity_type = excluded.entity_type,
                is_disambiguation = excluded.is_disambiguation
            "#,
        )
        .bind(language.abbreviation())
        .bind(record.id)
        .bind(&record.title)
        .bind(record.body.as_bytes())
        .bind(record.cross_link.as_deref())
        .bind(record.entity_type.map(|t| t.tag()))
        .bind(record.is_disambiguation)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM categories WHERE language = ?1 AND page_id = ?2")
            .bind(language.abbreviation())
            .bind(record.id)
            .execute(&mut *tx)
            .await?;

        for (position, name) in record.categories.iter().enumerate() {
            sqlx::query(
                "INSERT INTO categories (language, page_id, position, name) VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(language.abbreviation())
            .bind(record.id)
            .bind(position as i64)
            .bind(name)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!(target: TARGET_DB, "Stored page {} '{}' in {}", record.id, record.title, language);
        Ok(())
    }

    /// Highest page id stored for a language, 0 when empty.
    pub async fn max_page_id(&self, language: Language) -> Result<i64> {
        let max: Option<i64> = sqlx::query_scalar("SELECT MAX(id) FROM pages WHERE language = ?1")
            .bind(language.abbreviation())
            .fetch_one(self.pool())
            .await?;
        Ok(max.unwrap_or(0))
    }

    async fn page_with_categories(
        &self,
        language: Language,
        row: Option<SqliteRow>,
    ) -> Result<Option<Record>> {
        let mut record = match row.map(|row| record_from_row(language, &row)) {
            Some(Some(record)) => record,
            _ => return Ok(None),
        };
        record.categories = self.fetch_categories(language, record.id).await?;
        Ok(Some(record))
    }
}

/// Maps a page row. Bodies that are not valid UTF-8 are logged and the row is dropped.
fn record_from_row(language: Language, row: &SqliteRow) -> Option<Record> {
    let id: i64 = row.get("id");
    let body: Option<Vec<u8>> = row.get("body");
    let body = match String::from_utf8(body.unwrap_or_default()) {
        Ok(body) => body,
        Err(e) => {
            let err = Error::MalformedRecord {
                language: language.to_string(),
                id,
                reason: format!("body is not valid UTF-8: {}", e),
            };
            warn!(target: TARGET_DB, "{}", err);
            return None;
        }
    };
    let entity_type: Option<String> = row.get("entity_type");

    Some(Record {
        id,
        title: row.get("title"),
        body,
        categories: Vec::new(),
        cross_link: row.get("cross_link"),
        entity_type: entity_type.as_deref().map(EntityType::from_label),
        is_disambiguation: row.get("is_disambiguation"),
    })
}

#[async_trait]
impl RecordStore for Database {
    async fn fetch_by_id(&self, language: Language, id: i64) -> Result<Option<Record>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM pages WHERE language = ?1 AND id = ?2",
            PAGE_COLUMNS
        ))
        .bind(language.abbreviation())
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        self.page_with_categories(language, row).await
    }

    async fn fetch_by_title(&self, language: Language, title: &str) -> Result<Option<Record>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM pages WHERE language = ?1 AND title = ?2 LIMIT 1",
            PAGE_COLUMNS
        ))
        .bind(language.abbreviation())
        .bind(title)
        .fetch_optional(self.pool())
        .await?;

        self.page_with_categories(language, row).await
    }

    async fn fetch_categories(&self, language: Language, id: i64) -> Result<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>(
            "SELECT name FROM categories WHERE language = ?1 AND page_id = ?2 ORDER BY position",
        )
        .bind(language.abbreviation())
        .bind(id)
        .fetch_all(self.pool())
        .await?;
        Ok(names)
    }

    async fn update_record(&self, language: Language, record: &Record) -> Result<()> {
        let mut backoff = 100; // initial delay in milliseconds
        let max_retries = 5;

        for attempt in 1..=max_retries {
            let result = sqlx::query(
                "UPDATE pages SET body = ?1, entity_type = ?2 WHERE language = ?3 AND id = ?4",
            )
            .bind(record.body.as_bytes())
            .bind(record.entity_type.map(|t| t.tag()))
            .bind(language.abbreviation())
            .bind(record.id)
            .execute(self.pool())
            .await;

            match result {
                Ok(_) => {
                    debug!(target: TARGET_DB, "Updated page {} in {}", record.id, language);
                    return Ok(());
                }
                Err(err) if err.is_database_lock_error() => {
                    info!(
                        target: TARGET_DB,
                        "Database is locked, waiting {}ms before retrying attempt {}/{}: page {}",
                        backoff, attempt, max_retries, record.id
                    );
                    sleep(Duration::from_millis(backoff)).await;
                    backoff = backoff.saturating_mul(2);
                    if attempt == max_retries {
                        let random_jitter = rand::rng().random_range(0..200);
                        sleep(Duration::from_millis(backoff + random_jitter)).await;
                    }
                }
                Err(err) => {
                    error!(target: TARGET_DB, "Failed to update page {}: {}", record.id, err);
                    return Err(err.into());
                }
            }
        }

        Err(Error::Database(sqlx::Error::Protocol(format!(
            "Maximum retries exceeded for updating page {}",
            record.id
        ))))
    }
}
