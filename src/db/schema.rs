use tracing::info;

use super::core::Database;
use crate::error::Result;
use crate::TARGET_DB;

impl Database {
    pub(crate) async fn initialize_schema(&self) -> Result<()> {
        let mut conn = self.pool().acquire().await?;
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS pages (
                language TEXT NOT NULL, -- EN, NL
                id INTEGER NOT NULL,
                title TEXT NOT NULL,
                body BLOB,
                cross_link TEXT, -- title of the counterpart in the other language
                entity_type TEXT, -- PER, ORG, LOC, MISC
                is_disambiguation BOOLEAN NOT NULL DEFAULT 0,
                PRIMARY KEY (language, id)
            );
            CREATE INDEX IF NOT EXISTS idx_pages_language_title ON pages (language, title);

            CREATE TABLE IF NOT EXISTS categories (
                language TEXT NOT NULL,
                page_id INTEGER NOT NULL,
                position INTEGER NOT NULL,
                name TEXT NOT NULL,
                PRIMARY KEY (language, page_id, position),
                FOREIGN KEY (language, page_id) REFERENCES pages (language, id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_categories_page ON categories (language, page_id);
            "#,
        )
        .execute(&mut *conn)
        .await?;

        info!(target: TARGET_DB, "Database schema initialized");
        Ok(())
    }
}
