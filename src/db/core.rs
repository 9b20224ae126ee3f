use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    Pool, Sqlite,
};
use std::path::Path;
use std::str::FromStr;
use tokio::time::Duration;
use tracing::{info, instrument};

use crate::error::{Error, Result};
use crate::TARGET_DB;

#[derive(Clone, Debug)]
pub struct Database {
    pool: Pool<Sqlite>,
}

// Helper method to check if an sqlx error is a database lock error
pub trait DbLockErrorExt {
    fn is_database_lock_error(&self) -> bool;
}

impl DbLockErrorExt for sqlx::Error {
    fn is_database_lock_error(&self) -> bool {
        match self {
            // SQLITE_BUSY (5) or SQLITE_LOCKED (6), including their extended codes
            sqlx::Error::Database(err) => err
                .code()
                .and_then(|code| code.parse::<i32>().ok())
                .map_or(false, |code| matches!(code & 0xff, 5 | 6)),
            _ => false,
        }
    }
}

impl Database {
    /// Get access to the database pool
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Opens an existing corpus database.
    #[instrument(target = "db", level = "info")]
    pub async fn new(database_path: &str) -> Result<Self> {
        if !Path::new(database_path).exists() {
            return Err(Error::Config(format!(
                "Database file '{}' does not exist",
                database_path
            )));
        }
        Self::open(database_path, false).await
    }

    /// Opens a database, creating the file and schema when missing.
    #[instrument(target = "db", level = "info")]
    pub async fn create(database_path: &str) -> Result<Self> {
        Self::open(database_path, true).await
    }

    async fn open(database_path: &str, create_if_missing: bool) -> Result<Self> {
        info!(target: TARGET_DB, "Creating database pool for: {}", database_path);

        let connect_options =
            SqliteConnectOptions::from_str(&format!("sqlite://{}", database_path))?
                .create_if_missing(create_if_missing)
                .journal_mode(SqliteJournalMode::Wal)
                .busy_timeout(Duration::from_secs(5))
                .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;

        info!(target: TARGET_DB, "Database pool created");

        let db = Database { pool };
        db.initialize_schema().await?;

        Ok(db)
    }

    /// Private in-memory database on a single connection.
    pub async fn in_memory() -> Result<Self> {
        let connect_options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(connect_options)
            .await?;

        let db = Database { pool };
        db.initialize_schema().await?;
        Ok(db)
    }

    /// Page counts per language, as `EN:NL`.
    pub async fn collect_stats(&self) -> Result<String> {
        let queries = [
            "SELECT COUNT(*) FROM pages WHERE language = 'EN';",
            "SELECT COUNT(*) FROM pages WHERE language = 'NL';",
        ];

        let mut results = vec![];
        for query in queries {
            let count: i64 = sqlx::query_scalar(query).fetch_one(&self.pool).await?;
            results.push(count);
        }

        Ok(results
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(":"))
    }
}
