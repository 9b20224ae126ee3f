//! Error types shared by the store, taxonomy and classification layers.
//!
//! Absence is not an error here: a record that does not exist comes back as `Ok(None)`, and a
//! classification that cannot decide comes back as `Ok(None)` as well. Only failures that stop a
//! lookup from completing are represented below.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Failed to load category taxonomy from '{path}': {reason}")]
    TaxonomyLoad { path: String, reason: String },

    #[error("Malformed record {id} in language '{language}': {reason}")]
    MalformedRecord {
        language: String,
        id: i64,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
