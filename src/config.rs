use serde::Serialize;

use crate::environment::{get_env_var_or, get_env_var_parsed};
use crate::error::{Error, Result};
use crate::record::Language;

pub const DEFAULT_DATABASE_PATH: &str = "wikitype.db";
pub const DEFAULT_TAXONOMY_PATH: &str = "categoryClasses.txt";
pub const DEFAULT_WORKERS: usize = 8;
pub const DEFAULT_START_ID: i64 = 0;
/// Highest page id of the Dutch dump the corpus was built from.
pub const DEFAULT_END_ID: i64 = 329_020;

/// Settings for one extraction run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionConfig {
    pub database_path: String,
    pub taxonomy_path: String,
    pub workers: usize,
    /// Exclusive lower bound of the id range.
    pub start_id: i64,
    /// Inclusive upper bound of the id range.
    pub end_id: i64,
    pub origin_language: Language,
    /// Run the n-gram pass after the link pass.
    pub second_pass: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        ExtractionConfig {
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            taxonomy_path: DEFAULT_TAXONOMY_PATH.to_string(),
            workers: DEFAULT_WORKERS,
            start_id: DEFAULT_START_ID,
            end_id: DEFAULT_END_ID,
            origin_language: Language::Dutch,
            second_pass: false,
        }
    }
}

impl ExtractionConfig {
    /// Reads `DATABASE_PATH`, `TAXONOMY_PATH`, `EXTRACTION_WORKERS`, `START_ID`, `END_ID`,
    /// `ORIGIN_LANGUAGE` and `SECOND_PASS`, using the defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        let config = ExtractionConfig {
            database_path: get_env_var_or("DATABASE_PATH", DEFAULT_DATABASE_PATH),
            taxonomy_path: get_env_var_or("TAXONOMY_PATH", DEFAULT_TAXONOMY_PATH),
            workers: get_env_var_parsed("EXTRACTION_WORKERS", DEFAULT_WORKERS)?,
            start_id: get_env_var_parsed("START_ID", DEFAULT_START_ID)?,
            end_id: get_env_var_parsed("END_ID", DEFAULT_END_ID)?,
            origin_language: get_env_var_parsed("ORIGIN_LANGUAGE", Language::Dutch)?,
            second_pass: get_env_var_parsed("SECOND_PASS", false)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::Config("at least one extraction worker is required".to_string()));
        }
        if self.start_id < 0 || self.end_id < self.start_id {
            return Err(Error::Config(format!(
                "invalid id range ({}, {}]",
                self.start_id, self.end_id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ExtractionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.origin_language, Language::Dutch);
        assert_eq!(config.end_id, 329_020);
        assert!(!config.second_pass);
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let config = ExtractionConfig {
            workers: 0,
            ..ExtractionConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ExtractionConfig {
            start_id: 100,
            end_id: 10,
            ..ExtractionConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
