use std::env;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Retrieves an environment variable, falling back to `default` when unset or blank.
pub fn get_env_var_or(var: &str, default: &str) -> String {
    env::var(var)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Retrieves and parses an environment variable, falling back to `default` when unset or blank.
/// A value that is present but does not parse is a configuration error.
pub fn get_env_var_parsed<T>(var: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(var).ok().filter(|value| !value.trim().is_empty()) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value '{}' for {}: {}", value, var, e))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each test uses its own variable names; tests run in parallel.

    #[test]
    fn test_missing_variables_use_defaults() {
        assert_eq!(get_env_var_or("WIKITYPE_TEST_UNSET_PATH", "wikitype.db"), "wikitype.db");
        assert_eq!(get_env_var_parsed("WIKITYPE_TEST_UNSET_WORKERS", 8usize).unwrap(), 8);
    }

    #[test]
    fn test_parsed_variable() {
        env::set_var("WIKITYPE_TEST_END_ID", " 1200 ");
        assert_eq!(get_env_var_parsed("WIKITYPE_TEST_END_ID", 0i64).unwrap(), 1200);

        env::set_var("WIKITYPE_TEST_BAD_END_ID", "lots");
        assert!(get_env_var_parsed("WIKITYPE_TEST_BAD_END_ID", 0i64).is_err());
    }
}
