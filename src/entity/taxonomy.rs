//! Category taxonomy: ordered rules mapping category-name patterns to coarse types.
//!
//! The taxonomy file holds entries of the form `"fiction fans"=>"PERSON"`, optionally with a
//! subtype suffix (`"universities"=>"ORGANIZATION++academic"`), separated by commas or newlines.
//! A pattern may be anchored with `^` (match from the start) and/or `$` (match to the end);
//! unanchored patterns match anywhere in the category name. Rules are tried in declaration order
//! and the first match wins.

use lazy_static::lazy_static;
use regex::Regex;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use super::types::EntityType;
use super::TARGET_ENTITY;
use crate::error::{Error, Result};

lazy_static! {
    static ref ENTRY_PATTERN: Regex =
        Regex::new(r#""([^"]+)"\s*=>\s*"([^"+]+)(?:\+\+[^"]*)?""#).expect("valid taxonomy entry pattern");
}

/// How a taxonomy pattern is compared against a category name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryMatcher {
    Prefix(String),
    Suffix(String),
    Substring(String),
    Exact(String),
}

impl CategoryMatcher {
    /// Derives the matcher from a raw pattern, stripping its anchors.
    pub fn parse(pattern: &str) -> Self {
        let pattern = pattern.trim();
        let anchored_start = pattern.starts_with('^');
        let anchored_end = pattern.ends_with('$') && pattern.len() > usize::from(anchored_start);

        let mut literal = pattern;
        if anchored_start {
            literal = &literal[1..];
        }
        if anchored_end {
            literal = &literal[..literal.len() - 1];
        }
        let literal = literal.to_lowercase();

        match (anchored_start, anchored_end) {
            (true, true) => CategoryMatcher::Exact(literal),
            (true, false) => CategoryMatcher::Prefix(literal),
            (false, true) => CategoryMatcher::Suffix(literal),
            (false, false) => CategoryMatcher::Substring(literal),
        }
    }

    /// `category` must already be lower-cased.
    pub fn matches(&self, category: &str) -> bool {
        match self {
            CategoryMatcher::Prefix(literal) => category.starts_with(literal.as_str()),
            CategoryMatcher::Suffix(literal) => category.ends_with(literal.as_str()),
            CategoryMatcher::Substring(literal) => category.contains(literal.as_str()),
            CategoryMatcher::Exact(literal) => category == literal,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaxonomyRule {
    pub pattern: String,
    pub matcher: CategoryMatcher,
    pub label: String,
    pub entity_type: EntityType,
}

impl TaxonomyRule {
    pub fn new(pattern: &str, label: &str) -> Self {
        TaxonomyRule {
            pattern: pattern.to_string(),
            matcher: CategoryMatcher::parse(pattern),
            label: label.trim().to_string(),
            entity_type: EntityType::from_label(label),
        }
    }
}

/// Read-only after load; share it behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct CategoryTaxonomy {
    rules: Vec<TaxonomyRule>,
}

impl CategoryTaxonomy {
    pub fn new(rules: Vec<TaxonomyRule>) -> Self {
        CategoryTaxonomy { rules }
    }

    /// Builds a taxonomy from `(pattern, label)` pairs, keeping their order.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(pattern, label)| TaxonomyRule::new(pattern, label))
                .collect(),
        )
    }

    /// Parses taxonomy source text. Fragments that are not entries are ignored.
    pub fn parse(source: &str) -> Self {
        let rules: Vec<TaxonomyRule> = ENTRY_PATTERN
            .captures_iter(source)
            .map(|captures| TaxonomyRule::new(&captures[1], &captures[2]))
            .collect();

        debug!(target: TARGET_ENTITY, "Parsed {} taxonomy rules", rules.len());
        Self::new(rules)
    }

    /// Loads the taxonomy file. A missing, unreadable or empty taxonomy is fatal for a run.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let shown = path.display().to_string();

        let source = fs::read_to_string(path).map_err(|e| Error::TaxonomyLoad {
            path: shown.clone(),
            reason: e.to_string(),
        })?;

        let taxonomy = Self::parse(&source);
        if taxonomy.is_empty() {
            warn!(target: TARGET_ENTITY, "No taxonomy rules found in {}", shown);
            return Err(Error::TaxonomyLoad {
                path: shown,
                reason: "no rules could be parsed".to_string(),
            });
        }

        info!(
            target: TARGET_ENTITY,
            "Loaded {} taxonomy rules from {}", taxonomy.len(), shown
        );
        Ok(taxonomy)
    }

    /// First rule matching the category name, in declaration order.
    pub fn match_category(&self, category: &str) -> Option<&TaxonomyRule> {
        let category = category.trim().to_lowercase();
        self.rules.iter().find(|rule| rule.matcher.matches(&category))
    }

    pub fn classify_category(&self, category: &str) -> Option<EntityType> {
        self.match_category(category).map(|rule| rule.entity_type)
    }

    pub fn rules(&self) -> &[TaxonomyRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
