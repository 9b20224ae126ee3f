use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::entity::EntityType;
use crate::error::Error;

/// One of the two corpus languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    English,
    Dutch,
}

impl Language {
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Language::English => "EN",
            Language::Dutch => "NL",
        }
    }

    /// Namespace prefix used for category pages in this language.
    pub fn category_prefix(&self) -> &'static str {
        match self {
            Language::English => "Category:",
            Language::Dutch => "Categorie:",
        }
    }

    /// The other supported language.
    pub fn counterpart(&self) -> Language {
        match self {
            Language::English => Language::Dutch,
            Language::Dutch => Language::English,
        }
    }

    /// Title of the category page for `category` in this language.
    pub fn category_title(&self, category: &str) -> String {
        format!("{}{}", self.category_prefix(), category.trim())
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "EN" | "ENGLISH" => Ok(Language::English),
            "NL" | "DUTCH" => Ok(Language::Dutch),
            other => Err(Error::Config(format!("Unsupported language '{}'", other))),
        }
    }
}

/// A corpus page: an article, category page, redirect or disambiguation page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    pub title: String,
    pub body: String,

    // Category names in stored order, without namespace prefix
    pub categories: Vec<String>,

    // Title of the interlanguage counterpart, if the page carries one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cross_link: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<EntityType>,

    pub is_disambiguation: bool,
}

impl Record {
    pub fn new(id: i64, title: &str, body: &str) -> Self {
        Record {
            id,
            title: title.to_string(),
            body: body.to_string(),
            ..Default::default()
        }
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for category in categories {
            self.add_category(category);
        }
        self
    }

    pub fn with_cross_link(mut self, title: &str) -> Self {
        self.cross_link = Some(title.to_string());
        self
    }

    pub fn with_entity_type(mut self, entity_type: EntityType) -> Self {
        self.entity_type = Some(entity_type);
        self
    }

    pub fn as_disambiguation(mut self) -> Self {
        self.is_disambiguation = true;
        self
    }

    /// Adds a category unless the record already carries it.
    pub fn add_category<S: Into<String>>(&mut self, category: S) {
        let category = category.into();
        if !self.categories.contains(&category) {
            self.categories.push(category);
        }
    }

    /// Lower-cased title, the key used for the type cache.
    pub fn key(&self) -> String {
        self.title.to_lowercase()
    }

    /// Non-empty interlanguage link hint, if any.
    pub fn cross_link_hint(&self) -> Option<&str> {
        self.cross_link
            .as_deref()
            .map(str::trim)
            .filter(|link| !link.is_empty())
    }

    /// Reason this record must not be classified, if it is malformed.
    pub fn validation_error(&self) -> Option<&'static str> {
        if self.id <= 0 {
            Some("non-positive id")
        } else if self.title.trim().is_empty() {
            Some("empty title")
        } else if self.body.trim().is_empty() {
            Some("empty body")
        } else {
            None
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validation_error().is_none()
    }
}

// Records are unique by id within one language.
impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Record {}

/// A record in one language bound to its counterpart in the other, if one was found.
#[derive(Debug, Clone)]
pub struct Pair {
    origin: Record,
    counterpart: Option<Record>,
}

impl Pair {
    pub fn new(origin: Record, counterpart: Option<Record>) -> Self {
        Pair {
            origin,
            counterpart,
        }
    }

    pub fn origin(&self) -> &Record {
        &self.origin
    }

    pub fn counterpart(&self) -> Option<&Record> {
        self.counterpart.as_ref()
    }

    /// Type decided for this pair, preferring the counterpart's.
    pub fn entity_type(&self) -> Option<EntityType> {
        self.counterpart
            .as_ref()
            .and_then(|record| record.entity_type)
            .or(self.origin.entity_type)
    }

    /// Returns a pair with the given type applied to both halves.
    pub fn with_entity_type(self, entity_type: Option<EntityType>) -> Self {
        let Pair {
            mut origin,
            counterpart,
        } = self;
        origin.entity_type = entity_type;
        let counterpart = counterpart.map(|mut record| {
            record.entity_type = entity_type;
            record
        });
        Pair {
            origin,
            counterpart,
        }
    }

    pub fn into_parts(self) -> (Record, Option<Record>) {
        (self.origin, self.counterpart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_parsing_and_namespaces() {
        assert_eq!("nl".parse::<Language>().unwrap(), Language::Dutch);
        assert_eq!("EN".parse::<Language>().unwrap(), Language::English);
        assert!("FR".parse::<Language>().is_err());

        assert_eq!(Language::Dutch.counterpart(), Language::English);
        assert_eq!(
            Language::English.category_title(" Dutch poets "),
            "Category:Dutch poets"
        );
        assert_eq!(Language::Dutch.category_title("Nederlands dichter"), "Categorie:Nederlands dichter");
    }

    #[test]
    fn test_record_validation() {
        assert!(Record::new(1, "Amsterdam", "Hoofdstad").is_valid());
        assert_eq!(
            Record::new(0, "Amsterdam", "Hoofdstad").validation_error(),
            Some("non-positive id")
        );
        assert_eq!(
            Record::new(3, "Amsterdam", "   ").validation_error(),
            Some("empty body")
        );
    }

    #[test]
    fn test_cross_link_hint_ignores_blank_links() {
        let record = Record::new(1, "Utrecht", "body").with_cross_link("  ");
        assert_eq!(record.cross_link_hint(), None);

        let record = Record::new(1, "Utrecht", "body").with_cross_link("Utrecht (city)");
        assert_eq!(record.cross_link_hint(), Some("Utrecht (city)"));
    }

    #[test]
    fn test_categories_are_deduplicated_in_order() {
        let record = Record::new(1, "Vondel", "body").with_categories(["Dichters", "Toneel", "Dichters"]);
        assert_eq!(record.categories, vec!["Dichters", "Toneel"]);
    }

    #[test]
    fn test_pair_type_prefers_counterpart() {
        let origin = Record::new(1, "Den Haag", "x").with_entity_type(EntityType::Misc);
        let counterpart = Record::new(9, "The Hague", "y").with_entity_type(EntityType::Location);
        let pair = Pair::new(origin, Some(counterpart));
        assert_eq!(pair.entity_type(), Some(EntityType::Location));

        let pair = pair.with_entity_type(Some(EntityType::Organization));
        assert_eq!(pair.origin().entity_type, Some(EntityType::Organization));
        assert_eq!(
            pair.counterpart().and_then(|r| r.entity_type),
            Some(EntityType::Organization)
        );
    }
}
