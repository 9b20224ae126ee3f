pub mod cache;
pub mod classifier;
pub mod fallback;
pub mod resolver;
pub mod taxonomy;
pub mod typer;
pub mod types;
pub mod wikitext;

pub use types::*;

pub use cache::TypeCache;
pub use classifier::{ClassifyContext, TypeClassifier};
pub use resolver::CrossLingualResolver;
pub use taxonomy::{CategoryMatcher, CategoryTaxonomy, TaxonomyRule};
pub use typer::EntityTyper;

// Module-level constants
pub const TARGET_ENTITY: &str = "entity";
