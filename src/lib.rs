pub mod config;
pub mod db;
pub mod entity;
pub mod environment;
pub mod error;
pub mod logging;
pub mod record;
pub mod store;
pub mod workers;

pub use config::ExtractionConfig;
pub use error::{Error, Result};
pub use record::{Language, Pair, Record};

pub const TARGET_DB: &str = "db_query";
pub const TARGET_WORKER: &str = "worker";

#[derive(Clone, Debug)]
pub struct WorkerDetail {
    pub name: String,
    pub id: i16,
}
