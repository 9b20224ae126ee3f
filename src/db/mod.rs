// Re-export the Database struct and other public items
pub mod core;
mod page;
mod schema;

pub use self::core::Database;
pub use self::core::DbLockErrorExt;
pub use sqlx::Row;
