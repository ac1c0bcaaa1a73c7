pub mod sqlite;
pub mod repository;
pub mod store;

pub use sqlite::*;
pub use repository::*;
pub use store::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("Stored JSON column {column} is malformed: {reason}")]
    MalformedColumn { column: String, reason: String },

    #[error("Connection lock poisoned")]
    LockPoisoned,
}
