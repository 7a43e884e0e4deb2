//! Error types for the database layer.

use thiserror::Error;

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

/// Errors that can occur in database operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// The store could not be opened or did not answer the probe query.
    #[error("unable to connect to {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Generic SQLite error.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The store holds tables, but none of them belong to vSphereDB.
    #[error("DB has no vSphereDB schema and is not empty, aborting")]
    ForeignSchema,

    /// A single schema migration failed.
    #[error("schema migration {version} ({name}) failed: {source}")]
    Migration {
        version: u32,
        name: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// Closing the connection failed.
    #[error("failed to close connection: {0}")]
    Close(#[source] rusqlite::Error),
}
