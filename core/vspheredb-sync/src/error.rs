//! Error types for the DB runner.

use thiserror::Error;
use vspheredb_db::DbError;

/// Result type for DB runner operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while running DB commands.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The store is unreachable or rejected the connection.
    #[error("connection error: {0}")]
    Connection(String),

    /// The store is occupied by data unrelated to vSphereDB.
    #[error("schema error: {0}")]
    Schema(String),

    /// A schema migration failed; earlier migrations stay applied.
    #[error("migration {version} failed: {message}")]
    Migration { version: u32, message: String },

    /// The command needs a DB connection, but none is configured.
    #[error("not connected: {0}")]
    NotConnected(&'static str),

    /// A referenced object does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// No store is registered for the given result kind.
    #[error("no sync store registered for result kind {0}")]
    UnknownResultKind(String),

    /// Storage error while writing a result.
    #[error("storage error: {0}")]
    Storage(String),

    /// The DB runner is gone.
    #[error("DB runner channel closed")]
    ChannelClosed,
}

impl From<DbError> for SyncError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Open { .. } => SyncError::Connection(err.to_string()),
            DbError::ForeignSchema => SyncError::Schema(err.to_string()),
            DbError::Migration {
                version,
                name,
                ref source,
            } => SyncError::Migration {
                version,
                message: format!("{name}: {source}"),
            },
            DbError::Sqlite(_) | DbError::Close(_) => SyncError::Storage(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for SyncError {
    fn from(err: rusqlite::Error) -> Self {
        SyncError::Storage(err.to_string())
    }
}
