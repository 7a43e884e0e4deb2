//! Core type definitions for the vSphereDB sync backend.
//!
//! This crate defines the types shared between the polling side and the
//! DB runner:
//! - vCenter identifiers and result kinds
//! - Raw result batches as produced by the vSphere API poller
//! - Per-task sync statistics
//!
//! Storage-specific types (connections, migrations, stores) live in
//! `vspheredb-db` and `vspheredb-sync`.

mod batch;
mod ids;
mod stats;

pub use batch::{ManagedObject, ResultBatch};
pub use ids::{ResultKind, VCenterId};
pub use stats::SyncStats;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid vCenter id: {0}")]
    InvalidVCenterId(String),

    #[error("invalid result kind: {0:?}")]
    InvalidResultKind(String),
}
