//! SQLite connection management for the vSphereDB sync backend.
//!
//! Provides:
//! - [`DbConfig`]: how to reach the store
//! - [`Db`]: the live connection handle
//! - [`Migrations`]: schema state inspection and in-order migration
//! - [`DbCleanup`]: maintenance sweeps run at startup and periodically
//!
//! The built-in vSphereDB schema lives in [`schema`].

mod cleanup;
mod config;
mod connection;
mod error;
mod migration;
pub mod schema;

pub use cleanup::{CleanupReport, DbCleanup};
pub use config::DbConfig;
pub use connection::Db;
pub use error::{DbError, DbResult};
pub use migration::{Migration, Migrations, MIGRATION_TABLE};
