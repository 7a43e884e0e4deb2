//! DB runner for the vSphereDB sync backend.
//!
//! The runner owns the single DB connection and executes commands one at a
//! time:
//! - `configure` ([`DbRunner::set_db_config`]): connect, migrate, clean up
//! - `clear` ([`DbRunner::clear_db_config`]): drop the connection
//! - `runCleanup` ([`DbRunner::run_db_cleanup`]): maintenance on demand
//! - `hasPendingMigrations` ([`DbRunner::has_pending_migrations`])
//! - `processTaskResult` ([`DbRunner::process_sync_task_result`]): store a
//!   vSphere task result through the cached [`SyncStore`]
//!
//! [`spawn_db_runner`] moves a runner onto a worker thread, serializes
//! commands through a queue and schedules periodic cleanup sweeps. The
//! [`ProcessStatus`] label reports what the runner is doing.

mod connection;
mod error;
mod runner;
mod service;
mod status;
pub mod store;
mod vcenter;

pub use connection::{ConnectionState, DbConnection};
pub use error::{SyncError, SyncResult};
pub use runner::DbRunner;
pub use service::{
    spawn_db_runner, DbCommand, DbRunnerHandle, RunnerConfig, DEFAULT_CLEANUP_INTERVAL,
};
pub use status::{Activity, ActivityGuard, ProcessStatus, TITLE_PREFIX};
pub use store::{SharedSyncStore, StoreRegistry, SyncStore, SyncStoreCache};
pub use vcenter::{VCenter, VCenterRegistry};
