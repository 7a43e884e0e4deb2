//! The DB runner: executes DB commands against the single connection.

use crate::connection::{ConnectionState, DbConnection};
use crate::error::{SyncError, SyncResult};
use crate::status::{Activity, ActivityGuard, ProcessStatus};
use crate::store::{SharedSyncStore, StoreRegistry, SyncStoreCache};
use crate::vcenter::VCenterRegistry;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use vspheredb_db::{schema, Db, DbCleanup, DbConfig, DbError, Migration, Migrations};
use vspheredb_types::{ResultBatch, ResultKind, SyncStats, VCenterId};

#[derive(Debug, Clone, Copy)]
enum Sweep {
    Startup,
    Regular,
}

/// Executes DB commands one at a time.
///
/// Owns the connection together with everything derived from it: the
/// vCenter cache and the sync store cache. Both caches are dropped whenever
/// the connection changes.
pub struct DbRunner {
    connection: DbConnection,
    vcenters: VCenterRegistry,
    stores: SyncStoreCache,
    migrations: Vec<Migration>,
    status: ProcessStatus,
}

impl DbRunner {
    /// A runner with the built-in stores and schema.
    pub fn new() -> Self {
        Self::with_registry(StoreRegistry::builtin())
    }

    pub fn with_registry(registry: StoreRegistry) -> Self {
        Self {
            connection: DbConnection::new(),
            vcenters: VCenterRegistry::new(),
            stores: SyncStoreCache::new(Arc::new(registry)),
            migrations: schema::migrations().to_vec(),
            status: ProcessStatus::new(),
        }
    }

    /// Replaces the known migration sequence.
    pub fn with_migrations(mut self, migrations: Vec<Migration>) -> Self {
        self.migrations = migrations;
        self
    }

    pub fn status(&self) -> &ProcessStatus {
        &self.status
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Borrows the current connection.
    pub fn db(&self) -> SyncResult<&Db> {
        self.connection.require()
    }

    /// Number of vCenters cached for the current connection.
    pub fn cached_vcenters(&self) -> usize {
        self.vcenters.len()
    }

    /// Number of sync stores cached for the current connection.
    pub fn cached_stores(&self) -> usize {
        self.stores.len()
    }

    // ── Commands ─────────────────────────────────────────────────

    /// `configure`: connects, migrates the schema and runs the startup cleanup.
    ///
    /// A previous connection is dropped first. When the schema check or a
    /// migration fails the new connection stays open, the caller may `clear` it.
    pub fn set_db_config(&mut self, config: &DbConfig) -> SyncResult<()> {
        let activity = self.status.enter(Activity::Connecting);
        let result = self.configure(config, &activity);
        match &result {
            Ok(()) => self.status.set_resting(Activity::Connected),
            Err(e) => {
                error!("Configuring the DB connection failed: {e}");
                self.status.set_resting(Activity::Failing);
            }
        }
        result
    }

    /// `clear`: drops the connection. Never fails, close errors are logged.
    pub fn clear_db_config(&mut self) {
        self.forget_cached();
        if let Err(e) = self.connection.disconnect() {
            warn!("Ignoring error while closing the DB connection: {e}");
        }
        self.status.set_resting(Activity::Idle);
    }

    /// `runCleanup`: runs the startup sweep on demand.
    ///
    /// Succeeds whenever connected; sweep failures are only logged.
    pub fn run_db_cleanup(&mut self) -> SyncResult<()> {
        let _activity = self.status.enter(Activity::Cleanup);
        if !self.connection.is_connected() {
            return Err(SyncError::NotConnected(
                "cannot run DB cleanup without a DB connection",
            ));
        }
        self.sweep(Sweep::Startup);
        Ok(())
    }

    /// `hasPendingMigrations`: checks without applying anything.
    pub fn has_pending_migrations(&self) -> SyncResult<bool> {
        let _activity = self.status.enter(Activity::CheckingMigrations);
        let db = self.connection.require().map_err(|_| {
            SyncError::NotConnected("unable to determine migration status, have no DB connection")
        })?;
        Ok(Migrations::new(db, &self.migrations).has_pending_migrations()?)
    }

    /// `processTaskResult`: stores one task result.
    ///
    /// Never fails. Errors are logged with the task label and the returned
    /// stats describe whatever was stored before the error.
    pub fn process_sync_task_result(
        &mut self,
        vcenter_id: VCenterId,
        batch: &ResultBatch,
        task_label: &str,
        kind: &ResultKind,
    ) -> SyncStats {
        let _activity = self.status.enter(Activity::Storing(task_label.to_string()));
        let mut stats = SyncStats::new(task_label);
        match self.store_task_result(vcenter_id, batch, kind, &mut stats) {
            Ok(()) if stats.has_changes() => info!("{stats}"),
            Ok(()) => debug!("{stats}"),
            Err(e) => error!("Task {task_label} failed: {e}"),
        }
        stats
    }

    /// Timer-driven sweep. Does nothing without a connection.
    pub fn run_scheduled_cleanup(&mut self) {
        if !self.connection.is_connected() {
            debug!("Skipping scheduled DB cleanup, not connected");
            return;
        }
        let _activity = self.status.enter(Activity::Cleanup);
        self.sweep(Sweep::Regular);
    }

    /// Returns the store for `(vcenter_id, kind)`, loading the vCenter and
    /// building the store on first access.
    pub fn resolve_store(
        &mut self,
        vcenter_id: VCenterId,
        kind: &ResultKind,
    ) -> SyncResult<SharedSyncStore> {
        let db = self.connection.require()?;
        let vcenter = self.vcenters.require(db, vcenter_id)?;
        self.stores.require(vcenter, kind)
    }

    // ── Internals ────────────────────────────────────────────────

    fn configure(&mut self, config: &DbConfig, activity: &ActivityGuard) -> SyncResult<()> {
        self.forget_cached();
        self.connection.connect(config)?;
        self.apply_migrations(activity)?;
        activity.switch(Activity::Cleanup);
        self.sweep(Sweep::Startup);
        Ok(())
    }

    fn apply_migrations(&self, activity: &ActivityGuard) -> SyncResult<()> {
        let db = self.connection.require()?;
        let migrations = Migrations::new(db, &self.migrations);
        if !migrations.has_schema()? {
            if migrations.has_any_table()? {
                return Err(DbError::ForeignSchema.into());
            }
            warn!("Database has no schema, will be created");
        }
        if migrations.has_pending_migrations()? {
            activity.switch(Activity::Migrating);
            info!("Applying schema migrations");
            migrations.apply_pending()?;
            info!("DB schema is ready");
        }
        Ok(())
    }

    fn store_task_result(
        &mut self,
        vcenter_id: VCenterId,
        batch: &ResultBatch,
        kind: &ResultKind,
        stats: &mut SyncStats,
    ) -> SyncResult<()> {
        let shared = self.resolve_store(vcenter_id, kind)?;
        let db = self.connection.require()?;
        let mut store = shared.lock().map_err(|_| {
            SyncError::Storage(format!("{kind} store for vCenter {vcenter_id} is poisoned"))
        })?;
        store.store(db, batch, kind, stats)
    }

    /// Runs one maintenance sweep. Failures are logged and dropped so that
    /// neither the calling command nor the next scheduled sweep is affected.
    ///
    /// Rows deleted by the sweep are unknown to the cached stores, so they
    /// drop their loaded state whenever the sweep removed something or failed
    /// halfway.
    fn sweep(&self, sweep: Sweep) {
        let Ok(db) = self.connection.require() else {
            return;
        };
        let cleanup = DbCleanup::new(db);
        let result = match sweep {
            Sweep::Startup => cleanup.run_for_startup(),
            Sweep::Regular => cleanup.run_regular(),
        };
        match result {
            Ok(report) if report.total() == 0 => {}
            Ok(_) => self.stores.forget_state(),
            Err(e) => {
                error!("DB cleanup failed: {e}");
                self.stores.forget_state();
            }
        }
    }

    fn forget_cached(&mut self) {
        self.vcenters.clear();
        self.stores.clear();
    }
}

impl Default for DbRunner {
    fn default() -> Self {
        Self::new()
    }
}
