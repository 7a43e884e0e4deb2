//! Maintenance sweeps.

use crate::connection::Db;
use crate::error::DbResult;
use crate::schema::{QUICK_STATS_PARENTS, VCENTER_SCOPED_TABLES};
use tracing::{debug, info};

/// What a sweep removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Rows belonging to a vCenter that no longer exists.
    pub orphaned_rows: usize,
    /// Quick stats rows whose object is gone.
    pub stale_quick_stats: usize,
}

impl CleanupReport {
    pub fn total(&self) -> usize {
        self.orphaned_rows + self.stale_quick_stats
    }
}

/// Runs maintenance against a borrowed connection.
pub struct DbCleanup<'a> {
    db: &'a Db,
}

impl<'a> DbCleanup<'a> {
    pub fn new(db: &'a Db) -> Self {
        Self { db }
    }

    /// Sweep run once after connecting: the regular sweep plus `PRAGMA optimize`.
    pub fn run_for_startup(&self) -> DbResult<CleanupReport> {
        let report = self.run_regular()?;
        self.db.connection().execute_batch("PRAGMA optimize")?;
        Ok(report)
    }

    /// Periodic sweep.
    pub fn run_regular(&self) -> DbResult<CleanupReport> {
        let report = CleanupReport {
            orphaned_rows: self.remove_orphans()?,
            stale_quick_stats: self.remove_stale_quick_stats()?,
        };
        if report.total() > 0 {
            info!(
                "DB cleanup removed {} orphaned and {} stale quick stats rows",
                report.orphaned_rows, report.stale_quick_stats
            );
        } else {
            debug!("DB cleanup: nothing to do");
        }
        Ok(report)
    }

    fn remove_orphans(&self) -> DbResult<usize> {
        let mut removed = 0;
        for table in VCENTER_SCOPED_TABLES {
            removed += self.db.connection().execute(
                &format!("DELETE FROM {table} WHERE vcenter_id NOT IN (SELECT id FROM vcenter)"),
                [],
            )?;
        }
        Ok(removed)
    }

    fn remove_stale_quick_stats(&self) -> DbResult<usize> {
        let mut removed = 0;
        for (stats, parent) in QUICK_STATS_PARENTS {
            removed += self.db.connection().execute(
                &format!(
                    "DELETE FROM {stats} WHERE NOT EXISTS (
                        SELECT 1 FROM {parent} p
                        WHERE p.vcenter_id = {stats}.vcenter_id AND p.moref = {stats}.moref
                    )"
                ),
                [],
            )?;
        }
        Ok(removed)
    }
}
