//! Schema migrations.
//!
//! Every applied migration leaves a marker row in [`MIGRATION_TABLE`]. The
//! pending set is the known sequence minus the marked versions, so applying
//! twice is a no-op.

use crate::connection::Db;
use crate::error::{DbError, DbResult};
use crate::schema;
use chrono::Utc;
use rusqlite::params;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Table holding one marker row per applied schema version.
pub const MIGRATION_TABLE: &str = "vspheredb_schema_migration";

/// A single, individually atomic schema change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

impl Migration {
    pub const fn new(version: u32, name: &'static str, sql: &'static str) -> Self {
        Self { version, name, sql }
    }
}

/// Schema state of one connection, checked against a known migration sequence.
pub struct Migrations<'a> {
    db: &'a Db,
    known: &'a [Migration],
}

impl<'a> Migrations<'a> {
    /// Inspects `db` against an explicit migration sequence.
    pub fn new(db: &'a Db, known: &'a [Migration]) -> Self {
        Self { db, known }
    }

    /// Inspects `db` against the built-in vSphereDB schema.
    pub fn for_db(db: &'a Db) -> Self {
        Self::new(db, schema::migrations())
    }

    /// Returns true if the store carries our migration marker table.
    pub fn has_schema(&self) -> DbResult<bool> {
        self.db.has_table(MIGRATION_TABLE)
    }

    /// Returns true if the store contains any user table at all.
    pub fn has_any_table(&self) -> DbResult<bool> {
        Ok(!self.db.table_names()?.is_empty())
    }

    /// Versions with a marker row.
    pub fn applied_versions(&self) -> DbResult<BTreeSet<u32>> {
        if !self.has_schema()? {
            return Ok(BTreeSet::new());
        }
        let mut stmt = self
            .db
            .connection()
            .prepare(&format!("SELECT schema_version FROM {MIGRATION_TABLE}"))?;
        let versions = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<BTreeSet<u32>, _>>()?;
        Ok(versions)
    }

    /// Highest applied version, 0 for a store without schema.
    pub fn current_version(&self) -> DbResult<u32> {
        Ok(self.applied_versions()?.last().copied().unwrap_or(0))
    }

    /// Known migrations without a marker row, in ascending version order.
    pub fn pending(&self) -> DbResult<Vec<&'a Migration>> {
        let applied = self.applied_versions()?;
        let mut pending: Vec<&'a Migration> = self
            .known
            .iter()
            .filter(|m| !applied.contains(&m.version))
            .collect();
        pending.sort_by_key(|m| m.version);
        pending.dedup_by_key(|m| m.version);
        Ok(pending)
    }

    pub fn has_pending_migrations(&self) -> DbResult<bool> {
        Ok(!self.pending()?.is_empty())
    }

    /// Applies all pending migrations in order and returns their versions.
    ///
    /// Stops at the first failure; migrations applied before it stay applied.
    pub fn apply_pending(&self) -> DbResult<Vec<u32>> {
        let mut applied = Vec::new();
        for migration in self.pending()? {
            self.apply(migration)?;
            applied.push(migration.version);
        }
        Ok(applied)
    }

    fn apply(&self, migration: &Migration) -> DbResult<()> {
        info!(
            "Applying schema migration {} ({})",
            migration.version, migration.name
        );
        let fail = |source: rusqlite::Error| DbError::Migration {
            version: migration.version,
            name: migration.name,
            source,
        };

        let tx = self.db.connection().unchecked_transaction().map_err(fail)?;
        tx.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {MIGRATION_TABLE} (
                schema_version INTEGER NOT NULL PRIMARY KEY,
                migration_time INTEGER NOT NULL
            )"
        ))
        .map_err(fail)?;
        tx.execute_batch(migration.sql).map_err(fail)?;
        tx.execute(
            &format!(
                "INSERT INTO {MIGRATION_TABLE} (schema_version, migration_time) VALUES (?1, ?2)"
            ),
            params![migration.version, Utc::now().timestamp_millis()],
        )
        .map_err(fail)?;
        tx.commit().map_err(fail)?;

        debug!("Schema migration {} applied", migration.version);
        Ok(())
    }
}
