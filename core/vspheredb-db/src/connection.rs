//! The live database handle.

use crate::config::DbConfig;
use crate::error::{DbError, DbResult};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::time::Duration;
use tracing::debug;

/// A single open connection to the vSphereDB store.
///
/// Owned by exactly one party; everyone else borrows it.
#[derive(Debug)]
pub struct Db {
    conn: Connection,
    path: String,
}

impl Db {
    /// Opens a connection and verifies the store answers queries.
    ///
    /// SQLite opens lazily, so a probe query is issued to surface unreadable
    /// files or directories right away.
    pub fn open(config: &DbConfig) -> DbResult<Self> {
        let path = config.path.display().to_string();
        let open_err = |source: rusqlite::Error| DbError::Open {
            path: path.clone(),
            source,
        };

        debug!("Connecting to DB at {path}");
        let conn = if config.is_in_memory() {
            Connection::open_in_memory()
        } else {
            let mut flags = OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX
                | OpenFlags::SQLITE_OPEN_URI;
            if config.create_if_missing {
                flags |= OpenFlags::SQLITE_OPEN_CREATE;
            }
            Connection::open_with_flags(&config.path, flags)
        }
        .map_err(&open_err)?;

        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))
            .map_err(&open_err)?;
        conn.pragma_update(None, "foreign_keys", config.foreign_keys)
            .map_err(&open_err)?;
        conn.query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| {
            row.get::<_, i64>(0)
        })
        .map_err(&open_err)?;

        Ok(Self { conn, path })
    }

    /// Returns the underlying SQLite connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Path this connection was opened with.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Closes the connection, reporting any error SQLite raises on close.
    pub fn close(self) -> DbResult<()> {
        debug!("Closing DB connection to {}", self.path);
        self.conn.close().map_err(|(_, e)| DbError::Close(e))
    }

    /// Names of all user tables, sorted.
    pub fn table_names(&self) -> DbResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
             ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    /// Returns true if a table with the given name exists.
    pub fn has_table(&self, name: &str) -> DbResult<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![name],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }
}
