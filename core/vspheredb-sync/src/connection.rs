//! Lifecycle of the single DB connection.

use crate::error::{SyncError, SyncResult};
use tracing::{debug, info};
use vspheredb_db::{Db, DbConfig, DbResult};

/// Where the connection lifecycle currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Owns the one live [`Db`] handle.
///
/// Everything else borrows the handle through [`DbConnection::require`].
#[derive(Debug)]
pub struct DbConnection {
    state: ConnectionState,
    db: Option<Db>,
}

impl DbConnection {
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            db: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Replaces the current connection with a new one.
    ///
    /// An existing connection is torn down first and any error while doing so
    /// is dropped: once a new configuration arrives the old connection is not
    /// used again. On failure the manager ends up disconnected.
    pub fn connect(&mut self, config: &DbConfig) -> SyncResult<()> {
        if let Err(e) = self.disconnect() {
            debug!("Ignoring error while dropping previous DB connection: {e}");
        }

        self.state = ConnectionState::Connecting;
        match Db::open(config) {
            Ok(db) => {
                info!("Connected to DB at {}", db.path());
                self.db = Some(db);
                self.state = ConnectionState::Connected;
                Ok(())
            }
            Err(e) => {
                self.state = ConnectionState::Disconnected;
                Err(SyncError::Connection(e.to_string()))
            }
        }
    }

    /// Closes the connection, if any. Calling it while disconnected is a no-op.
    ///
    /// The manager is disconnected afterwards even if closing failed; the
    /// close error is returned for the caller to log.
    pub fn disconnect(&mut self) -> DbResult<()> {
        self.state = ConnectionState::Disconnected;
        match self.db.take() {
            Some(db) => db.close(),
            None => Ok(()),
        }
    }

    /// Borrows the live connection.
    pub fn require(&self) -> SyncResult<&Db> {
        self.db
            .as_ref()
            .ok_or(SyncError::NotConnected("no DB connection has been configured"))
    }
}

impl Default for DbConnection {
    fn default() -> Self {
        Self::new()
    }
}
