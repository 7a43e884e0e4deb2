//! Connection configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Path understood by SQLite as a private in-memory database.
const IN_MEMORY_PATH: &str = ":memory:";

/// Configuration for a DB connection, as sent with `configure`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbConfig {
    /// Database file, or `:memory:`.
    pub path: PathBuf,
    /// Create the database file if it does not exist yet.
    #[serde(default = "default_create_if_missing")]
    pub create_if_missing: bool,
    /// Busy timeout (ms) applied to the connection.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// Enforce foreign key constraints.
    #[serde(default = "default_foreign_keys")]
    pub foreign_keys: bool,
}

fn default_create_if_missing() -> bool {
    true
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_foreign_keys() -> bool {
    true
}

impl DbConfig {
    /// Configuration for a database file with default options.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            create_if_missing: default_create_if_missing(),
            busy_timeout_ms: default_busy_timeout_ms(),
            foreign_keys: default_foreign_keys(),
        }
    }

    /// Configuration for a private in-memory database.
    pub fn in_memory() -> Self {
        Self::new(IN_MEMORY_PATH)
    }

    /// Sets whether a missing database file is created.
    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    /// Sets the busy timeout.
    pub fn busy_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.busy_timeout_ms = timeout_ms;
        self
    }

    /// Returns true if this configuration points to an in-memory database.
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == IN_MEMORY_PATH
    }
}
