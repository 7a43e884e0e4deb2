//! Per-task sync statistics.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of storing one sync task result.
///
/// Stores mutate the counters while reconciling a batch; once handed back to
/// the caller the record is no longer modified.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStats {
    label: String,
    /// Objects seen for the first time.
    pub created: u64,
    /// Objects whose stored state changed.
    pub updated: u64,
    /// Objects no longer reported and therefore removed.
    pub removed: u64,
    /// Objects reported without any change.
    pub unchanged: u64,
    /// Objects that could not be stored.
    pub failed: u64,
}

impl SyncStats {
    /// Creates empty stats for the given task label.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    /// Returns the task label.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn inc_created(&mut self) {
        self.created += 1;
    }

    pub fn inc_updated(&mut self) {
        self.updated += 1;
    }

    pub fn inc_removed(&mut self) {
        self.removed += 1;
    }

    pub fn inc_unchanged(&mut self) {
        self.unchanged += 1;
    }

    pub fn inc_failed(&mut self) {
        self.failed += 1;
    }

    /// Number of objects accounted for in any category.
    pub fn total(&self) -> u64 {
        self.created + self.updated + self.removed + self.unchanged + self.failed
    }

    /// Returns true if the store was modified.
    pub fn has_changes(&self) -> bool {
        self.created + self.updated + self.removed > 0
    }

    /// One-line summary suitable for the log.
    pub fn log_message(&self) -> String {
        if self.has_changes() || self.failed > 0 {
            let mut parts = Vec::new();
            if self.created > 0 {
                parts.push(format!("{} created", self.created));
            }
            if self.updated > 0 {
                parts.push(format!("{} modified", self.updated));
            }
            if self.removed > 0 {
                parts.push(format!("{} deleted", self.removed));
            }
            if self.failed > 0 {
                parts.push(format!("{} failed", self.failed));
            }
            format!("{}: {}", self.label, parts.join(", "))
        } else {
            format!("{}: no changes", self.label)
        }
    }
}

impl fmt::Display for SyncStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.log_message())
    }
}
