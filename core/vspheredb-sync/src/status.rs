//! Process status label.
//!
//! The label tells operators what the DB runner is doing right now. Each
//! command enters an [`Activity`] and the returned [`ActivityGuard`] falls
//! back to the resting activity when dropped, whether the command succeeded
//! or not.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;

/// Prefix of the rendered process title.
pub const TITLE_PREFIX: &str = "vspheredb::DB::";

/// What the DB runner is currently doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activity {
    /// No DB configured.
    Idle,
    /// Connected and waiting for commands.
    Connected,
    /// The last `configure` failed.
    Failing,
    Connecting,
    CheckingMigrations,
    Migrating,
    Cleanup,
    /// Storing the result of the named task.
    Storing(String),
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Activity::Idle => f.write_str("idle"),
            Activity::Connected => f.write_str("connected"),
            Activity::Failing => f.write_str("failing"),
            Activity::Connecting => f.write_str("connecting"),
            Activity::CheckingMigrations => f.write_str("checking migrations"),
            Activity::Migrating => f.write_str("migrating"),
            Activity::Cleanup => f.write_str("cleanup"),
            Activity::Storing(label) => write!(f, "storing {label}"),
        }
    }
}

struct StatusInner {
    current: watch::Sender<Activity>,
    resting: Mutex<Activity>,
}

/// Shared, externally readable status of the DB runner.
#[derive(Clone)]
pub struct ProcessStatus {
    inner: Arc<StatusInner>,
}

impl ProcessStatus {
    pub fn new() -> Self {
        let (current, _) = watch::channel(Activity::Idle);
        Self {
            inner: Arc::new(StatusInner {
                current,
                resting: Mutex::new(Activity::Idle),
            }),
        }
    }

    /// The activity being published right now.
    pub fn current(&self) -> Activity {
        self.inner.current.borrow().clone()
    }

    /// Rendered process title, e.g. `vspheredb::DB::connected`.
    pub fn title(&self) -> String {
        format!("{TITLE_PREFIX}{}", self.current())
    }

    /// Receiver notified on every status change.
    pub fn subscribe(&self) -> watch::Receiver<Activity> {
        self.inner.current.subscribe()
    }

    /// Sets the activity shown between commands and publishes it.
    pub fn set_resting(&self, activity: Activity) {
        *self
            .inner
            .resting
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = activity.clone();
        self.inner.current.send_replace(activity);
    }

    /// Publishes `activity` until the returned guard is dropped.
    #[must_use = "the activity ends when the guard is dropped"]
    pub fn enter(&self, activity: Activity) -> ActivityGuard {
        self.inner.current.send_replace(activity);
        ActivityGuard {
            status: self.clone(),
        }
    }

    fn restore(&self) {
        let resting = self
            .inner
            .resting
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        self.inner.current.send_replace(resting);
    }
}

impl Default for ProcessStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessStatus")
            .field("current", &self.current())
            .finish()
    }
}

/// Restores the resting activity on drop.
pub struct ActivityGuard {
    status: ProcessStatus,
}

impl ActivityGuard {
    /// Moves the guarded command on to its next step.
    pub fn switch(&self, activity: Activity) {
        self.status.inner.current.send_replace(activity);
    }
}

impl Drop for ActivityGuard {
    fn drop(&mut self) {
        self.status.restore();
    }
}
