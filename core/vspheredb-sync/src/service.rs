//! Single-worker command queue around [`DbRunner`].
//!
//! Commands from any number of [`DbRunnerHandle`]s and the cleanup timer
//! end up in one queue and are executed strictly one after the other, so a
//! scheduled sweep can never overlap a `configure` or `clear`.

use crate::error::{SyncError, SyncResult};
use crate::runner::DbRunner;
use crate::status::ProcessStatus;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};
use vspheredb_db::DbConfig;
use vspheredb_types::{ResultBatch, ResultKind, SyncStats, VCenterId};

/// Default interval between scheduled cleanup sweeps.
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(3600);

const MIN_CLEANUP_INTERVAL: Duration = Duration::from_millis(10);

/// Configuration of the worker.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Commands that may wait in the queue before senders are held back.
    pub queue_capacity: usize,
    /// Interval between scheduled cleanup sweeps.
    pub cleanup_interval: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 64,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
        }
    }
}

/// Commands understood by the worker.
#[derive(Debug)]
pub enum DbCommand {
    SetDbConfig {
        config: DbConfig,
        reply: oneshot::Sender<SyncResult<()>>,
    },
    ClearDbConfig {
        reply: oneshot::Sender<()>,
    },
    RunDbCleanup {
        reply: oneshot::Sender<SyncResult<()>>,
    },
    HasPendingMigrations {
        reply: oneshot::Sender<SyncResult<bool>>,
    },
    ProcessSyncTaskResult {
        vcenter_id: VCenterId,
        batch: ResultBatch,
        task_label: String,
        kind: ResultKind,
        reply: oneshot::Sender<SyncStats>,
    },
    /// Sent by the cleanup timer.
    ScheduledCleanup,
    /// Closes the connection and stops the worker.
    Shutdown,
}

/// Cloneable handle used to send commands to the worker.
#[derive(Clone)]
pub struct DbRunnerHandle {
    tx: mpsc::Sender<DbCommand>,
    status: ProcessStatus,
}

impl DbRunnerHandle {
    /// Status label of the runner behind this handle.
    pub fn status(&self) -> &ProcessStatus {
        &self.status
    }

    pub async fn set_db_config(&self, config: DbConfig) -> SyncResult<()> {
        self.request(|reply| DbCommand::SetDbConfig { config, reply })
            .await?
    }

    pub async fn clear_db_config(&self) -> SyncResult<()> {
        self.request(|reply| DbCommand::ClearDbConfig { reply }).await
    }

    pub async fn run_db_cleanup(&self) -> SyncResult<()> {
        self.request(|reply| DbCommand::RunDbCleanup { reply }).await?
    }

    pub async fn has_pending_migrations(&self) -> SyncResult<bool> {
        self.request(|reply| DbCommand::HasPendingMigrations { reply })
            .await?
    }

    /// Stores a task result. Only fails if the worker is gone.
    pub async fn process_sync_task_result(
        &self,
        vcenter_id: VCenterId,
        batch: ResultBatch,
        task_label: impl Into<String>,
        kind: ResultKind,
    ) -> SyncResult<SyncStats> {
        let task_label = task_label.into();
        self.request(|reply| DbCommand::ProcessSyncTaskResult {
            vcenter_id,
            batch,
            task_label,
            kind,
            reply,
        })
        .await
    }

    /// Asks the worker to close the connection and stop.
    pub async fn shutdown(&self) -> SyncResult<()> {
        self.tx
            .send(DbCommand::Shutdown)
            .await
            .map_err(|_| SyncError::ChannelClosed)
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> DbCommand,
    ) -> SyncResult<T> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(command(reply))
            .await
            .map_err(|_| SyncError::ChannelClosed)?;
        response.await.map_err(|_| SyncError::ChannelClosed)
    }
}

/// Moves `runner` onto a dedicated blocking worker and starts the cleanup timer.
///
/// Must be called from within a tokio runtime. The worker stops once every
/// handle is dropped or [`DbRunnerHandle::shutdown`] is called; it closes the
/// connection on its way out.
pub fn spawn_db_runner(runner: DbRunner, config: RunnerConfig) -> (DbRunnerHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
    let status = runner.status().clone();
    spawn_cleanup_timer(tx.downgrade(), config.cleanup_interval);
    let worker = tokio::task::spawn_blocking(move || run_worker(runner, rx));
    (DbRunnerHandle { tx, status }, worker)
}

fn run_worker(mut runner: DbRunner, mut rx: mpsc::Receiver<DbCommand>) {
    info!("DB runner started");
    while let Some(command) = rx.blocking_recv() {
        match command {
            DbCommand::SetDbConfig { config, reply } => {
                let _ = reply.send(runner.set_db_config(&config));
            }
            DbCommand::ClearDbConfig { reply } => {
                runner.clear_db_config();
                let _ = reply.send(());
            }
            DbCommand::RunDbCleanup { reply } => {
                let _ = reply.send(runner.run_db_cleanup());
            }
            DbCommand::HasPendingMigrations { reply } => {
                let _ = reply.send(runner.has_pending_migrations());
            }
            DbCommand::ProcessSyncTaskResult {
                vcenter_id,
                batch,
                task_label,
                kind,
                reply,
            } => {
                let stats = runner.process_sync_task_result(vcenter_id, &batch, &task_label, &kind);
                let _ = reply.send(stats);
            }
            DbCommand::ScheduledCleanup => runner.run_scheduled_cleanup(),
            DbCommand::Shutdown => break,
        }
    }
    runner.clear_db_config();
    info!("DB runner stopped");
}

fn spawn_cleanup_timer(tx: mpsc::WeakSender<DbCommand>, period: Duration) -> JoinHandle<()> {
    let period = period.max(MIN_CLEANUP_INTERVAL);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let Some(tx) = tx.upgrade() else {
                break;
            };
            if tx.send(DbCommand::ScheduledCleanup).await.is_err() {
                break;
            }
        }
        debug!("DB cleanup timer stopped");
    })
}
