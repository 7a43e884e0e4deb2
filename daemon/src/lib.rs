//! Command line and HTTP status API of the vSphereDB daemon.

use axum::{extract::State, response::Json, routing::get, Router};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use vspheredb_db::DbConfig;
use vspheredb_sync::{ProcessStatus, RunnerConfig, TITLE_PREFIX};

#[derive(Parser, Debug, Clone)]
#[command(name = "vspheredb-daemon")]
#[command(about = "vSphereDB sync daemon")]
pub struct DaemonArgs {
    /// SQLite database file; without it the runner stays idle
    #[arg(short, long)]
    pub db: Option<PathBuf>,

    /// Create the database file if it does not exist
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub create: bool,

    /// Seconds between scheduled DB cleanup sweeps
    #[arg(long, default_value = "3600")]
    pub cleanup_interval: u64,

    /// HTTP API port for the status endpoint
    #[arg(long, default_value = "4080")]
    pub http_port: u16,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl DaemonArgs {
    /// Connection settings, if a database was given.
    pub fn db_config(&self) -> Option<DbConfig> {
        self.db
            .as_ref()
            .map(|path| DbConfig::new(path).create_if_missing(self.create))
    }

    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            cleanup_interval: Duration::from_secs(self.cleanup_interval),
            ..RunnerConfig::default()
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StatusResponse {
    /// Process title, e.g. `vspheredb::DB::connected`.
    pub title: String,
    /// Bare activity label.
    pub activity: String,
}

impl StatusResponse {
    pub fn from_status(status: &ProcessStatus) -> Self {
        let activity = status.current();
        Self {
            title: format!("{TITLE_PREFIX}{activity}"),
            activity: activity.to_string(),
        }
    }
}

async fn status_handler(State(status): State<ProcessStatus>) -> Json<StatusResponse> {
    Json(StatusResponse::from_status(&status))
}

/// Build the HTTP API router reporting the given status.
pub fn build_router(status: ProcessStatus) -> Router {
    Router::new()
        .route("/api/v1/status", get(status_handler))
        .with_state(status)
}
