//! vSphereDB sync daemon
//!
//! Hosts the DB runner: owns the database connection, keeps the schema up
//! to date and runs the periodic cleanup. The current runner activity is
//! published over HTTP.
//!
//! Usage:
//!   vspheredb-daemon --db /var/lib/vspheredb/vspheredb.sqlite --http-port 4080

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use vspheredb_daemon::{build_router, DaemonArgs};
use vspheredb_sync::{spawn_db_runner, DbRunner};

#[tokio::main]
async fn main() -> Result<()> {
    let args = DaemonArgs::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    info!("vSphereDB daemon starting...");
    let (runner, worker) = spawn_db_runner(DbRunner::new(), args.runner_config());

    match args.db_config() {
        Some(config) => {
            info!("Using DB at {}", config.path.display());
            // A failing DB is reported through the status label; keep serving.
            if let Err(e) = runner.set_db_config(config).await {
                error!("DB is not usable: {e}");
            }
        }
        None => warn!("No DB configured, the runner stays idle"),
    }

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", args.http_port))
        .await
        .context("Failed to bind HTTP port")?;
    info!("HTTP status endpoint listening on port {}", args.http_port);
    let app = build_router(runner.status().clone());
    let server = tokio::spawn(async move { axum::serve(listener, app).await });

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutting down");

    server.abort();
    runner.shutdown().await.context("DB runner already stopped")?;
    worker.await.context("DB runner panicked")?;
    info!("vSphereDB daemon stopped");
    Ok(())
}
