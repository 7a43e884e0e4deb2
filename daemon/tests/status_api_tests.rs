use clap::Parser;
use std::time::Duration;
use vspheredb_daemon::{build_router, DaemonArgs, StatusResponse};
use vspheredb_sync::{Activity, ProcessStatus};

/// Spin up the HTTP server on an OS-assigned port, returning the base URL.
async fn spawn_test_server(status: ProcessStatus) -> String {
    let app = build_router(status);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://127.0.0.1:{}", port)
}

// ── Status endpoint ──────────────────────────────────────────────

#[tokio::test]
async fn status_endpoint_reports_idle_runner() {
    let base = spawn_test_server(ProcessStatus::new()).await;
    let resp = reqwest::get(format!("{}/api/v1/status", base))
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: StatusResponse = resp.json().await.unwrap();
    assert_eq!(body.title, "vspheredb::DB::idle");
    assert_eq!(body.activity, "idle");
}

#[tokio::test]
async fn status_endpoint_follows_activity() {
    let status = ProcessStatus::new();
    let base = spawn_test_server(status.clone()).await;

    status.set_resting(Activity::Connected);
    let _storing = status.enter(Activity::Storing("hosts-sync".to_string()));

    let body: serde_json::Value = reqwest::get(format!("{}/api/v1/status", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["title"], "vspheredb::DB::storing hosts-sync");
    assert_eq!(body["activity"], "storing hosts-sync");
}

#[tokio::test]
async fn status_endpoint_content_type_is_json() {
    let base = spawn_test_server(ProcessStatus::new()).await;
    let resp = reqwest::get(format!("{}/api/v1/status", base))
        .await
        .unwrap();

    let content_type = resp.headers().get("content-type").unwrap().to_str().unwrap();
    assert!(content_type.contains("application/json"));
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let base = spawn_test_server(ProcessStatus::new()).await;
    let resp = reqwest::get(format!("{}/api/v1/nonexistent", base))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

// ── Command line ─────────────────────────────────────────────────

#[test]
fn defaults_leave_runner_unconfigured() {
    let args = DaemonArgs::try_parse_from(["vspheredb-daemon"]).unwrap();
    assert!(args.db_config().is_none());
    assert_eq!(args.http_port, 4080);
    assert_eq!(args.runner_config().cleanup_interval, Duration::from_secs(3600));
}

#[test]
fn db_flags_build_db_config() {
    let args = DaemonArgs::try_parse_from([
        "vspheredb-daemon",
        "--db",
        "/tmp/vspheredb.sqlite",
        "--create",
        "false",
        "--cleanup-interval",
        "60",
    ])
    .unwrap();

    let config = args.db_config().unwrap();
    assert_eq!(config.path.to_str(), Some("/tmp/vspheredb.sqlite"));
    assert!(!config.create_if_missing);
    assert_eq!(args.runner_config().cleanup_interval, Duration::from_secs(60));
}
