mod common;

use axum::http::StatusCode;
use blog_api::config::Environment;
use common::{RecordingReporter, app_with, body_json, get, test_config};
use database::mongodb::{ConnectionMonitor, ConnectionState};
use observability::NoopReporter;
use std::sync::Arc;

async fn health_app(monitor: ConnectionMonitor) -> axum::Router {
    app_with(
        test_config(Environment::Development),
        monitor,
        Arc::new(NoopReporter),
        Vec::new(),
    )
    .await
}

#[tokio::test]
async fn test_health_ok_when_connected() {
    let monitor = ConnectionMonitor::new();
    monitor.set(ConnectionState::Connected);
    let app = health_app(monitor).await;

    let response = get(&app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["environment"], "development");
    assert_eq!(body["database"]["status"], "connected");
    assert_eq!(body["database"]["readyState"], 1);
    assert!(body["uptime"].as_f64().unwrap() >= 0.0);
    assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
    assert!(body["memory"]["used"].as_str().unwrap().ends_with(" MB"));
    assert!(body["memory"]["total"].as_str().unwrap().ends_with(" MB"));
}

#[tokio::test]
async fn test_health_degraded_when_disconnected() {
    let app = health_app(ConnectionMonitor::new()).await;

    let response = get(&app, "/health").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = body_json(response).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"]["status"], "disconnected");
    assert_eq!(body["database"]["readyState"], 0);
}

#[tokio::test]
async fn test_health_reports_raw_ready_state_while_connecting() {
    let monitor = ConnectionMonitor::new();
    monitor.set(ConnectionState::Connecting);
    let app = health_app(monitor).await;

    let response = get(&app, "/health").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = body_json(response).await;
    assert_eq!(body["database"]["status"], "disconnected");
    assert_eq!(body["database"]["readyState"], 2);
}

#[tokio::test]
async fn test_health_is_idempotent_and_live() {
    let monitor = ConnectionMonitor::new();
    monitor.set(ConnectionState::Connected);
    let app = health_app(monitor.clone()).await;

    for _ in 0..3 {
        let response = get(&app, "/health").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    // The snapshot is computed per request, never cached
    monitor.set(ConnectionState::Disconnected);
    let response = get(&app, "/health").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    monitor.set(ConnectionState::Connected);
    assert_eq!(get(&app, "/health").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_degraded_health_is_not_reported_as_an_error() {
    let reporter = Arc::new(RecordingReporter::default());
    let app = app_with(
        test_config(Environment::Production),
        ConnectionMonitor::new(),
        reporter.clone(),
        Vec::new(),
    )
    .await;

    for _ in 0..3 {
        let response = get(&app, "/health").await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
    assert!(reporter.events().is_empty());
}
