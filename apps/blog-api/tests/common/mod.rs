#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, Bytes},
    http::{Request, Response},
};
use blog_api::{
    AppState, build_router,
    api::DomainRoutes,
    config::{Config, Environment, SentryConfig},
};
use core_config::server::ServerConfig;
use database::mongodb::{ConnectionMonitor, MongoConfig};
use http_body_util::BodyExt;
use mongodb::Client;
use observability::{ErrorEvent, ErrorReporter, NoopReporter, SharedMemorySampler, SharedReporter};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tower::ServiceExt;

pub fn test_config(environment: Environment) -> Config {
    Config {
        environment,
        server: ServerConfig::default(),
        mongodb: MongoConfig::new("mongodb://127.0.0.1:1/blog"),
        frontend_origins: Vec::new(),
        slow_request_threshold: Duration::from_millis(1000),
        memory_monitor_interval: Duration::from_secs(300),
        sentry: SentryConfig {
            dsn: None,
            traces_sample_rate: 0.1,
            release: "blog-api@test".to_string(),
        },
        uploads_dir: std::env::temp_dir().join("blog-api-test-uploads"),
        client_dist_dir: PathBuf::from("/nonexistent/client/dist"),
    }
}

/// State backed by a client that is never contacted; the monitor decides
/// what the health endpoint sees.
pub async fn test_state(
    config: Config,
    monitor: ConnectionMonitor,
    reporter: SharedReporter,
) -> AppState {
    let client = Client::with_uri_str("mongodb://127.0.0.1:1/blog")
        .await
        .unwrap();

    AppState {
        config: Arc::new(config),
        db: client.database("blog"),
        mongo_client: client,
        monitor,
        reporter,
        memory: SharedMemorySampler::new(),
        started_at: Instant::now(),
    }
}

pub async fn app(config: Config) -> Router {
    app_with(config, ConnectionMonitor::new(), Arc::new(NoopReporter), Vec::new()).await
}

pub async fn app_with(
    config: Config,
    monitor: ConnectionMonitor,
    reporter: SharedReporter,
    domain_routes: DomainRoutes,
) -> Router {
    build_router(test_state(config, monitor, reporter).await, domain_routes)
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

pub async fn body_bytes(response: Response<Body>) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Reporter that keeps every event for inspection.
#[derive(Default)]
pub struct RecordingReporter {
    pub events: Mutex<Vec<ErrorEvent>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<ErrorEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ErrorReporter for RecordingReporter {
    fn report(&self, event: ErrorEvent) {
        self.events.lock().unwrap().push(event);
    }
}
