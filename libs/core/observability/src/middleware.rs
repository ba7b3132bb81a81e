//! Axum middleware for per-request performance monitoring.

use axum::{
    extract::{Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::time::Duration;
use tracing::{info, warn};

use crate::request::{CompletedRequest, RequestContext};

pub static X_RESPONSE_TIME: HeaderName = HeaderName::from_static("x-response-time");

/// Default slow-request threshold (1 second)
pub const DEFAULT_SLOW_REQUEST_THRESHOLD: Duration = Duration::from_millis(1000);

/// Settings for [`performance_monitor`].
#[derive(Debug, Clone)]
pub struct PerformanceConfig {
    /// Requests slower than this are logged as warnings
    pub slow_request_threshold: Duration,
    /// Log every request at info level (development)
    pub log_every_request: bool,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            slow_request_threshold: DEFAULT_SLOW_REQUEST_THRESHOLD,
            log_every_request: false,
        }
    }
}

impl PerformanceConfig {
    pub fn is_slow(&self, elapsed: Duration) -> bool {
        elapsed > self.slow_request_threshold
    }
}

/// Times the rest of the stack and stamps `X-Response-Time` on every response.
///
/// Slow requests produce exactly one `Slow Request Detected` warning. With
/// `log_every_request` each request is also logged at info level.
///
/// # Example
///
/// ```rust,ignore
/// use axum::{Router, middleware};
/// use observability::{PerformanceConfig, performance_monitor};
///
/// let app = Router::new()
///     .route("/", get(handler))
///     .layer(middleware::from_fn_with_state(PerformanceConfig::default(), performance_monitor));
/// ```
pub async fn performance_monitor(
    State(config): State<PerformanceConfig>,
    request: Request,
    next: Next,
) -> Response {
    let context = RequestContext::from_request(&request);

    let mut response = next.run(request).await;

    let completed = context.finish(response.status());
    if let Ok(value) = HeaderValue::from_str(&completed.response_time()) {
        response.headers_mut().insert(X_RESPONSE_TIME.clone(), value);
    }

    if config.is_slow(completed.elapsed) {
        log_slow_request(&completed);
    }
    if config.log_every_request {
        info!(
            method = %completed.context.method,
            url = %completed.context.url,
            response_time = %completed.response_time(),
            status_code = completed.status.as_u16(),
            "Request"
        );
    }

    response
}

fn log_slow_request(completed: &CompletedRequest) {
    warn!(
        method = %completed.context.method,
        url = %completed.context.url,
        response_time = %completed.response_time(),
        elapsed_ms = completed.elapsed_ms() as u64,
        status_code = completed.status.as_u16(),
        ip = completed.context.client_ip.as_deref().unwrap_or("unknown"),
        user_agent = completed.context.user_agent.as_deref().unwrap_or(""),
        "Slow Request Detected"
    );
}
