use axum::{
    extract::{Request, State},
    http::{HeaderValue, Method, StatusCode, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

use crate::errors::error_response;

/// Origins allowed while developing against the local frontend dev servers.
pub const DEVELOPMENT_ORIGINS: &[&str] = &["http://localhost:3000", "http://localhost:5173"];

pub const CORS_REJECTION_MESSAGE: &str = "Not allowed by CORS";

/// Explicit allow-list of browser origins.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allowed_origins: Arc<[HeaderValue]>,
}

impl CorsPolicy {
    /// Build a policy from origin strings. Blank or malformed entries are skipped.
    pub fn new<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed_origins = origins
            .into_iter()
            .filter_map(|origin| {
                let origin = origin.as_ref().trim().trim_end_matches('/');
                if origin.is_empty() {
                    return None;
                }
                match HeaderValue::from_str(origin) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        warn!(origin, "Ignoring invalid CORS origin");
                        None
                    }
                }
            })
            .collect();

        Self { allowed_origins }
    }

    pub fn development() -> Self {
        Self::new(DEVELOPMENT_ORIGINS)
    }

    pub fn origins(&self) -> &[HeaderValue] {
        &self.allowed_origins
    }

    pub fn is_allowed(&self, origin: &HeaderValue) -> bool {
        self.allowed_origins.iter().any(|allowed| allowed == origin)
    }
}

/// Creates a CORS layer for the given allow-list.
///
/// # Returns
/// A configured `CorsLayer` with:
/// - Only the listed origins
/// - Common HTTP methods (GET, POST, PUT, DELETE, PATCH, OPTIONS)
/// - Common headers (Content-Type, Authorization, Accept, Cookie)
/// - Credentials allowed
/// - 1 hour max age
pub fn create_cors_layer(policy: &CorsPolicy) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(policy.origins().iter().cloned()))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            header::COOKIE,
        ])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

/// Rejects requests whose `Origin` header is not on the allow-list.
///
/// Requests without an `Origin` header (same-origin navigation, curl, health
/// probes) pass through untouched.
pub async fn enforce_allowed_origin(
    State(policy): State<CorsPolicy>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(origin) = request.headers().get(header::ORIGIN) {
        if !policy.is_allowed(origin) {
            warn!(
                origin = origin.to_str().unwrap_or("<non-ascii>"),
                path = request.uri().path(),
                "Rejected request from disallowed origin"
            );
            return error_response(StatusCode::FORBIDDEN, CORS_REJECTION_MESSAGE);
        }
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_normalizes_entries() {
        let policy = CorsPolicy::new(["https://blog.example.com/", " ", "https://admin.example.com"]);
        assert_eq!(policy.origins().len(), 2);
        assert!(policy.is_allowed(&HeaderValue::from_static("https://blog.example.com")));
        assert!(!policy.is_allowed(&HeaderValue::from_static("https://evil.example.com")));
    }

    #[test]
    fn test_development_origins() {
        let policy = CorsPolicy::development();
        assert!(policy.is_allowed(&HeaderValue::from_static("http://localhost:5173")));
        assert!(policy.is_allowed(&HeaderValue::from_static("http://localhost:3000")));
        assert!(!policy.is_allowed(&HeaderValue::from_static("http://localhost:8080")));
    }

    #[test]
    fn test_empty_policy_allows_nothing() {
        let policy = CorsPolicy::new(Vec::<String>::new());
        assert!(!policy.is_allowed(&HeaderValue::from_static("https://blog.example.com")));
    }
}
