//! HTTP middleware module.
//!
//! This module provides HTTP-level middleware for:
//! - CORS configuration and origin enforcement
//! - Security headers
//! - Request body size limits
//! - Reporting server errors
//!
//! # Example
//!
//! ```ignore
//! use axum_helpers::http::{create_cors_layer, security_headers, CorsPolicy};
//!
//! let app = Router::new()
//!     .layer(create_cors_layer(&CorsPolicy::development()))
//!     .layer(axum::middleware::from_fn(security_headers));
//! ```

pub mod cors;
pub mod reporting;
pub mod security;

use axum::extract::DefaultBodyLimit;
use tower_http::limit::RequestBodyLimitLayer;

/// Maximum accepted request body (10 MB)
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

pub use cors::{CorsPolicy, create_cors_layer, enforce_allowed_origin};
pub use reporting::report_server_errors;
pub use security::security_headers;

/// Rejects bodies over `limit` bytes with 413.
///
/// Declared lengths are checked before any handler runs; streamed bodies are
/// cut off once they pass the limit.
pub fn body_limit_layer(limit: usize) -> RequestBodyLimitLayer {
    RequestBodyLimitLayer::new(limit)
}

/// Raise axum's own extractor limit to match [`body_limit_layer`].
pub fn extractor_body_limit(limit: usize) -> DefaultBodyLimit {
    DefaultBodyLimit::max(limit)
}
