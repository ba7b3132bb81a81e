//! # Axum Helpers
//!
//! Utilities and middleware shared by the HTTP services.
//!
//! ## Modules
//!
//! - **[`server`]**: Serving with connect info, graceful shutdown, cleanup
//! - **[`http`]**: HTTP middleware (CORS, security headers, body limit, error reporting)
//! - **[`errors`]**: Uniform JSON error responses with error codes
//!
//! ## Quick Start
//!
//! ```ignore
//! use axum::{Router, middleware};
//! use axum_helpers::{errors::json_error_envelope, http::security_headers, server::create_production_app};
//! use core_config::server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let app = Router::new()
//!         .layer(middleware::from_fn(json_error_envelope))
//!         .layer(middleware::from_fn(security_headers));
//!
//!     create_production_app(app, &ServerConfig::default(), Duration::from_secs(10), async {}).await
//! }
//! ```

pub mod errors;
pub mod http;
pub mod server;

// Re-export server types
pub use server::{ShutdownCoordinator, create_production_app, serve_until_shutdown};

// Re-export HTTP middleware
pub use http::{
    CorsPolicy, MAX_BODY_BYTES, create_cors_layer, enforce_allowed_origin, report_server_errors,
    security_headers,
};

// Re-export error types
pub use errors::{AppError, ErrorCode, ErrorDetail, ErrorResponse, error_response};
pub use errors::envelope::json_error_envelope;
pub use errors::handlers::{handle_panic, is_handling_request, request_scope};
