//! Server infrastructure module.
//!
//! This module provides:
//! - Binding and serving with client socket info
//! - Graceful shutdown coordination
//! - Post-shutdown cleanup with a timeout
//!
//! # Example
//!
//! ```ignore
//! use axum_helpers::server::create_production_app;
//!
//! create_production_app(app, &config.server, Duration::from_secs(10), cleanup).await?;
//! ```

pub mod app;
pub mod shutdown;

pub use app::{create_production_app, serve_until_shutdown};
pub use shutdown::ShutdownCoordinator;
