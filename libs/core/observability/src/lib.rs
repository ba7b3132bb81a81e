//! Observability utilities for the blog API.
//!
//! This crate provides:
//! - Request timing middleware with slow-request warnings
//! - Process memory sampling and a periodic monitor
//! - A pluggable error reporter (Sentry or no-op)
//!
//! # Example
//!
//! ```rust,ignore
//! use observability::{performance_monitor, PerformanceConfig};
//!
//! let app = Router::new()
//!     .route("/", get(handler))
//!     .layer(middleware::from_fn_with_state(PerformanceConfig::default(), performance_monitor));
//! ```

pub mod memory;
pub mod middleware;
pub mod reporter;
pub mod request;

pub use memory::{
    format_mb, spawn_memory_monitor, MemoryMonitorConfig, MemorySample, MemorySampler,
    SharedMemorySampler,
};
pub use middleware::{performance_monitor, PerformanceConfig, X_RESPONSE_TIME};
pub use reporter::{
    init_reporter, should_report, ErrorEvent, ErrorReporter, NoopReporter, ReportLevel,
    ReporterConfig, RequestTrace, SentryReporter, SharedReporter,
};
pub use request::{CompletedRequest, RequestContext};
