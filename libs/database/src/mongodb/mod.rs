//! MongoDB database connector and utilities
//!
//! Provides pooled connection setup, live connection-state tracking fed by
//! driver events, and diagnostics for failed initial connects.

mod config;
mod connector;
mod diagnostics;
mod state;

pub use config::{DEFAULT_DATABASE, MongoConfig, redact_uri};
pub use connector::{MongoConnection, MongoError, client_options, close, connect_from_config};
pub use diagnostics::ConnectFailure;
pub use state::{ConnectionMonitor, ConnectionState};

// Re-export MongoDB types for convenience
pub use mongodb::{Client, Collection, Database};
