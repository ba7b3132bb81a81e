//! Application state management.
//!
//! This module defines the shared application state passed to all request handlers.
//! The state contains:
//! - Configuration
//! - MongoDB client, database, and live connection state
//! - The error reporter chosen at startup
//! - A memory sampler for the health check
//! - The process start instant, for uptime

use database::mongodb::{ConnectionMonitor, MongoConnection};
use mongodb::{Client, Database};
use observability::{SharedMemorySampler, SharedReporter};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::Config;

/// Shared application state.
///
/// This struct is cloned for each handler (inexpensive Arc clones), providing access to:
/// - Application configuration
/// - MongoDB client and database
/// - Connection state, read live by the health check
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded from environment variables
    pub config: Arc<Config>,
    /// MongoDB client (cloneable, shares underlying connection pool)
    pub mongo_client: Client,
    /// MongoDB database instance
    pub db: Database,
    pub monitor: ConnectionMonitor,
    pub reporter: SharedReporter,
    pub memory: SharedMemorySampler,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Config, connection: &MongoConnection, reporter: SharedReporter) -> Self {
        Self {
            config: Arc::new(config),
            mongo_client: connection.client.clone(),
            db: connection.database.clone(),
            monitor: connection.monitor.clone(),
            reporter,
            memory: SharedMemorySampler::new(),
            started_at: Instant::now(),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}
