//! Database library providing the MongoDB connector used by the blog API
//!
//! # Features
//!
//! - `mongodb` (default) - MongoDB support
//! - `config` - Configuration support with `core_config::FromEnv`
//!
//! # Example
//!
//! ```ignore
//! use database::mongodb::{self, ConnectionMonitor, MongoConfig};
//!
//! let monitor = ConnectionMonitor::new();
//! let conn = mongodb::connect_from_config(&MongoConfig::from_env()?, monitor.clone()).await?;
//! assert!(monitor.is_connected());
//! mongodb::close(conn).await;
//! ```

#[cfg(feature = "mongodb")]
pub mod mongodb;
