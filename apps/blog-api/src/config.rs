use core_config::{FromEnv, env_list, env_or_default, env_parse_or, server::ServerConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

// Import MongoDB config from the database library
use database::mongodb::MongoConfig;
use observability::{MemoryMonitorConfig, PerformanceConfig, ReporterConfig};
use axum_helpers::CorsPolicy;

// Re-export Environment for use in other modules
pub use core_config::Environment;

pub const DEFAULT_UPLOADS_DIR: &str = "uploads";
pub const DEFAULT_CLIENT_DIST_DIR: &str = "../client/dist";
pub const DEFAULT_TRACES_SAMPLE_RATE: f32 = 0.1;

/// Error tracking settings
#[derive(Clone, Debug)]
pub struct SentryConfig {
    pub dsn: Option<String>,
    pub traces_sample_rate: f32,
    pub release: String,
}

/// Application-specific configuration, resolved once at startup.
/// Composes shared config components from the `config` library
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: Environment,
    pub server: ServerConfig,
    pub mongodb: MongoConfig,
    /// Browser origins allowed in production (`FRONTEND_URL`, comma-separated)
    pub frontend_origins: Vec<String>,
    pub slow_request_threshold: Duration,
    pub memory_monitor_interval: Duration,
    pub sentry: SentryConfig,
    pub uploads_dir: PathBuf,
    /// Built frontend bundle served in production
    pub client_dist_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let mongodb = MongoConfig::from_env()?;
        let server = ServerConfig::from_env()?;

        let frontend_origins = env_list("FRONTEND_URL").unwrap_or_default();
        if environment.is_production() && frontend_origins.is_empty() {
            warn!("FRONTEND_URL not set in production, all cross-origin requests will be rejected");
        }

        let slow_request_threshold =
            Duration::from_millis(env_parse_or("SLOW_REQUEST_THRESHOLD", 1000u64)?);
        let memory_monitor_interval =
            Duration::from_secs(env_parse_or("MEMORY_MONITOR_INTERVAL_SECS", 300u64)?);

        let sentry = SentryConfig {
            dsn: std::env::var("SENTRY_DSN").ok().filter(|dsn| !dsn.trim().is_empty()),
            traces_sample_rate: env_parse_or(
                "SENTRY_TRACES_SAMPLE_RATE",
                DEFAULT_TRACES_SAMPLE_RATE,
            )?,
            release: env_or_default(
                "SENTRY_RELEASE",
                &format!("blog-api@{}", env!("CARGO_PKG_VERSION")),
            ),
        };

        Ok(Self {
            environment,
            server,
            mongodb,
            frontend_origins,
            slow_request_threshold,
            memory_monitor_interval,
            sentry,
            uploads_dir: PathBuf::from(env_or_default("UPLOADS_DIR", DEFAULT_UPLOADS_DIR)),
            client_dist_dir: PathBuf::from(env_or_default(
                "CLIENT_DIST_DIR",
                DEFAULT_CLIENT_DIST_DIR,
            )),
        })
    }

    /// Origins allowed to call the API from a browser.
    pub fn cors_policy(&self) -> CorsPolicy {
        if self.environment.is_production() {
            CorsPolicy::new(&self.frontend_origins)
        } else {
            CorsPolicy::development()
        }
    }

    pub fn performance_config(&self) -> PerformanceConfig {
        PerformanceConfig {
            slow_request_threshold: self.slow_request_threshold,
            log_every_request: self.environment.is_development(),
        }
    }

    pub fn memory_monitor_config(&self) -> MemoryMonitorConfig {
        MemoryMonitorConfig {
            interval: self.memory_monitor_interval,
            ..Default::default()
        }
    }

    pub fn reporter_config(&self) -> ReporterConfig {
        ReporterConfig {
            dsn: self.sentry.dsn.clone(),
            production: self.environment.is_production(),
            environment: self.environment.to_string(),
            release: self.sentry.release.clone(),
            traces_sample_rate: self.sentry.traces_sample_rate,
        }
    }

    /// The frontend bundle directory, when running in production and the
    /// bundle's `index.html` exists. Checked once when the router is built.
    pub fn frontend_bundle(&self) -> Option<&Path> {
        if !self.environment.is_production() {
            return None;
        }
        self.client_dist_dir
            .join("index.html")
            .is_file()
            .then_some(self.client_dist_dir.as_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URI: &str = "mongodb://localhost:27017/blog";

    #[test]
    fn test_missing_mongodb_uri_is_fatal() {
        temp_env::with_vars_unset(["MONGODB_URI"], || {
            let err = Config::from_env().unwrap_err();
            assert!(err.to_string().contains("MONGODB_URI"));
        });
    }

    #[test]
    fn test_defaults() {
        temp_env::with_vars(
            [
                ("MONGODB_URI", Some(URI)),
                ("NODE_ENV", None),
                ("APP_ENV", None),
                ("PORT", None),
                ("SLOW_REQUEST_THRESHOLD", None),
                ("SENTRY_DSN", None),
                ("SENTRY_RELEASE", None),
                ("SENTRY_TRACES_SAMPLE_RATE", None),
                ("UPLOADS_DIR", None),
                ("CLIENT_DIST_DIR", None),
                ("MEMORY_MONITOR_INTERVAL_SECS", None),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.environment, Environment::Development);
                assert_eq!(config.server.port, 5000);
                assert_eq!(config.slow_request_threshold, Duration::from_millis(1000));
                assert_eq!(config.memory_monitor_interval, Duration::from_secs(300));
                assert_eq!(config.sentry.dsn, None);
                assert_eq!(config.sentry.traces_sample_rate, 0.1);
                assert!(config.sentry.release.starts_with("blog-api@"));
                assert_eq!(config.uploads_dir, PathBuf::from("uploads"));
                assert_eq!(config.client_dist_dir, PathBuf::from("../client/dist"));
                assert!(config.performance_config().log_every_request);
            },
        );
    }

    #[test]
    fn test_production_origins_from_frontend_url() {
        temp_env::with_vars(
            [
                ("MONGODB_URI", Some(URI)),
                ("NODE_ENV", Some("production")),
                (
                    "FRONTEND_URL",
                    Some("https://blog.example.com, https://www.blog.example.com"),
                ),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.frontend_origins.len(), 2);
                assert_eq!(config.cors_policy().origins().len(), 2);
                assert!(!config.performance_config().log_every_request);
            },
        );
    }

    #[test]
    fn test_development_ignores_frontend_url() {
        temp_env::with_vars(
            [
                ("MONGODB_URI", Some(URI)),
                ("NODE_ENV", Some("development")),
                ("FRONTEND_URL", Some("https://blog.example.com")),
            ],
            || {
                let policy = Config::from_env().unwrap().cors_policy();
                assert_eq!(policy.origins(), CorsPolicy::development().origins());
            },
        );
    }

    #[test]
    fn test_invalid_threshold_is_rejected() {
        temp_env::with_vars(
            [
                ("MONGODB_URI", Some(URI)),
                ("SLOW_REQUEST_THRESHOLD", Some("soon")),
            ],
            || {
                assert!(Config::from_env().is_err());
            },
        );
    }

    #[test]
    fn test_frontend_bundle_only_in_production() {
        let dist = tempfile::tempdir().unwrap();
        std::fs::write(dist.path().join("index.html"), "<html></html>").unwrap();
        let dist_path = dist.path().to_str().unwrap();

        temp_env::with_vars(
            [
                ("MONGODB_URI", Some(URI)),
                ("NODE_ENV", Some("production")),
                ("CLIENT_DIST_DIR", Some(dist_path)),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.frontend_bundle(), Some(dist.path()));
            },
        );

        temp_env::with_vars(
            [
                ("MONGODB_URI", Some(URI)),
                ("NODE_ENV", Some("development")),
                ("CLIENT_DIST_DIR", Some(dist_path)),
            ],
            || {
                assert!(Config::from_env().unwrap().frontend_bundle().is_none());
            },
        );
    }
}
