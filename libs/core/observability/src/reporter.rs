//! Error reporting capability.
//!
//! The pipeline depends only on [`ErrorReporter`]. At startup [`init_reporter`]
//! picks a Sentry-backed implementation when a DSN is configured in production,
//! and [`NoopReporter`] otherwise.

use axum::http::StatusCode;
use sentry::protocol::{Event, Level, SpanStatus};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Severity attached to a reported event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportLevel {
    Info,
    Warning,
    Error,
    Fatal,
}

impl From<ReportLevel> for Level {
    fn from(level: ReportLevel) -> Self {
        match level {
            ReportLevel::Info => Level::Info,
            ReportLevel::Warning => Level::Warning,
            ReportLevel::Error => Level::Error,
            ReportLevel::Fatal => Level::Fatal,
        }
    }
}

/// One event handed to the reporter.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorEvent {
    pub message: String,
    pub level: ReportLevel,
    pub tags: BTreeMap<String, String>,
    pub extra: BTreeMap<String, Value>,
}

impl ErrorEvent {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: ReportLevel::Error,
            tags: BTreeMap::new(),
            extra: BTreeMap::new(),
        }
    }

    /// Build an event from an error and its source chain.
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self::new(message)
    }

    pub fn with_level(mut self, level: ReportLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.tags.insert(key.into(), value.to_string());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Sink for server-class failures.
pub trait ErrorReporter: Send + Sync + 'static {
    fn report(&self, event: ErrorEvent);

    /// Whether events go anywhere; lets callers skip building them.
    fn is_enabled(&self) -> bool {
        true
    }

    fn capture_message(&self, message: &str, level: ReportLevel) {
        self.report(ErrorEvent::new(message).with_level(level));
    }

    fn capture_error(&self, err: &(dyn std::error::Error + 'static)) {
        self.report(ErrorEvent::from_error(err));
    }

    /// Start a performance trace for one request; `None` when tracing is off.
    fn start_request_trace(&self, _name: &str) -> Option<Box<dyn RequestTrace>> {
        None
    }
}

/// A performance trace covering one request, finished with its status.
pub trait RequestTrace: Send {
    fn finish(self: Box<Self>, status: StatusCode);
}

pub type SharedReporter = Arc<dyn ErrorReporter>;

/// Only server errors are escalated; client errors stay with the caller.
pub fn should_report(status: StatusCode) -> bool {
    status.is_server_error()
}

/// Reporter used when error tracking is not configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReporter;

impl ErrorReporter for NoopReporter {
    fn report(&self, _event: ErrorEvent) {}

    fn is_enabled(&self) -> bool {
        false
    }
}

/// Sentry settings resolved at startup.
#[derive(Debug, Clone)]
pub struct ReporterConfig {
    pub dsn: Option<String>,
    /// Reporting only runs in production
    pub production: bool,
    pub environment: String,
    pub release: String,
    pub traces_sample_rate: f32,
}

/// Transport-level noise that is never worth an event.
const IGNORED_ERRORS: &[&str] = &["ECONNREFUSED", "ENOTFOUND"];

/// Reporter backed by the Sentry SDK.
///
/// Holds the client guard; dropping the reporter flushes pending events.
pub struct SentryReporter {
    _guard: sentry::ClientInitGuard,
}

impl SentryReporter {
    pub fn init(dsn: &str, config: &ReporterConfig) -> Result<Self, sentry::types::ParseDsnError> {
        let dsn: sentry::types::Dsn = dsn.parse()?;

        let guard = sentry::init(sentry::ClientOptions {
            dsn: Some(dsn),
            environment: Some(Cow::Owned(config.environment.clone())),
            release: Some(Cow::Owned(config.release.clone())),
            traces_sample_rate: config.traces_sample_rate,
            before_send: Some(Arc::new(before_send)),
            ..Default::default()
        });

        Ok(Self { _guard: guard })
    }
}

impl ErrorReporter for SentryReporter {
    fn report(&self, event: ErrorEvent) {
        sentry::with_scope(
            |scope| {
                for (key, value) in &event.tags {
                    scope.set_tag(key, value);
                }
                for (key, value) in &event.extra {
                    scope.set_extra(key, value.clone());
                }
            },
            || {
                sentry::capture_message(&event.message, event.level.into());
            },
        );
    }

    fn start_request_trace(&self, name: &str) -> Option<Box<dyn RequestTrace>> {
        let context = sentry::TransactionContext::new(name, "http.server");
        Some(Box::new(SentryTrace(sentry::start_transaction(context))))
    }
}

/// Sampled by `traces_sample_rate`; unsampled transactions are discarded.
struct SentryTrace(sentry::Transaction);

impl RequestTrace for SentryTrace {
    fn finish(self: Box<Self>, status: StatusCode) {
        let SentryTrace(transaction) = *self;
        transaction.set_status(span_status(status));
        transaction.finish();
    }
}

fn span_status(status: StatusCode) -> SpanStatus {
    match status {
        s if s.is_server_error() => SpanStatus::InternalError,
        StatusCode::NOT_FOUND => SpanStatus::NotFound,
        StatusCode::FORBIDDEN => SpanStatus::PermissionDenied,
        s if s.is_client_error() => SpanStatus::InvalidArgument,
        _ => SpanStatus::Ok,
    }
}

/// Drop ignored transport errors and mirror error/fatal events into the log.
fn before_send(event: Event<'static>) -> Option<Event<'static>> {
    if is_ignored(&event) {
        return None;
    }

    if matches!(event.level, Level::Error | Level::Fatal) {
        error!(
            message = event.message.as_deref().unwrap_or(""),
            level = ?event.level,
            tags = ?event.tags,
            "Sentry Event"
        );
    }
    Some(event)
}

fn is_ignored(event: &Event<'_>) -> bool {
    let texts = event
        .message
        .iter()
        .cloned()
        .chain(event.exception.values.iter().filter_map(|e| e.value.clone()));

    texts
        .into_iter()
        .any(|text| IGNORED_ERRORS.iter().any(|ignored| text.contains(ignored)))
}

/// Pick the reporter implementation once, at startup.
pub fn init_reporter(config: &ReporterConfig) -> SharedReporter {
    if !config.production {
        info!("Sentry disabled in non-production environment");
        return Arc::new(NoopReporter);
    }

    let Some(dsn) = config.dsn.as_deref().filter(|d| !d.trim().is_empty()) else {
        warn!("SENTRY_DSN not set, Sentry error tracking disabled");
        return Arc::new(NoopReporter);
    };

    match SentryReporter::init(dsn, config) {
        Ok(reporter) => {
            info!("Sentry initialized successfully");
            Arc::new(reporter)
        }
        Err(e) => {
            error!("Failed to initialize Sentry: {}", e);
            Arc::new(NoopReporter)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(production: bool, dsn: Option<&str>) -> ReporterConfig {
        ReporterConfig {
            dsn: dsn.map(str::to_string),
            production,
            environment: "production".to_string(),
            release: "blog-api@0.1.0".to_string(),
            traces_sample_rate: 0.1,
        }
    }

    #[test]
    fn test_only_server_errors_are_reported() {
        assert!(should_report(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(should_report(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!should_report(StatusCode::NOT_FOUND));
        assert!(!should_report(StatusCode::PAYLOAD_TOO_LARGE));
        assert!(!should_report(StatusCode::OK));
    }

    #[test]
    fn test_reporter_disabled_outside_production() {
        let reporter = init_reporter(&config(false, Some("https://key@o0.ingest.sentry.io/1")));
        assert!(!reporter.is_enabled());
    }

    #[test]
    fn test_reporter_disabled_without_dsn() {
        assert!(!init_reporter(&config(true, None)).is_enabled());
        assert!(!init_reporter(&config(true, Some("  "))).is_enabled());
    }

    #[test]
    fn test_invalid_dsn_falls_back_to_noop() {
        assert!(!init_reporter(&config(true, Some("not a dsn"))).is_enabled());
    }

    #[test]
    fn test_event_builder() {
        let event = ErrorEvent::new("boom")
            .with_level(ReportLevel::Fatal)
            .with_tag("status", 500)
            .with_extra("url", "/api/posts");
        assert_eq!(event.level, ReportLevel::Fatal);
        assert_eq!(event.tags.get("status").map(String::as_str), Some("500"));
        assert_eq!(event.extra.get("url"), Some(&Value::from("/api/posts")));
    }

    #[test]
    fn test_event_from_error_includes_sources() {
        let inner = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let event = ErrorEvent::from_error(&inner);
        assert_eq!(event.message, "disk full");
    }

    #[test]
    fn test_span_status_follows_response_class() {
        assert_eq!(span_status(StatusCode::OK), SpanStatus::Ok);
        assert_eq!(span_status(StatusCode::NOT_FOUND), SpanStatus::NotFound);
        assert_eq!(span_status(StatusCode::BAD_REQUEST), SpanStatus::InvalidArgument);
        assert_eq!(
            span_status(StatusCode::SERVICE_UNAVAILABLE),
            SpanStatus::InternalError
        );
    }

    #[test]
    fn test_noop_reporter_never_traces() {
        assert!(NoopReporter.start_request_trace("GET /health").is_none());
    }

    #[test]
    fn test_before_send_drops_ignored_errors() {
        let noisy = Event {
            message: Some("connect ECONNREFUSED 127.0.0.1:27017".to_string()),
            level: Level::Error,
            ..Default::default()
        };
        assert!(before_send(noisy).is_none());

        let real = Event {
            message: Some("handler panicked".to_string()),
            level: Level::Error,
            ..Default::default()
        };
        assert!(before_send(real).is_some());
    }
}
