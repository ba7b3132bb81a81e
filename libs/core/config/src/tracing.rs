use crate::Environment;
use tracing::{debug, error, info};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Install color-eyre with a project-standard configuration.
///
/// Call this early in the main() before any fallible operations to ensure
/// colored error output. Safe to call multiple times.
///
/// Configuration:
/// - Shows file:line where errors occur
/// - Hides environment variables (less noise)
pub fn install_color_eyre() {
    let _ = color_eyre::config::HookBuilder::default()
        .display_location_section(true)
        .display_env_section(false)
        .install();
}

/// Default filter directives when `RUST_LOG` is not set.
pub fn default_filter(environment: &Environment) -> &'static str {
    if environment.is_production() {
        "info,tower_http=info,mongodb=warn"
    } else {
        "debug,hyper=info,mongodb=info"
    }
}

/// Initialize tracing with environment-aware configuration and error span capture.
///
/// - **Production** (`NODE_ENV=production`):
///   - Flattened JSON events for log aggregation
///   - Hides module targets
///   - `info` and above unless `RUST_LOG` says otherwise
///
/// - **Development** (default):
///   - Pretty-printed, human-readable output
///   - `debug` and above unless `RUST_LOG` says otherwise
///
/// Both modes include the `ErrorLayer` so `eyre` reports carry span traces.
///
/// # Multiple Calls
///
/// Safe to call multiple times; a second initialization is skipped (common in tests).
pub fn init_tracing(environment: &Environment) {
    let is_production = environment.is_production();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(environment)));

    let result = if is_production {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .flatten_event(true),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false)
                    .pretty(),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    };

    match result {
        Ok(_) => {
            info!(
                "Tracing initialized with ErrorLayer. Environment: {}",
                environment
            );
        }
        Err(_) => {
            debug!("Tracing already initialized, skipping re-initialization");
        }
    }
}

/// Route panics through the log sink, then terminate with status 1 unless
/// `is_recoverable` says the panic will be caught (e.g. inside a request
/// handler wrapped by a panic catcher).
///
/// Covers the main task and every spawned task, which tokio would otherwise
/// let die silently.
pub fn install_panic_hook<F>(is_recoverable: F)
where
    F: Fn() -> bool + Send + Sync + 'static,
{
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let message = panic_info
            .payload()
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic_info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());

        if is_recoverable() {
            error!(%location, "Panic: {}", message);
            previous(panic_info);
            return;
        }

        error!(%location, "Uncaught panic: {}", message);
        previous(panic_info);
        std::process::exit(1);
    }));
}
