use axum_helpers::{is_handling_request, server::create_production_app};
use blog_api::{AppState, Config, api, build_router, pipeline::frontend::ensure_uploads_dir};
use core_config::{
    Environment,
    tracing::{init_tracing, install_color_eyre, install_panic_hook},
};
use database::mongodb::{ConnectionMonitor, close, connect_from_config};
use observability::{init_reporter, spawn_memory_monitor};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Time allowed for closing the database pool after the listener stops
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output
    install_color_eyre();

    // A missing .env file is not an error
    dotenv::dotenv().ok();

    // Initialize tracing before anything can fail so the failure is logged
    init_tracing(&Environment::from_env());
    // Panics outside request handling terminate the process with status 1
    install_panic_hook(is_handling_request);

    // Load configuration from environment variables
    let config = Config::from_env().inspect_err(|e| error!("Failed to start server: {}", e))?;

    let reporter = init_reporter(&config.reporter_config());

    ensure_uploads_dir(&config.uploads_dir)?;

    // Connect before binding; a failed connection is fatal
    let connection = connect_from_config(&config.mongodb, ConnectionMonitor::new())
        .await
        .inspect_err(|e| error!("Failed to start server: {}", e))?;

    if config.environment.is_production() {
        supervise("memory monitor", spawn_memory_monitor(config.memory_monitor_config()));
    }

    info!("Environment: {}", config.environment);

    let server_config = config.server.clone();
    let state = AppState::new(config, &connection, reporter);
    let app = build_router(state, api::domain_routes());

    create_production_app(app, &server_config, SHUTDOWN_TIMEOUT, async move {
        close(connection).await;
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Blog API shutdown complete");
    Ok(())
}

/// Terminate the process if a background task dies.
fn supervise(name: &'static str, handle: JoinHandle<()>) {
    tokio::spawn(async move {
        match handle.await {
            Err(e) if e.is_cancelled() => {}
            Err(e) => {
                error!(task = name, "Background task failed: {}", e);
                std::process::exit(1);
            }
            Ok(()) => {
                error!(task = name, "Background task exited unexpectedly");
                std::process::exit(1);
            }
        }
    });
}
