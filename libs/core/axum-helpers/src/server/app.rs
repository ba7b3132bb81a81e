use super::shutdown::ShutdownCoordinator;
use axum::Router;
use core_config::server::ServerConfig;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Production-ready server with coordinated shutdown and cleanup.
///
/// This provides:
/// - Client socket addresses available to handlers via `ConnectInfo`
/// - Graceful shutdown on SIGINT/SIGTERM, draining in-flight requests
/// - A cleanup future run after the listener stops, bounded by `shutdown_timeout`
///
/// # Errors
/// Returns an error if the listener fails to bind or the server fails while
/// serving. Cleanup still runs in the latter case.
///
/// # Example
/// ```ignore
/// use std::time::Duration;
/// use axum_helpers::server::create_production_app;
///
/// let cleanup = async move {
///     database::mongodb::close(connection).await;
/// };
///
/// create_production_app(router, &config, Duration::from_secs(30), cleanup).await?;
/// ```
pub async fn create_production_app<F>(
    router: Router,
    server_config: &ServerConfig,
    shutdown_timeout: Duration,
    cleanup: F,
) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(server_config.address()).await?;
    info!("Server running on port {}", listener.local_addr()?.port());

    serve_until_shutdown(listener, router, ShutdownCoordinator::default(), shutdown_timeout, cleanup)
        .await
}

/// Serve on an already-bound listener until the coordinator signals shutdown.
pub async fn serve_until_shutdown<F>(
    listener: TcpListener,
    router: Router,
    coordinator: ShutdownCoordinator,
    shutdown_timeout: Duration,
    cleanup: F,
) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let signal = coordinator.clone();
    let serve_result = axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { signal.wait_for_signal().await })
    .await
    .inspect_err(|e| {
        tracing::error!("Server encountered an error: {:?}", e);
    });

    info!("Starting cleanup tasks (timeout: {:?})", shutdown_timeout);
    match tokio::time::timeout(shutdown_timeout, cleanup).await {
        Ok(()) => info!("Cleanup completed successfully"),
        Err(_) => warn!(
            "Cleanup exceeded timeout of {:?}, forcing shutdown",
            shutdown_timeout
        ),
    }

    serve_result
}
