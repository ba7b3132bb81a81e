use mongodb::{Client, Database, bson::doc, options::ClientOptions};
use tracing::info;

use super::{ConnectFailure, ConnectionMonitor, ConnectionState, DEFAULT_DATABASE, MongoConfig};

/// Error type for MongoDB operations
#[derive(Debug, thiserror::Error)]
pub enum MongoError {
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("Connection failed ({failure}): {message}")]
    ConnectionFailed {
        failure: ConnectFailure,
        message: String,
    },
}

/// A connected client together with its resolved database and live state.
#[derive(Clone, Debug)]
pub struct MongoConnection {
    pub client: Client,
    pub database: Database,
    pub monitor: ConnectionMonitor,
}

/// Build driver options from config: pool bounds, idle reclamation, timeouts,
/// driver-level retries, and the SDAM handler feeding `monitor`.
pub async fn client_options(
    config: &MongoConfig,
    monitor: &ConnectionMonitor,
) -> Result<ClientOptions, mongodb::error::Error> {
    let mut options = ClientOptions::parse(&config.url).await?;

    options.max_pool_size = Some(config.max_pool_size);
    options.min_pool_size = Some(config.min_pool_size);
    options.max_idle_time = Some(config.max_idle_time());
    options.connect_timeout = Some(config.connect_timeout());
    options.server_selection_timeout = Some(config.server_selection_timeout());
    options.retry_reads = Some(config.retry_reads);
    options.retry_writes = Some(config.retry_writes);
    options.sdam_event_handler = Some(monitor.event_handler());

    if let Some(ref app_name) = config.app_name {
        options.app_name = Some(app_name.clone());
    }

    Ok(options)
}

/// Connect using a MongoConfig and verify the server answers a `ping`.
///
/// There is no retry loop: a failure is classified, logged with remediation
/// hints, and returned so startup can abort.
///
/// # Example
/// ```ignore
/// use database::mongodb::{ConnectionMonitor, MongoConfig, connect_from_config};
///
/// let config = MongoConfig::from_env()?;
/// let conn = connect_from_config(&config, ConnectionMonitor::new()).await?;
/// ```
pub async fn connect_from_config(
    config: &MongoConfig,
    monitor: ConnectionMonitor,
) -> Result<MongoConnection, MongoError> {
    monitor.mark_connecting();
    info!("Attempting to connect to MongoDB at {}", config.redacted_host());

    match try_connect(config, &monitor).await {
        Ok(connection) => {
            monitor.set(ConnectionState::Connected);
            info!("MongoDB Connected: {}", config.redacted_host());
            info!("Database: {}", connection.database.name());
            info!("Connection Pool Size: {}", config.max_pool_size);
            Ok(connection)
        }
        Err(err) => {
            monitor.set(ConnectionState::Disconnected);
            let failure = ConnectFailure::from_error(&err);
            let message = err.to_string();
            failure.log(&message);
            Err(MongoError::ConnectionFailed { failure, message })
        }
    }
}

async fn try_connect(
    config: &MongoConfig,
    monitor: &ConnectionMonitor,
) -> Result<MongoConnection, mongodb::error::Error> {
    let options = client_options(config, monitor).await?;
    let name = database_name(config, &options);

    let client = Client::with_options(options)?;
    client.database("admin").run_command(doc! { "ping": 1 }).await?;

    Ok(MongoConnection {
        database: client.database(&name),
        client,
        monitor: monitor.clone(),
    })
}

/// The URI's default database, then `MONGODB_DATABASE`, then [`DEFAULT_DATABASE`].
fn database_name(config: &MongoConfig, options: &ClientOptions) -> String {
    options
        .default_database
        .clone()
        .or_else(|| config.database.clone())
        .unwrap_or_else(|| DEFAULT_DATABASE.to_string())
}

/// Close the pool, moving the state through disconnecting to disconnected.
pub async fn close(connection: MongoConnection) {
    connection.monitor.set(ConnectionState::Disconnecting);
    connection.client.shutdown().await;
    connection.monitor.set(ConnectionState::Disconnected);
    info!("MongoDB connection closed through app termination");
}
