use mongodb::event::EventHandler;
use mongodb::event::sdam::SdamEvent;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use tracing::{error, info, warn};

/// Driver connection state, numbered like the classic `readyState` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum ConnectionState {
    Disconnected = 0,
    Connected = 1,
    Connecting = 2,
    Disconnecting = 3,
}

impl ConnectionState {
    pub fn ready_state(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connected => "connected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Disconnecting => "disconnecting",
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => ConnectionState::Connected,
            2 => ConnectionState::Connecting,
            3 => ConnectionState::Disconnecting,
            _ => ConnectionState::Disconnected,
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Live, process-wide view of the MongoDB connection.
///
/// Cheap to clone; every clone observes the same cell. The state is written by
/// driver SDAM events and by the shutdown path, and read on every health check.
/// Heartbeats are tracked per server address: the pool counts as connected
/// while at least one server in the topology answers.
#[derive(Clone, Debug)]
pub struct ConnectionMonitor {
    state: Arc<AtomicU8>,
    ever_connected: Arc<AtomicBool>,
    servers: Arc<Mutex<HashMap<String, bool>>>,
}

impl Default for ConnectionMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionMonitor {
    pub fn new() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(ConnectionState::Disconnected as u8)),
            ever_connected: Arc::new(AtomicBool::new(false)),
            servers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Force a state, returning the previous one.
    pub fn set(&self, next: ConnectionState) -> ConnectionState {
        let previous = ConnectionState::from_u8(self.state.swap(next as u8, Ordering::AcqRel));
        if next == ConnectionState::Connected {
            self.ever_connected.store(true, Ordering::Release);
        }
        previous
    }

    pub fn mark_connecting(&self) {
        if self.set(ConnectionState::Connecting) != ConnectionState::Connecting {
            info!("MongoDB connecting...");
        }
    }

    /// `server` answered a heartbeat.
    ///
    /// Ignored while disconnecting so a late heartbeat cannot revive a pool that
    /// is being shut down.
    pub fn record_heartbeat_success(&self, server: &str) {
        let any_available = self.update_server(server, Some(true));
        self.apply_availability(any_available, None);
    }

    /// A heartbeat to `server` failed. The pool stays connected while another
    /// server still answers.
    pub fn record_heartbeat_failure(&self, server: &str, reason: &str) {
        let any_available = self.update_server(server, Some(false));
        self.apply_availability(any_available, Some((server, reason)));
    }

    /// `server` left the topology.
    pub fn record_server_closed(&self, server: &str) {
        let any_available = self.update_server(server, None);
        if self.known_servers() > 0 {
            self.apply_availability(any_available, None);
        }
    }

    /// Map a driver SDAM event onto the connection state.
    pub fn handle_sdam_event(&self, event: SdamEvent) {
        match event {
            SdamEvent::TopologyOpening(_) => self.mark_connecting(),
            SdamEvent::ServerHeartbeatSucceeded(event) => {
                self.record_heartbeat_success(&event.server_address.to_string())
            }
            SdamEvent::ServerHeartbeatFailed(event) => self.record_heartbeat_failure(
                &event.server_address.to_string(),
                &event.failure.to_string(),
            ),
            SdamEvent::ServerClosed(event) => self.record_server_closed(&event.address.to_string()),
            SdamEvent::TopologyClosed(_) => {
                self.servers().clear();
                self.set(ConnectionState::Disconnected);
            }
            _ => {}
        }
    }

    /// Event handler to install on `ClientOptions::sdam_event_handler`.
    pub fn event_handler(&self) -> EventHandler<SdamEvent> {
        let monitor = self.clone();
        EventHandler::callback(move |event| monitor.handle_sdam_event(event))
    }

    fn servers(&self) -> MutexGuard<'_, HashMap<String, bool>> {
        self.servers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn known_servers(&self) -> usize {
        self.servers().len()
    }

    /// Record `server`'s availability (`None` forgets it) and report whether any
    /// known server is available.
    fn update_server(&self, server: &str, available: Option<bool>) -> bool {
        let mut servers = self.servers();
        match available {
            Some(available) => {
                servers.insert(server.to_string(), available);
            }
            None => {
                servers.remove(server);
            }
        }
        servers.values().any(|available| *available)
    }

    fn apply_availability(&self, any_available: bool, failure: Option<(&str, &str)>) {
        if any_available {
            let Some(previous) = self.transition_unless_disconnecting(ConnectionState::Connected)
            else {
                return;
            };
            let was_connected_before = self.ever_connected.swap(true, Ordering::AcqRel);

            match previous {
                ConnectionState::Connected => {
                    if let Some((server, reason)) = failure {
                        warn!(server, reason, "MongoDB server unreachable");
                    }
                }
                ConnectionState::Disconnected if was_connected_before => {
                    info!("MongoDB reconnected")
                }
                _ => info!("MongoDB connected"),
            }
        } else {
            let Some(previous) =
                self.transition_unless_disconnecting(ConnectionState::Disconnected)
            else {
                return;
            };

            if previous == ConnectionState::Connected {
                let reason = failure.map(|(_, reason)| reason).unwrap_or("no server available");
                error!(reason, "MongoDB connection error");
                warn!("MongoDB disconnected");
            }
        }
    }

    fn transition_unless_disconnecting(&self, next: ConnectionState) -> Option<ConnectionState> {
        self.state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current != ConnectionState::Disconnecting as u8).then_some(next as u8)
            })
            .ok()
            .map(ConnectionState::from_u8)
    }
}
