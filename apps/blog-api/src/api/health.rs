//! Health check endpoint

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{SecondsFormat, Utc};
use database::mongodb::ConnectionState;
use observability::{MemorySample, format_mb};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthSnapshot {
    pub status: &'static str,
    pub timestamp: String,
    /// Seconds since the server started
    pub uptime: f64,
    pub environment: &'static str,
    pub database: DatabaseHealth,
    pub memory: MemoryHealth,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseHealth {
    pub status: &'static str,
    pub ready_state: u8,
}

#[derive(Debug, Serialize)]
pub struct MemoryHealth {
    pub used: String,
    pub total: String,
}

impl HealthSnapshot {
    /// Compute a fresh snapshot. Any state other than connected is reported
    /// as `disconnected`, with the raw ready state alongside.
    pub fn capture(state: &AppState, memory: MemorySample) -> Self {
        let connection = state.monitor.state();
        let connected = connection == ConnectionState::Connected;

        Self {
            status: if connected { "ok" } else { "degraded" },
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            uptime: state.uptime().as_secs_f64(),
            environment: state.config.environment.as_str(),
            database: DatabaseHealth {
                status: if connected {
                    ConnectionState::Connected.as_str()
                } else {
                    ConnectionState::Disconnected.as_str()
                },
                ready_state: connection.ready_state(),
            },
            memory: MemoryHealth {
                used: format_mb(memory.resident),
                total: format_mb(memory.total),
            },
        }
    }

    pub fn status_code(&self) -> StatusCode {
        if self.status == "ok" {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Liveness plus database readiness; 503 while the database is unavailable.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let memory = state.memory.sample().await;
    let snapshot = HealthSnapshot::capture(&state, memory);
    (snapshot.status_code(), Json(snapshot))
}
