//! Per-request context shared by the timing and reporting middleware.

use axum::{
    extract::{ConnectInfo, Request},
    http::{HeaderMap, Method, StatusCode},
};
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// What the pipeline knows about one inbound request.
///
/// Built when the request enters a middleware and dropped once the response
/// has been produced; never shared between requests.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    /// Path plus query string, as the client sent it
    pub url: String,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    pub started_at: Instant,
}

/// A request whose response status and latency are known.
#[derive(Debug, Clone)]
pub struct CompletedRequest {
    pub context: RequestContext,
    pub status: StatusCode,
    pub elapsed: Duration,
}

impl RequestContext {
    pub fn from_request(request: &Request) -> Self {
        let url = request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| request.uri().path().to_string());

        let socket = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Self {
            method: request.method().clone(),
            url,
            client_ip: extract_ip_from_headers(request.headers())
                .or_else(|| extract_ip_from_socket(socket)),
            user_agent: extract_user_agent(request.headers()),
            started_at: Instant::now(),
        }
    }

    pub fn finish(self, status: StatusCode) -> CompletedRequest {
        CompletedRequest {
            elapsed: self.started_at.elapsed(),
            context: self,
            status,
        }
    }
}

impl CompletedRequest {
    pub fn elapsed_ms(&self) -> u128 {
        self.elapsed.as_millis()
    }

    /// Value of the `X-Response-Time` header, e.g. `12ms`.
    pub fn response_time(&self) -> String {
        format!("{}ms", self.elapsed_ms())
    }
}

/// Extract client IP address from HTTP headers.
///
/// Returns the first IP from X-Forwarded-For, or X-Real-IP as fallback.
pub fn extract_ip_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        })
}

/// Extract client IP address from socket address.
pub fn extract_ip_from_socket(socket: Option<SocketAddr>) -> Option<String> {
    socket.map(|addr| addr.ip().to_string())
}

/// Extract user agent string from HTTP headers.
pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}
