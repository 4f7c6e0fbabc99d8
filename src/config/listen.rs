//! Network listener configuration.

use serde::Deserialize;
use std::net::SocketAddr;

/// WebSocket listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebSocketConfig {
    /// Address to bind to for WebSocket (e.g., "0.0.0.0:8000").
    pub address: SocketAddr,
    /// Allowed origins for CORS (e.g., `["https://example.com"]`).
    /// Empty list allows all origins.
    #[serde(default)]
    pub allow_origins: Vec<String>,
}

impl WebSocketConfig {
    /// Whether a handshake carrying `origin` may proceed.
    ///
    /// Requests without an Origin header are only accepted when the list is
    /// empty.
    pub fn origin_allowed(&self, origin: Option<&str>) -> bool {
        if self.allow_origins.is_empty() {
            return true;
        }
        origin.is_some_and(|o| self.allow_origins.iter().any(|a| a == o || a == "*"))
    }
}

/// Plain TCP line listener configuration (terminal clients such as `nc`).
#[derive(Debug, Clone, Deserialize)]
pub struct PlaintextConfig {
    /// Address to bind to (e.g., "127.0.0.1:2323").
    pub address: SocketAddr,
}
