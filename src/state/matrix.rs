//! The Matrix - central shared state for the portal server.
//!
//! Handlers and connection tasks reach every piece of shared state through
//! one `Arc<Matrix>`. The only mutable part is the session registry.

use crate::config::{Config, LimitsConfig};
use crate::state::broadcast::Broadcaster;
use crate::state::sessions::SessionRegistry;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// This server's identity.
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub name: String,
    pub started: DateTime<Utc>,
}

/// Central shared state container.
#[derive(Debug)]
pub struct Matrix {
    /// Live sessions.
    pub sessions: Arc<SessionRegistry>,

    /// Fan-out over `sessions`.
    pub broadcaster: Broadcaster,

    /// This server's identity.
    pub server_info: ServerInfo,

    /// Line and queue limits.
    pub limits: LimitsConfig,

    /// Lines appended to the welcome notice.
    pub motd: Vec<String>,
}

impl Matrix {
    /// Create a new Matrix from the loaded configuration.
    pub fn new(config: &Config) -> Self {
        Self::with_parts(
            config.server.name.clone(),
            config.limits.clone(),
            config.motd.load_lines(),
        )
    }

    /// Create a Matrix without a config file.
    pub fn with_parts(name: String, limits: LimitsConfig, motd: Vec<String>) -> Self {
        let sessions = Arc::new(SessionRegistry::new());
        Self {
            broadcaster: Broadcaster::new(Arc::clone(&sessions)),
            sessions,
            server_info: ServerInfo {
                name,
                started: Utc::now(),
            },
            limits,
            motd,
        }
    }
}
