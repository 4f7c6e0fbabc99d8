//! Telemetry utilities for command timing and span construction.

use std::time::Instant;

/// Guard for timing command execution and recording metrics.
///
/// Records command latency when dropped.
pub struct CommandTimer {
    command: String,
    start: Instant,
}

impl CommandTimer {
    /// Start timing a command.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            start: Instant::now(),
        }
    }
}

impl Drop for CommandTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        crate::metrics::record_command(&self.command, duration);
    }
}

/// Standardized span constructors.
pub mod spans {
    use tracing::{Span, info_span};

    /// Span for one client connection.
    pub fn connection(conn: &str, peer: &str, transport: &str) -> Span {
        info_span!("connection", conn = %conn, peer = %peer, transport = %transport)
    }

    /// Span for one command dispatch.
    pub fn command(name: &str, conn: &str, username: &str) -> Span {
        info_span!("command", name = %name, conn = %conn, username = %username)
    }
}
