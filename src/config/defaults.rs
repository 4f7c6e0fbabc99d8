//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

use rand::Rng;
use rand::distributions::Alphanumeric;

// =============================================================================
// Server Defaults
// =============================================================================

pub fn default_server_name() -> String {
    "portald".to_string()
}

pub fn default_metrics_port() -> u16 {
    9090
}

// =============================================================================
// Limits Defaults
// =============================================================================

pub fn default_max_line_length() -> usize {
    4096
}

pub fn default_outbound_queue() -> usize {
    256
}

pub fn default_max_name_length() -> usize {
    32
}

// =============================================================================
// Auth Defaults
// =============================================================================

/// Minimum accepted length for a configured token secret.
pub const MIN_SECRET_LEN: usize = 16;

/// Generate a random token secret for runs without a configured one.
pub fn generated_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(48)
        .map(char::from)
        .collect()
}
