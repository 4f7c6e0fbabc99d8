//! Line and queue limits configuration.

use super::defaults::{default_max_line_length, default_max_name_length, default_outbound_queue};
use serde::Deserialize;

/// Line and queue limits.
///
/// These bound per-connection memory: a slow reader can hold at most
/// `outbound_queue` frames before further deliveries to it are dropped.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Longest accepted input line in bytes (default: 4096).
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,
    /// Outbound frame queue capacity per session (default: 256).
    #[serde(default = "default_outbound_queue")]
    pub outbound_queue: usize,
    /// Longest accepted username or portal tag in characters (default: 32).
    #[serde(default = "default_max_name_length")]
    pub max_name_length: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_line_length: default_max_line_length(),
            outbound_queue: default_outbound_queue(),
            max_name_length: default_max_name_length(),
        }
    }
}
