//! Network module.
//!
//! Contains the Gateway (listeners), the per-client Connection loop and the
//! transports they speak.

mod connection;
mod gateway;
pub mod transport;

pub use gateway::Gateway;
