//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Core config struct definitions (Config, ServerConfig, MotdConfig, LoggingConfig)
//! - [`listen`]: Listener configuration (WebSocketConfig, PlaintextConfig)
//! - [`limits`]: Line and queue limits (LimitsConfig)
//! - [`auth`]: Token secret and seeded user directory (AuthConfig, SeedUser)
//! - [`validation`]: Startup validation returning every problem found

mod auth;
mod defaults;
mod limits;
mod listen;
mod types;
pub mod validation;

pub use auth::SeedUser;
pub use defaults::generated_secret;
pub use limits::LimitsConfig;
pub use listen::WebSocketConfig;
pub use types::{Config, LogFormat, LoggingConfig};
pub use validation::validate;
