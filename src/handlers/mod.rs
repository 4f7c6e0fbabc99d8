//! Command handlers.
//!
//! Each built-in command is a unit struct implementing [`core::Handler`]. The
//! [`Registry`] owns one descriptor per command and is the only entry point
//! the connection loop uses.

pub mod core;
pub mod help;
pub mod identity;
pub mod messaging;
pub mod navigation;
pub mod portal;

#[cfg(test)]
pub(crate) mod testing;

pub use self::core::{Context, Registry};
