//! State management module.
//!
//! Contains the Matrix (shared server state), the session registry and the
//! broadcast service built on it.

pub mod broadcast;
mod matrix;
pub mod sessions;

pub use matrix::Matrix;
pub use sessions::{ConnId, SessionInfo};
