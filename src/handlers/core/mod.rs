//! Core handler infrastructure.
//!
//! The handler registry, the context passed to handlers and the result type
//! they return.

pub mod context;
pub mod registry;

pub use context::{CommandResult, Context, Handler, HandlerResult};
pub use registry::Registry;
