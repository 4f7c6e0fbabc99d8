//! Error types for line parsing.

use thiserror::Error;

/// Errors produced while parsing an input line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The line was empty or contained only whitespace.
    ///
    /// Callers skip such lines; nothing is dispatched.
    #[error("empty line")]
    Empty,
}
