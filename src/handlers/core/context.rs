//! Command handler context and core types.
//!
//! Defines the `Context` struct passed to every handler, the `Handler` trait
//! and the `CommandResult` a handler produces.

use super::registry::Registry;
use crate::error::HandlerError;
use crate::state::{ConnId, Matrix, SessionInfo};
use async_trait::async_trait;
use portal_proto::{GLOBAL_SIGIL, PORTAL_SIGIL};
use std::sync::Arc;

/// Result type for command handlers.
pub type HandlerResult = Result<CommandResult, HandlerError>;

/// What the issuing session sees after a command.
///
/// Both fields empty means there is nothing to show.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResult {
    pub text: Option<String>,
    pub working_dir: Option<String>,
}

impl CommandResult {
    /// A result with no visible output.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A plain text reply.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            working_dir: None,
        }
    }

    /// A working-directory change with no text.
    pub fn working_dir(path: impl Into<String>) -> Self {
        Self {
            text: None,
            working_dir: Some(path.into()),
        }
    }
}

/// Handler context passed to each command handler.
pub struct Context<'a> {
    /// The issuing connection.
    pub conn: ConnId,
    /// Shared server state.
    pub matrix: &'a Arc<Matrix>,
    /// Command registry (for `help`).
    pub registry: &'a Registry,
}

impl<'a> Context<'a> {
    pub fn new(conn: ConnId, matrix: &'a Arc<Matrix>, registry: &'a Registry) -> Self {
        Self {
            conn,
            matrix,
            registry,
        }
    }

    /// Current state of the issuing session.
    pub fn session(&self) -> Result<SessionInfo, HandlerError> {
        self.matrix
            .sessions
            .get(self.conn)
            .ok_or(HandlerError::SessionGone)
    }

    /// Check a username or portal tag against the shape rules.
    ///
    /// Names are 1 to `max_name_length` characters, contain no whitespace or
    /// control characters, and never start with a sigil.
    pub fn check_name(&self, name: &str) -> Result<(), HandlerError> {
        if is_valid_name(name, self.matrix.limits.max_name_length) {
            Ok(())
        } else {
            Err(HandlerError::Usage)
        }
    }
}

pub(crate) fn is_valid_name(name: &str, max_len: usize) -> bool {
    let len = name.chars().count();
    len > 0
        && len <= max_len
        && !name.starts_with([GLOBAL_SIGIL, PORTAL_SIGIL])
        && !name.chars().any(|c| c.is_control() || c.is_whitespace())
}

/// A command handler.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Handle one command.
    ///
    /// `args` holds every argument, including trailing context values the
    /// parser injected. Arity has already been checked.
    async fn handle(&self, ctx: &Context<'_>, args: &[String]) -> HandlerResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_shape() {
        assert!(is_valid_name("alice", 32));
        assert!(is_valid_name("ça", 2));
        assert!(!is_valid_name("", 32));
        assert!(!is_valid_name("abc", 2));
        assert!(!is_valid_name("@alice", 32));
        assert!(!is_valid_name("#ops", 32));
        assert!(!is_valid_name("a\u{7}b", 32));
        assert!(!is_valid_name("a b", 32));
    }

    #[test]
    fn empty_result() {
        let empty = CommandResult::empty();
        assert_eq!(empty.text, None);
        assert_eq!(empty.working_dir, None);
        assert_ne!(CommandResult::working_dir("/"), empty);
    }
}
