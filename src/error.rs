//! Unified error handling for portald.
//!
//! This module provides the error hierarchy for command handling and the
//! session registry, with metric labels and the single-line text shown to
//! the issuing session.

use thiserror::Error;

// ============================================================================
// Handler Errors (command processing)
// ============================================================================

/// Errors that can occur while handling one input line.
///
/// None of these ever terminates a connection: the dispatcher resolves each
/// into a reply for the issuing session only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Arity or argument-shape mismatch; answered with the usage string.
    #[error("usage error")]
    Usage,

    #[error("cannot message self")]
    SelfMessage,

    #[error("target not found: {0}")]
    TargetNotFound(String),

    #[error("not in a portal")]
    NoPortal,

    #[error("no text to send")]
    NoTextToSend,

    #[error("username in use: {0}")]
    UsernameInUse(String),

    /// The issuing session vanished from the registry mid-command.
    #[error("session gone")]
    SessionGone,
}

impl HandlerError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownCommand(_) => "unknown_command",
            Self::Usage => "usage",
            Self::SelfMessage => "self_message",
            Self::TargetNotFound(_) => "target_not_found",
            Self::NoPortal => "no_portal",
            Self::NoTextToSend => "no_text_to_send",
            Self::UsernameInUse(_) => "username_in_use",
            Self::SessionGone => "session_gone",
        }
    }

    /// Text sent back to the issuing session.
    ///
    /// `Usage` has no text of its own: the dispatcher substitutes the
    /// command's usage string.
    pub fn user_text(&self) -> String {
        match self {
            Self::UnknownCommand(name) => format!("Unknown command : {name}"),
            Self::Usage => "Invalid arguments".to_string(),
            Self::SelfMessage => "Cannot send message to yourself".to_string(),
            Self::TargetNotFound(name) => format!("User {name} not found"),
            Self::NoPortal => "You are not currently in a portal".to_string(),
            Self::NoTextToSend => "No text to send".to_string(),
            Self::UsernameInUse(name) => format!("Username {name} is already in use"),
            Self::SessionGone => "Your session is no longer registered".to_string(),
        }
    }
}

impl From<RegistryError> for HandlerError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::DuplicateUsername(name) => Self::UsernameInUse(name),
            RegistryError::UnknownConnection => Self::SessionGone,
        }
    }
}

// ============================================================================
// Registry Errors (session registry operations)
// ============================================================================

/// Session registry operation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("username {0} is already in use")]
    DuplicateUsername(String),

    #[error("no session for this connection")]
    UnknownConnection,
}
