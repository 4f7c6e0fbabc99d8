//! Authentication boundary.
//!
//! A connection presents a token before it gets a session. Tokens are minted
//! by the `/login` endpoint after a [`UserDirectory`] accepts the
//! credentials, and checked by an [`AuthProvider`] when the socket opens.

mod directory;
mod login;
mod token;

pub use directory::{MemoryUserDirectory, UserDirectory};
pub use login::{LoginRequest, authenticate};
pub use token::HmacTokenAuth;

use async_trait::async_trait;
use thiserror::Error;

/// An authenticated account name.
pub type Username = String;

/// Authentication and account errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("malformed token")]
    MalformedToken,

    #[error("token signature mismatch")]
    BadSignature,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("User already exists")]
    UserExists,

    #[error("Invalid username")]
    InvalidUsername,

    #[error("Invalid command")]
    InvalidCommand,

    #[error("password hashing failed: {0}")]
    Hash(String),
}

impl AuthError {
    /// Whether the client supplied bad input, as opposed to bad credentials
    /// or a server fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::PasswordMismatch | Self::UserExists | Self::InvalidUsername | Self::InvalidCommand
        )
    }
}

/// Verifies connection tokens.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Resolve `token` to the username it was issued for.
    async fn verify(&self, token: &str) -> Result<Username, AuthError>;
}
