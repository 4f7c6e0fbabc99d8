//! Login line grammar.
//!
//! ```text
//! login <username> <password>
//! register <username> <password> <confirm>
//! ```

use super::{AuthError, HmacTokenAuth, UserDirectory};
use crate::handlers::core::context::is_valid_name;
use tracing::info;

/// A parsed login or registration line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginRequest {
    Login {
        username: String,
        password: String,
    },
    Register {
        username: String,
        password: String,
        confirm: String,
    },
}

impl LoginRequest {
    /// Parse one whitespace-separated line. Anything else is
    /// [`AuthError::InvalidCommand`].
    pub fn parse(line: &str) -> Result<Self, AuthError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            ["login", username, password] => Ok(Self::Login {
                username: username.to_string(),
                password: password.to_string(),
            }),
            ["register", username, password, confirm] => Ok(Self::Register {
                username: username.to_string(),
                password: password.to_string(),
                confirm: confirm.to_string(),
            }),
            _ => Err(AuthError::InvalidCommand),
        }
    }

    pub fn username(&self) -> &str {
        match self {
            Self::Login { username, .. } | Self::Register { username, .. } => username,
        }
    }
}

/// Check or create the account named in `request` and mint its token.
pub async fn authenticate(
    directory: &dyn UserDirectory,
    tokens: &HmacTokenAuth,
    request: &LoginRequest,
    max_name_length: usize,
) -> Result<String, AuthError> {
    match request {
        LoginRequest::Login { username, password } => {
            directory.verify(username, password).await?;
        }
        LoginRequest::Register {
            username,
            password,
            confirm,
        } => {
            if password != confirm {
                return Err(AuthError::PasswordMismatch);
            }
            if !is_valid_name(username, max_name_length) {
                return Err(AuthError::InvalidUsername);
            }
            if directory.exists(username).await {
                return Err(AuthError::UserExists);
            }
            directory.create(username, password).await?;
            info!(username = %username, "account created");
        }
    }

    Ok(tokens.issue(request.username()))
}
