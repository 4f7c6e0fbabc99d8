//! Token secret and seeded user directory configuration.

use serde::Deserialize;

/// Authentication configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret used to mint and verify connection tokens.
    ///
    /// Required unless `PORTALD_ALLOW_EPHEMERAL_SECRET` is set, in which case
    /// a random secret is generated and tokens do not survive a restart.
    pub secret: Option<String>,
    /// Accounts loaded into the in-memory user directory at startup.
    #[serde(default)]
    pub users: Vec<SeedUser>,
}

/// One pre-provisioned account.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedUser {
    /// Account name.
    pub name: String,
    /// bcrypt hash of the password (`$2b$...`).
    pub password_hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn users_default_to_empty() {
        let auth: AuthConfig = toml::from_str(r#"secret = "0123456789abcdef""#).unwrap();
        assert_eq!(auth.secret.as_deref(), Some("0123456789abcdef"));
        assert!(auth.users.is_empty());
    }

    #[test]
    fn parses_seed_users() {
        let auth: AuthConfig = toml::from_str(
            r#"
[[users]]
name = "alice"
password_hash = "$2b$04$abcdefghijklmnopqrstuu"
"#,
        )
        .unwrap();
        assert!(auth.secret.is_none());
        assert_eq!(auth.users.len(), 1);
        assert_eq!(auth.users[0].name, "alice");
    }
}
