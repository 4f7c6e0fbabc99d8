//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use super::defaults::MIN_SECRET_LEN;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("server.name is required")]
    MissingServerName,
    #[error("auth.secret must be at least {MIN_SECRET_LEN} characters, got {0}")]
    SecretTooShort(usize),
    #[error("auth.users contains duplicate name '{0}'")]
    DuplicateSeedUser(String),
    #[error("auth.users entry '{0}' does not have a bcrypt password_hash")]
    InvalidPasswordHash(String),
    #[error("limits.{0} must be greater than zero")]
    ZeroLimit(&'static str),
    #[error("plaintext.address must differ from listen.address")]
    ListenerConflict,
    #[error("motd.file does not exist: {0}")]
    MotdFileNotFound(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.name.trim().is_empty() {
        errors.push(ValidationError::MissingServerName);
    }

    if let Some(ref secret) = config.auth.secret
        && secret.len() < MIN_SECRET_LEN
    {
        errors.push(ValidationError::SecretTooShort(secret.len()));
    }

    let mut seen = HashSet::new();
    for user in &config.auth.users {
        if !seen.insert(user.name.as_str()) {
            errors.push(ValidationError::DuplicateSeedUser(user.name.clone()));
        }
        if !user.password_hash.starts_with("$2") {
            errors.push(ValidationError::InvalidPasswordHash(user.name.clone()));
        }
    }

    let limits = &config.limits;
    for (name, value) in [
        ("max_line_length", limits.max_line_length),
        ("outbound_queue", limits.outbound_queue),
        ("max_name_length", limits.max_name_length),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroLimit(name));
        }
    }

    if let Some(ref plain) = config.plaintext
        && plain.address == config.listen.address
    {
        errors.push(ValidationError::ListenerConflict);
    }

    if let Some(ref file) = config.motd.file
        && !Path::new(file).exists()
    {
        errors.push(ValidationError::MotdFileNotFound(file.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(extra: &str) -> Config {
        let base = "[listen]\naddress = \"127.0.0.1:8000\"\n";
        toml::from_str(&format!("{base}{extra}")).unwrap()
    }

    #[test]
    fn minimal_config_is_valid() {
        assert_eq!(validate(&config("")), Ok(()));
    }

    #[test]
    fn short_secret_is_rejected() {
        let errors = validate(&config("[auth]\nsecret = \"short\"\n")).unwrap_err();
        assert_eq!(errors, vec![ValidationError::SecretTooShort(5)]);
    }

    #[test]
    fn collects_every_problem() {
        let errors = validate(&config(
            r#"
[server]
name = " "

[plaintext]
address = "127.0.0.1:8000"

[limits]
outbound_queue = 0

[[auth.users]]
name = "bob"
password_hash = "plain"

[[auth.users]]
name = "bob"
password_hash = "$2b$04$x"
"#,
        ))
        .unwrap_err();
        assert!(errors.contains(&ValidationError::MissingServerName));
        assert!(errors.contains(&ValidationError::ListenerConflict));
        assert!(errors.contains(&ValidationError::ZeroLimit("outbound_queue")));
        assert!(errors.contains(&ValidationError::InvalidPasswordHash("bob".into())));
        assert!(errors.contains(&ValidationError::DuplicateSeedUser("bob".into())));
        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn missing_motd_file_is_reported() {
        let errors = validate(&config("[motd]\nfile = \"/nonexistent/motd\"\n")).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::MotdFileNotFound("/nonexistent/motd".into())]
        );
    }
}
