//! Account storage.

use super::AuthError;
use crate::config::SeedUser;
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// Account lookup and creation.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn exists(&self, username: &str) -> bool;

    /// Check `password` for `username`.
    async fn verify(&self, username: &str, password: &str) -> Result<(), AuthError>;

    /// Create an account. Fails if the name is taken.
    async fn create(&self, username: &str, password: &str) -> Result<(), AuthError>;
}

/// In-memory accounts with bcrypt password hashes.
///
/// Accounts live for the lifetime of the process; seeded accounts come from
/// the `[[auth.users]]` config entries.
#[derive(Debug)]
pub struct MemoryUserDirectory {
    users: DashMap<String, String>,
    cost: u32,
}

impl Default for MemoryUserDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::with_cost(bcrypt::DEFAULT_COST)
    }

    /// Directory hashing new passwords at `cost`.
    pub fn with_cost(cost: u32) -> Self {
        Self {
            users: DashMap::new(),
            cost,
        }
    }

    /// Directory holding the configured accounts.
    pub fn seeded(seed: &[SeedUser]) -> Self {
        let directory = Self::new();
        for user in seed {
            directory
                .users
                .insert(user.name.clone(), user.password_hash.clone());
        }
        directory
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn exists(&self, username: &str) -> bool {
        self.users.contains_key(username)
    }

    async fn verify(&self, username: &str, password: &str) -> Result<(), AuthError> {
        let Some(hash) = self.users.get(username).map(|h| h.clone()) else {
            return Err(AuthError::InvalidCredentials);
        };
        let password = password.to_string();
        let valid = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| AuthError::Hash(e.to_string()))?
            .unwrap_or(false);

        if valid {
            Ok(())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    async fn create(&self, username: &str, password: &str) -> Result<(), AuthError> {
        if self.users.contains_key(username) {
            return Err(AuthError::UserExists);
        }

        let password = password.to_string();
        let cost = self.cost;
        let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| AuthError::Hash(e.to_string()))?
            .map_err(|e| AuthError::Hash(e.to_string()))?;

        match self.users.entry(username.to_string()) {
            Entry::Occupied(_) => Err(AuthError::UserExists),
            Entry::Vacant(slot) => {
                slot.insert(hash);
                Ok(())
            }
        }
    }
}
