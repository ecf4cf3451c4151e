//! Credential store contract consumed by the auth gate and session service.
//!
//! The store owns persistence of refresh tokens, answers whether a user still
//! exists, and resolves a username to its password hash for login. Errors are
//! storage faults; "not found" is `Ok(None)` / `Ok(false)` so callers never
//! confuse a missing row with a broken database.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

mod memory;
mod postgres;

pub use memory::MemoryCredentialStore;
pub use postgres::PgCredentialStore;

#[derive(Clone, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for RefreshTokenRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshTokenRecord")
            .field("token", &"<redacted>")
            .field("user_id", &self.user_id)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Login lookup result; `password_hash` is a PHC string.
#[derive(Clone, PartialEq, Eq)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub password_hash: String,
}

impl std::fmt::Debug for UserCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserCredentials")
            .field("user_id", &self.user_id)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

/// Result of inserting a refresh token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// The token string is already taken.
    Conflict,
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn user_exists(&self, user_id: Uuid) -> Result<bool>;

    async fn find_credentials(&self, username: &str) -> Result<Option<UserCredentials>>;

    async fn save_refresh_token(&self, record: &RefreshTokenRecord) -> Result<SaveOutcome>;

    async fn load_refresh_token(&self, token: &str) -> Result<Option<RefreshTokenRecord>>;

    /// Reachability check for `/health`.
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
