use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CredentialStore, RefreshTokenRecord, SaveOutcome, UserCredentials};

/// In-process store with the same semantics as the Postgres schema: refresh
/// tokens are unique, must reference an existing user, and are dropped when
/// their owner is removed.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    users: HashSet<Uuid>,
    // by username
    credentials: HashMap<String, UserCredentials>,
    refresh_tokens: HashMap<String, RefreshTokenRecord>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_users(users: impl IntoIterator<Item = Uuid>) -> Self {
        Self {
            inner: RwLock::new(Inner {
                users: users.into_iter().collect(),
                ..Inner::default()
            }),
        }
    }

    /// Register a user who can log in; returns the new id.
    ///
    /// Re-registering a username replaces its credentials.
    pub async fn add_user(&self, username: &str, password_hash: String) -> Uuid {
        let user_id = Uuid::new_v4();
        let mut inner = self.inner.write().await;
        inner.users.insert(user_id);
        if let Some(previous) = inner.credentials.insert(
            username.to_string(),
            UserCredentials {
                user_id,
                password_hash,
            },
        ) {
            inner.users.remove(&previous.user_id);
        }
        user_id
    }

    /// Remove a user and cascade to their refresh tokens.
    pub async fn remove_user(&self, user_id: Uuid) -> bool {
        let mut inner = self.inner.write().await;
        inner
            .refresh_tokens
            .retain(|_, record| record.user_id != user_id);
        inner
            .credentials
            .retain(|_, credentials| credentials.user_id != user_id);
        inner.users.remove(&user_id)
    }

    pub async fn refresh_tokens_for(&self, user_id: Uuid) -> Vec<RefreshTokenRecord> {
        self.inner
            .read()
            .await
            .refresh_tokens
            .values()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn user_exists(&self, user_id: Uuid) -> Result<bool> {
        Ok(self.inner.read().await.users.contains(&user_id))
    }

    async fn find_credentials(&self, username: &str) -> Result<Option<UserCredentials>> {
        Ok(self.inner.read().await.credentials.get(username).cloned())
    }

    async fn save_refresh_token(&self, record: &RefreshTokenRecord) -> Result<SaveOutcome> {
        let mut inner = self.inner.write().await;
        if !inner.users.contains(&record.user_id) {
            return Err(anyhow!(
                "refresh token owner {} does not exist",
                record.user_id
            ));
        }
        if inner.refresh_tokens.contains_key(&record.token) {
            return Ok(SaveOutcome::Conflict);
        }
        inner
            .refresh_tokens
            .insert(record.token.clone(), record.clone());
        Ok(SaveOutcome::Saved)
    }

    async fn load_refresh_token(&self, token: &str) -> Result<Option<RefreshTokenRecord>> {
        Ok(self.inner.read().await.refresh_tokens.get(token).cloned())
    }
}
