//! Session and credential lifecycle.
//!
//! - `keystore` holds the symmetric signing key.
//! - `token` signs/verifies access tokens and mints refresh tokens.
//! - `password` hashes and checks login passwords.
//! - `store` is the persistence contract for refresh tokens and user liveness.
//! - `gate` authenticates bearer requests.
//! - `session` issues token pairs and exchanges refresh tokens.

pub mod error;
pub mod gate;
pub mod keystore;
pub mod password;
pub mod session;
pub mod store;
pub mod token;

pub use error::AuthError;
pub use gate::{AuthGate, AuthenticatedIdentity};
pub use keystore::SigningKey;
pub use session::{SessionService, TokenPair};
pub use store::{CredentialStore, MemoryCredentialStore, PgCredentialStore, UserCredentials};
pub use token::TokenCodec;

use anyhow::{bail, Result};
use chrono::TimeDelta;
use std::sync::Arc;

use session::DEFAULT_REFRESH_TOKEN_TTL_SECONDS;
use token::DEFAULT_ACCESS_TOKEN_TTL_SECONDS;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    access_token_ttl_seconds: i64,
    refresh_token_ttl_seconds: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            access_token_ttl_seconds: DEFAULT_ACCESS_TOKEN_TTL_SECONDS,
            refresh_token_ttl_seconds: DEFAULT_REFRESH_TOKEN_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_access_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.access_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_refresh_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.refresh_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn access_token_ttl_seconds(&self) -> i64 {
        self.access_token_ttl_seconds
    }

    #[must_use]
    pub fn refresh_token_ttl_seconds(&self) -> i64 {
        self.refresh_token_ttl_seconds
    }

    /// # Errors
    /// Returns an error if either TTL is not positive.
    pub fn validate(&self) -> Result<()> {
        if self.access_token_ttl_seconds <= 0 {
            bail!(
                "access token TTL must be positive, got {}",
                self.access_token_ttl_seconds
            );
        }
        if self.refresh_token_ttl_seconds <= 0 {
            bail!(
                "refresh token TTL must be positive, got {}",
                self.refresh_token_ttl_seconds
            );
        }
        Ok(())
    }

    /// Wire the gate and session service over a shared codec and store.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn build(
        &self,
        key: SigningKey,
        store: Arc<dyn CredentialStore>,
    ) -> Result<(AuthGate, SessionService)> {
        self.validate()?;

        let codec = Arc::new(
            TokenCodec::new(key)
                .with_access_token_ttl(TimeDelta::seconds(self.access_token_ttl_seconds)),
        );
        let gate = AuthGate::new(codec.clone(), store.clone());
        let sessions = SessionService::new(codec, store)
            .with_refresh_token_ttl(TimeDelta::seconds(self.refresh_token_ttl_seconds));

        Ok((gate, sessions))
    }
}
