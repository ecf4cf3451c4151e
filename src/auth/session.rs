//! Login and refresh-token sessions.
//!
//! A login checks the username and password, then issues an access token plus
//! a refresh token persisted for seven days. Presenting the refresh token later
//! yields a fresh access token; the refresh token itself is not rotated and
//! stays valid until it expires or its owner is deleted. Each login adds an
//! independent refresh token, so several devices can hold one at the same time.

use chrono::{DateTime, TimeDelta, Utc};
use regex::Regex;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{
    error::AuthError,
    password::verify_password,
    store::{CredentialStore, RefreshTokenRecord, SaveOutcome, UserCredentials},
    token::{issue_refresh_token, TokenCodec},
};

pub const DEFAULT_REFRESH_TOKEN_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

// One retry on a uniqueness conflict, then give up.
const REFRESH_TOKEN_ATTEMPTS: u32 = 2;

pub const MAX_CREDENTIAL_LENGTH: usize = 50;

#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub refresh_expires_at: DateTime<Utc>,
}

pub struct SessionService {
    codec: Arc<TokenCodec>,
    store: Arc<dyn CredentialStore>,
    refresh_ttl: TimeDelta,
}

impl SessionService {
    pub fn new(codec: Arc<TokenCodec>, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            codec,
            store,
            refresh_ttl: TimeDelta::seconds(DEFAULT_REFRESH_TOKEN_TTL_SECONDS),
        }
    }

    #[must_use]
    pub fn with_refresh_token_ttl(mut self, ttl: TimeDelta) -> Self {
        self.refresh_ttl = ttl;
        self
    }

    #[must_use]
    pub fn refresh_token_ttl(&self) -> TimeDelta {
        self.refresh_ttl
    }

    /// Check a username/password pair and open a session for that user.
    ///
    /// The hash comparison runs on the blocking pool.
    ///
    /// # Errors
    /// - [`AuthError::InvalidRequest`] if either field is empty or longer than
    ///   [`MAX_CREDENTIAL_LENGTH`].
    /// - [`AuthError::UserNotFound`] if no user has that username.
    /// - [`AuthError::InvalidPassword`] if the password does not match.
    /// - [`AuthError::Internal`] if the stored hash cannot be checked.
    /// - Anything [`SessionService::issue`] returns.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, AuthError> {
        check_credential_field("username", username)?;
        check_credential_field("password", password)?;

        let UserCredentials {
            user_id,
            password_hash,
        } = self
            .store
            .find_credentials(username)
            .await
            .map_err(|err| AuthError::Storage(err.context("error getting user")))?
            .ok_or(AuthError::UserNotFound)?;

        let password = password.to_string();
        let matches =
            tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
                .await
                .map_err(|err| AuthError::Internal(err.into()))?
                .map_err(|err| AuthError::Internal(err.context("error checking password")))?;

        if !matches {
            debug!("wrong password for user {user_id}");
            return Err(AuthError::InvalidPassword);
        }

        self.issue(user_id, now).await
    }

    /// Issue an access/refresh pair for an authenticated user and persist the refresh token.
    ///
    /// # Errors
    /// - [`AuthError::TokenGenerationFailed`] if signing fails, the RNG fails, or two
    ///   generated refresh tokens in a row collide with existing ones.
    /// - [`AuthError::Storage`] if the store rejects the insert for another reason.
    pub async fn issue(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<TokenPair, AuthError> {
        let access_token = self
            .codec
            .issue_access_token(user_id, now)
            .map_err(|err| AuthError::TokenGenerationFailed(err.to_string()))?;

        let expires_at = now.checked_add_signed(self.refresh_ttl).ok_or_else(|| {
            AuthError::TokenGenerationFailed("refresh token expiry out of range".to_string())
        })?;

        for attempt in 1..=REFRESH_TOKEN_ATTEMPTS {
            let record = RefreshTokenRecord {
                token: issue_refresh_token()
                    .map_err(|err| AuthError::TokenGenerationFailed(err.to_string()))?,
                user_id,
                expires_at,
            };

            match self.store.save_refresh_token(&record).await {
                Ok(SaveOutcome::Saved) => {
                    debug!("issued refresh token for user {user_id}");
                    return Ok(TokenPair {
                        access_token,
                        refresh_token: record.token,
                        refresh_expires_at: expires_at,
                    });
                }
                Ok(SaveOutcome::Conflict) => {
                    warn!("refresh token collision on attempt {attempt}");
                }
                Err(err) => {
                    return Err(AuthError::Storage(
                        err.context("error creating refresh token"),
                    ));
                }
            }
        }

        Err(AuthError::TokenGenerationFailed(format!(
            "refresh token collided {REFRESH_TOKEN_ATTEMPTS} times"
        )))
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// # Errors
    /// - [`AuthError::RefreshTokenNotFound`] if the token is malformed or unknown.
    /// - [`AuthError::RefreshTokenExpired`] if it is past its expiry.
    /// - [`AuthError::Storage`] if the lookup fails.
    /// - [`AuthError::TokenGenerationFailed`] if signing the access token fails.
    pub async fn refresh(
        &self,
        refresh_token: &str,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        // Anything that is not a token we could have issued cannot be in the store.
        if !valid_refresh_token(refresh_token) {
            return Err(AuthError::RefreshTokenNotFound);
        }

        let record = self
            .store
            .load_refresh_token(refresh_token)
            .await
            .map_err(|err| AuthError::Storage(err.context("error getting refresh token")))?
            .ok_or(AuthError::RefreshTokenNotFound)?;

        if record.expires_at < now {
            return Err(AuthError::RefreshTokenExpired);
        }

        self.codec
            .issue_access_token(record.user_id, now)
            .map_err(|err| AuthError::TokenGenerationFailed(err.to_string()))
    }
}

fn check_credential_field(name: &str, value: &str) -> Result<(), AuthError> {
    if value.is_empty() {
        return Err(AuthError::InvalidRequest(format!("{name} is required")));
    }
    if value.chars().count() > MAX_CREDENTIAL_LENGTH {
        return Err(AuthError::InvalidRequest(format!(
            "{name} must be at most {MAX_CREDENTIAL_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Refresh tokens are 32 bytes as lowercase hex.
pub(crate) fn valid_refresh_token(token: &str) -> bool {
    Regex::new(r"^[0-9a-f]{64}$").is_ok_and(|re| re.is_match(token))
}
