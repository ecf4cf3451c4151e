//! Authentication gate for protected endpoints.
//!
//! Flow: read `Authorization: Bearer <token>`, verify the signature, check the
//! expiry against the caller's clock, then confirm the subject still exists.
//! The first failing step ends the request. The gate never writes, so an
//! abandoned request leaves nothing behind.

use axum::http::{header::AUTHORIZATION, HeaderMap};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::{error::AuthError, store::CredentialStore, token::TokenCodec};

/// User resolved from a verified access token, valid for one request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthenticatedIdentity {
    user_id: Uuid,
}

impl AuthenticatedIdentity {
    #[must_use]
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }
}

pub struct AuthGate {
    codec: Arc<TokenCodec>,
    store: Arc<dyn CredentialStore>,
}

impl AuthGate {
    pub fn new(codec: Arc<TokenCodec>, store: Arc<dyn CredentialStore>) -> Self {
        Self { codec, store }
    }

    /// Resolve the request's bearer token into an identity.
    ///
    /// # Errors
    /// - [`AuthError::MissingCredentials`] if there is no usable `Bearer` header.
    /// - [`AuthError::Unauthorized`] if the token is forged, expired, or its user is gone.
    /// - [`AuthError::Storage`] if the existence check itself fails.
    pub async fn authenticate(
        &self,
        headers: &HeaderMap,
        now: DateTime<Utc>,
    ) -> Result<AuthenticatedIdentity, AuthError> {
        let token = extract_bearer_token(headers).ok_or(AuthError::MissingCredentials)?;

        let claims = self.codec.verify_access_token(token).map_err(|err| {
            debug!("access token rejected: {err}");
            AuthError::Unauthorized
        })?;

        let expired = claims
            .expires_at()
            .map_or(true, |expires_at| expires_at < now);
        if expired {
            debug!("access token expired for user {}", claims.user_id);
            return Err(AuthError::Unauthorized);
        }

        // A user may delete their account while still holding an unexpired token.
        match self.store.user_exists(claims.user_id).await {
            Ok(true) => Ok(AuthenticatedIdentity {
                user_id: claims.user_id,
            }),
            Ok(false) => {
                debug!("access token subject {} no longer exists", claims.user_id);
                Err(AuthError::Unauthorized)
            }
            Err(err) => Err(AuthError::Storage(err.context("error checking user ID"))),
        }
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let token = headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
