//! Access token (HS256 JWT) signing/verification and refresh token generation.
//!
//! Signature validity and temporal validity are separate checks:
//! [`TokenCodec::verify_access_token`] only proves the token was minted with our
//! key and carries well-formed claims. Callers compare [`AccessClaims::exp`]
//! against their clock.

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, TimeDelta, Utc};
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

use super::keystore::SigningKey;

type HmacSha256 = Hmac<Sha256>;

pub const ACCESS_TOKEN_ALG: &str = "HS256";
pub const DEFAULT_ACCESS_TOKEN_TTL_SECONDS: i64 = 10 * 60;
pub const REFRESH_TOKEN_BYTES: usize = 32;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("malformed token claims")]
    MalformedClaims,
    #[error("failed to encode token: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("invalid signing key")]
    InvalidKey,
    #[error("token expiry out of range")]
    ExpiryOutOfRange,
    #[error("failed to read random bytes: {0}")]
    Entropy(#[source] rand::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessTokenHeader {
    pub alg: String,
    pub typ: String,
}

impl AccessTokenHeader {
    fn hs256() -> Self {
        Self {
            alg: ACCESS_TOKEN_ALG.to_string(),
            typ: "JWT".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessClaims {
    #[serde(rename = "userID")]
    pub user_id: Uuid,
    /// Expiration as unix seconds.
    pub exp: i64,
}

impl AccessClaims {
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

fn b64e_json<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let json = serde_json::to_vec(value)?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn b64d_json<T: for<'de> Deserialize<'de>>(s: &str) -> Option<T> {
    let bytes = Base64UrlUnpadded::decode_vec(s).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Signs and verifies access tokens with the injected [`SigningKey`].
#[derive(Debug)]
pub struct TokenCodec {
    key: SigningKey,
    access_ttl: TimeDelta,
}

impl TokenCodec {
    #[must_use]
    pub fn new(key: SigningKey) -> Self {
        Self {
            key,
            access_ttl: TimeDelta::seconds(DEFAULT_ACCESS_TOKEN_TTL_SECONDS),
        }
    }

    #[must_use]
    pub fn with_access_token_ttl(mut self, ttl: TimeDelta) -> Self {
        self.access_ttl = ttl;
        self
    }

    #[must_use]
    pub fn access_token_ttl(&self) -> TimeDelta {
        self.access_ttl
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        HmacSha256::new_from_slice(self.key.expose()).map_err(|_| TokenError::InvalidKey)
    }

    /// Issue an access token for `user_id` that expires `access_ttl` after `now`.
    ///
    /// # Errors
    /// Returns an error if the expiry overflows or the header/claims cannot be encoded.
    pub fn issue_access_token(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let expires_at = now
            .checked_add_signed(self.access_ttl)
            .ok_or(TokenError::ExpiryOutOfRange)?;
        let claims = AccessClaims {
            user_id,
            exp: expires_at.timestamp(),
        };

        let header_b64 = b64e_json(&AccessTokenHeader::hs256())?;
        let claims_b64 = b64e_json(&claims)?;
        let signing_input = format!("{header_b64}.{claims_b64}");

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature_b64 = Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes());

        Ok(format!("{signing_input}.{signature_b64}"))
    }

    /// Verify the signature of an access token and decode its claims.
    ///
    /// Expiration is NOT checked here.
    ///
    /// # Errors
    /// - [`TokenError::InvalidSignature`] if the token is not three segments, the header
    ///   does not declare `HS256`, or the signature does not match.
    /// - [`TokenError::MalformedClaims`] if the signed claims do not decode.
    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let mut parts = token.split('.');
        let header_b64 = parts.next().ok_or(TokenError::InvalidSignature)?;
        let claims_b64 = parts.next().ok_or(TokenError::InvalidSignature)?;
        let sig_b64 = parts.next().ok_or(TokenError::InvalidSignature)?;
        if parts.next().is_some() {
            return Err(TokenError::InvalidSignature);
        }

        // Reject algorithm substitution (e.g. "none") before touching the signature.
        let header: AccessTokenHeader =
            b64d_json(header_b64).ok_or(TokenError::InvalidSignature)?;
        if header.alg != ACCESS_TOKEN_ALG {
            return Err(TokenError::InvalidSignature);
        }

        let signature =
            Base64UrlUnpadded::decode_vec(sig_b64).map_err(|_| TokenError::InvalidSignature)?;
        let mut mac = self.mac()?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(claims_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        b64d_json(claims_b64).ok_or(TokenError::MalformedClaims)
    }
}

/// Generate an opaque refresh token: 32 bytes from the OS RNG, lowercase hex.
///
/// # Errors
/// Returns [`TokenError::Entropy`] if the OS random source fails.
pub fn issue_refresh_token() -> Result<String, TokenError> {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(TokenError::Entropy)?;
    Ok(hex::encode(bytes))
}
