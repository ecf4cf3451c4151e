//! Symmetric signing key used for access tokens.
//!
//! The key is built once at startup from the configured secret and handed to
//! the token codec. Nothing else holds a copy, and `Debug` never prints it.

use secrecy::{ExposeSecret, SecretSlice, SecretString};
use thiserror::Error;
use tracing::warn;

/// Shorter secrets still work with HMAC but are easier to brute force.
pub const RECOMMENDED_KEY_BYTES: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("signing secret must not be empty")]
    Empty,
}

pub struct SigningKey {
    bytes: SecretSlice<u8>,
}

impl SigningKey {
    /// Build a key from the configured secret.
    ///
    /// # Errors
    /// Returns [`KeyError::Empty`] if the secret has no bytes.
    pub fn from_secret(secret: &SecretString) -> Result<Self, KeyError> {
        Self::from_bytes(secret.expose_secret().as_bytes().to_vec())
    }

    /// Build a key from raw bytes (tests use fixed throwaway keys).
    ///
    /// # Errors
    /// Returns [`KeyError::Empty`] if `bytes` is empty.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, KeyError> {
        if bytes.is_empty() {
            return Err(KeyError::Empty);
        }
        if bytes.len() < RECOMMENDED_KEY_BYTES {
            warn!(
                "signing secret is {} bytes, at least {} are recommended",
                bytes.len(),
                RECOMMENDED_KEY_BYTES
            );
        }
        Ok(Self {
            bytes: SecretSlice::from(bytes),
        })
    }

    pub(crate) fn expose(&self) -> &[u8] {
        self.bytes.expose_secret()
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("len", &self.expose().len())
            .finish_non_exhaustive()
    }
}
