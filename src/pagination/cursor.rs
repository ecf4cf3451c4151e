//! Opaque continuation tokens for keyset pagination.
//!
//! A cursor is a small struct serialized as JSON and wrapped in standard
//! (padded) base64. Clients must treat the string as opaque; the server treats
//! anything it receives as untrusted and validates it after decoding.
//!
//! `encode(decode(s)) == s` holds for cursors this server emitted. Decoding is
//! lenient about equivalent spellings (`null` for an absent boundary, a
//! non-UTC offset, unknown fields), and those come back out in canonical form
//! on re-encode. Only the boundary they carry matters.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use base64ct::{Base64, Encoding};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const INVALID_CURSOR_MESSAGE: &str = "invalid cursor format";

#[derive(Debug, Error)]
pub enum CursorError {
    #[error("cursor is not valid base64")]
    Encoding,
    #[error("cursor payload is not valid: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("cursor violates constraint: {0}")]
    Constraint(&'static str),
}

impl IntoResponse for CursorError {
    fn into_response(self) -> Response {
        debug!("rejected cursor: {self}");
        (StatusCode::BAD_REQUEST, INVALID_CURSOR_MESSAGE).into_response()
    }
}

/// A decodable cursor type.
///
/// `Default` is the "no cursor" value that an empty string decodes to.
pub trait PageCursor: Serialize + DeserializeOwned + Default {
    /// Check field constraints after decoding.
    ///
    /// # Errors
    /// Returns [`CursorError::Constraint`] if a field is out of range.
    fn validate(&self) -> Result<(), CursorError> {
        Ok(())
    }
}

/// Serialize a cursor into its opaque form.
///
/// # Errors
/// Returns an error only if the cursor type fails to serialize.
pub fn encode<C: Serialize>(cursor: &C) -> Result<String, CursorError> {
    let json = serde_json::to_vec(cursor)?;
    Ok(Base64::encode_string(&json))
}

/// Decode an opaque cursor; the empty string is the first page.
///
/// # Errors
/// Returns an error if `raw` is not base64, not the expected JSON shape, or
/// fails the cursor's own validation.
pub fn decode<C: PageCursor>(raw: &str) -> Result<C, CursorError> {
    if raw.is_empty() {
        return Ok(C::default());
    }

    let bytes = Base64::decode_vec(raw).map_err(|_| CursorError::Encoding)?;
    let cursor: C = serde_json::from_slice(&bytes)?;
    cursor.validate()?;

    Ok(cursor)
}

/// Boundary on `created_at`, shared by the post and comment listings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedAtCursor {
    #[serde(
        rename = "createdAt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    created_at: Option<DateTime<Utc>>,
}

impl CreatedAtCursor {
    #[must_use]
    pub fn new(created_at: DateTime<Utc>) -> Self {
        Self {
            created_at: Some(created_at),
        }
    }

    /// Inclusive upper bound for the next query, `None` on the first page.
    #[must_use]
    pub fn boundary(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

impl PageCursor for CreatedAtCursor {
    fn validate(&self) -> Result<(), CursorError> {
        match self.created_at {
            Some(created_at) if created_at.timestamp() < 0 => {
                Err(CursorError::Constraint("createdAt before unix epoch"))
            }
            _ => Ok(()),
        }
    }
}
