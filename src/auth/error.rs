//! Auth error taxonomy and its HTTP mapping.
//!
//! Client mistakes are returned verbatim. Internal faults are logged with the
//! full error chain and answered with a generic body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

const INTERNAL_ERROR_BODY: &str = "Internal Server Error";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing or malformed Authorization header")]
    MissingCredentials,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("{0}")]
    InvalidRequest(String),
    #[error("user not found")]
    UserNotFound,
    #[error("invalid password")]
    InvalidPassword,
    #[error("refresh token not found")]
    RefreshTokenNotFound,
    #[error("token expired")]
    RefreshTokenExpired,
    #[error("failed to generate token: {0}")]
    TokenGenerationFailed(String),
    #[error("storage error: {0:#}")]
    Storage(#[source] anyhow::Error),
    #[error("internal error: {0:#}")]
    Internal(#[source] anyhow::Error),
}

impl AuthError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingCredentials | Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized | Self::InvalidPassword | Self::RefreshTokenExpired => {
                StatusCode::UNAUTHORIZED
            }
            Self::UserNotFound | Self::RefreshTokenNotFound => StatusCode::NOT_FOUND,
            Self::TokenGenerationFailed(_) | Self::Storage(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    #[must_use]
    pub fn is_internal(&self) -> bool {
        self.status().is_server_error()
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        if self.is_internal() {
            error!("{self}");
            return (status, INTERNAL_ERROR_BODY).into_response();
        }
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use axum::body::to_bytes;

    async fn body_of(err: AuthError) -> (StatusCode, String) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_default();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    #[tokio::test]
    async fn client_errors_are_returned_verbatim() {
        assert_eq!(
            body_of(AuthError::MissingCredentials).await,
            (
                StatusCode::BAD_REQUEST,
                "missing or malformed Authorization header".to_string()
            )
        );
        assert_eq!(
            body_of(AuthError::Unauthorized).await,
            (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
        );
        assert_eq!(
            body_of(AuthError::RefreshTokenNotFound).await,
            (StatusCode::NOT_FOUND, "refresh token not found".to_string())
        );
        assert_eq!(
            body_of(AuthError::UserNotFound).await,
            (StatusCode::NOT_FOUND, "user not found".to_string())
        );
        assert_eq!(
            body_of(AuthError::InvalidPassword).await,
            (StatusCode::UNAUTHORIZED, "invalid password".to_string())
        );
        assert_eq!(
            body_of(AuthError::RefreshTokenExpired).await,
            (StatusCode::UNAUTHORIZED, "token expired".to_string())
        );
        assert_eq!(
            body_of(AuthError::InvalidRequest("invalid json body".to_string())).await,
            (StatusCode::BAD_REQUEST, "invalid json body".to_string())
        );
    }

    #[tokio::test]
    async fn internal_errors_are_not_leaked() {
        let err = AuthError::Storage(
            anyhow!("connection refused").context("failed to check user id"),
        );
        assert!(err.to_string().contains("connection refused"));

        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, INTERNAL_ERROR_BODY);

        let (status, body) =
            body_of(AuthError::TokenGenerationFailed("rng failure".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.contains("rng"));

        let (status, body) =
            body_of(AuthError::Internal(anyhow!("invalid password hash format"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, INTERNAL_ERROR_BODY);
    }
}
