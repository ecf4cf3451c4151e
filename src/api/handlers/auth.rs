//! Endpoints over the session lifecycle.
//!
//! Flow Overview: `POST /v1/auth/login` checks a username and password and
//! returns an access/refresh pair; `POST /v1/auth/token` trades a refresh token for a new access
//! token; `GET /v1/auth/me` runs the auth gate and echoes the resolved user.
//! Handlers read the clock once and pass it down.

use axum::{
    extract::Extension,
    http::HeaderMap,
    response::{IntoResponse, Json},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{AuthError, AuthGate, SessionService, TokenPair};

#[derive(ToSchema, Deserialize)]
pub struct LoginRequest {
    username: String,
    password: String,
}

#[derive(ToSchema, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    refresh_token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    access_token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct IdentityResponse {
    #[serde(rename = "userID")]
    user_id: Uuid,
}

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses (
        (status = 200, description = "New session", body = TokenPair),
        (status = 400, description = "Malformed JSON body or missing field", body = String),
        (status = 401, description = "Invalid password", body = String),
        (status = 404, description = "User not found", body = String),
    ),
    tag = "auth"
)]
pub async fn login(
    sessions: Extension<Arc<SessionService>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return AuthError::InvalidRequest("invalid json body".to_string()).into_response();
    };

    match sessions
        .login(&request.username, &request.password, Utc::now())
        .await
    {
        Ok(pair) => Json(pair).into_response(),
        Err(err) => {
            debug!("login rejected for {}: {err}", request.username);
            err.into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/token",
    request_body = RefreshRequest,
    responses (
        (status = 200, description = "New access token", body = AccessTokenResponse),
        (status = 400, description = "Malformed JSON body", body = String),
        (status = 401, description = "Refresh token expired", body = String),
        (status = 404, description = "Refresh token not found", body = String),
    ),
    tag = "auth"
)]
pub async fn refresh(
    sessions: Extension<Arc<SessionService>>,
    payload: Option<Json<RefreshRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return AuthError::InvalidRequest("invalid json body".to_string()).into_response();
    };

    match sessions.refresh(&request.refresh_token, Utc::now()).await {
        Ok(access_token) => Json(AccessTokenResponse { access_token }).into_response(),
        Err(err) => {
            debug!("refresh exchange rejected: {err}");
            err.into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/v1/auth/me",
    responses (
        (status = 200, description = "Authenticated user", body = IdentityResponse),
        (status = 400, description = "Missing or malformed Authorization header", body = String),
        (status = 401, description = "Invalid, expired, or orphaned access token", body = String),
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn me(
    headers: HeaderMap,
    gate: Extension<Arc<AuthGate>>,
) -> Result<Json<IdentityResponse>, AuthError> {
    let identity = gate.authenticate(&headers, Utc::now()).await?;

    Ok(Json(IdentityResponse {
        user_id: identity.user_id(),
    }))
}
