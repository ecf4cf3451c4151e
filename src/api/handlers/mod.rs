//! API handlers.
//!
//! Business endpoints (posts, comments, votes) live outside this crate; what is
//! here exposes the session core plus the service's own health and schema.

pub mod auth;
pub mod health;

use axum::response::{IntoResponse, Json};

// axum handler for the OpenAPI document
pub async fn openapi_json() -> impl IntoResponse {
    Json(super::openapi())
}
