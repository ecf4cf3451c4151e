use anyhow::{anyhow, Result};
use argon2::Params;
use axum::{
    body::{to_bytes, Body},
    http::{header::AUTHORIZATION, Method, Request, StatusCode},
    Router,
};
use chrono::{TimeDelta, Utc};
use iwonder::{
    api,
    auth::{
        password::hash_password, AuthConfig, CredentialStore, MemoryCredentialStore, SigningKey,
        TokenCodec,
    },
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &[u8] = b"auth-flow-signing-key-0123456789abcdef";
const PASSWORD: &str = "correct-horse-battery";

struct TestApp {
    router: Router,
    store: Arc<MemoryCredentialStore>,
    sessions: Arc<iwonder::auth::SessionService>,
}

fn app(users: &[Uuid]) -> Result<TestApp> {
    let store = Arc::new(MemoryCredentialStore::with_users(users.iter().copied()));
    let dyn_store: Arc<dyn CredentialStore> = store.clone();
    let (gate, sessions) =
        AuthConfig::new().build(SigningKey::from_bytes(SECRET.to_vec())?, dyn_store.clone())?;
    let sessions = Arc::new(sessions);
    let router = api::router(Arc::new(gate), sessions.clone(), dyn_store);
    Ok(TestApp {
        router,
        store,
        sessions,
    })
}

/// App with one user, `ada`, who logs in with [`PASSWORD`].
async fn app_with_ada() -> Result<(TestApp, Uuid)> {
    let app = app(&[])?;
    let params = Params::new(8, 1, 1, None).map_err(|err| anyhow!("{err}"))?;
    let user = app
        .store
        .add_user("ada", hash_password(PASSWORD, params)?)
        .await;
    Ok((app, user))
}

fn codec() -> Result<TokenCodec> {
    Ok(TokenCodec::new(SigningKey::from_bytes(SECRET.to_vec())?))
}

async fn send(router: &Router, request: Request<Body>) -> Result<(StatusCode, String)> {
    let response = router.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok((status, String::from_utf8_lossy(&bytes).into_owned()))
}

fn me(token: Option<&str>) -> Result<Request<Body>> {
    let mut builder = Request::builder().method(Method::GET).uri("/v1/auth/me");
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    Ok(builder.body(Body::empty())?)
}

fn login(username: &str, password: &str) -> Result<Request<Body>> {
    let body = serde_json::json!({ "username": username, "password": password });
    Ok(Request::builder()
        .method(Method::POST)
        .uri("/v1/auth/login")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))?)
}

fn exchange(body: &str) -> Result<Request<Body>> {
    Ok(Request::builder()
        .method(Method::POST)
        .uri("/v1/auth/token")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))?)
}

#[tokio::test]
async fn login_then_me_returns_user() -> Result<()> {
    let (app, user) = app_with_ada().await?;

    let (status, body) = send(&app.router, login("ada", PASSWORD)?).await?;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body)?;
    let access = json["accessToken"].as_str().unwrap_or_default();
    let refresh = json["refreshToken"].as_str().unwrap_or_default();
    assert_eq!(refresh.len(), 64);
    assert!(refresh.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));

    let (status, body) = send(&app.router, me(Some(access))?).await?;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body)?;
    assert_eq!(json["userID"], user.to_string());

    let (status, _) = send(
        &app.router,
        exchange(&format!(r#"{{"refreshToken":"{refresh}"}}"#))?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn wrong_password_is_unauthorized() -> Result<()> {
    let (app, user) = app_with_ada().await?;

    let (status, body) = send(&app.router, login("ada", "wrong-horse")?).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "invalid password");
    assert!(app.store.refresh_tokens_for(user).await.is_empty());
    Ok(())
}

#[tokio::test]
async fn unknown_user_login_is_not_found() -> Result<()> {
    let (app, _) = app_with_ada().await?;
    let (status, body) = send(&app.router, login("grace", PASSWORD)?).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "user not found");
    Ok(())
}

#[tokio::test]
async fn malformed_login_body_is_bad_request() -> Result<()> {
    let (app, _) = app_with_ada().await?;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/v1/auth/login")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"username":"ada"}"#))?;
    let (status, body) = send(&app.router, request).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "invalid json body");

    let (status, body) = send(&app.router, login("", PASSWORD)?).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "username is required");
    Ok(())
}

#[tokio::test]
async fn repeated_logins_hold_independent_refresh_tokens() -> Result<()> {
    let (app, user) = app_with_ada().await?;

    let mut refresh_tokens = Vec::new();
    for _ in 0..2 {
        let (status, body) = send(&app.router, login("ada", PASSWORD)?).await?;
        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_str(&body)?;
        refresh_tokens.push(json["refreshToken"].as_str().unwrap_or_default().to_string());
    }
    assert_ne!(refresh_tokens[0], refresh_tokens[1]);
    assert_eq!(app.store.refresh_tokens_for(user).await.len(), 2);

    // the second login does not revoke the first
    for refresh in &refresh_tokens {
        let body = format!(r#"{{"refreshToken":"{refresh}"}}"#);
        let (status, _) = send(&app.router, exchange(&body)?).await?;
        assert_eq!(status, StatusCode::OK);
    }
    Ok(())
}

#[tokio::test]
async fn missing_header_is_bad_request() -> Result<()> {
    let app = app(&[])?;
    let (status, body) = send(&app.router, me(None)?).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "missing or malformed Authorization header");
    Ok(())
}

#[tokio::test]
async fn forged_token_is_unauthorized() -> Result<()> {
    let user = Uuid::new_v4();
    let app = app(&[user])?;
    let other = TokenCodec::new(SigningKey::from_bytes(
        b"some-other-signing-key-0123456789abcdef".to_vec(),
    )?);
    let forged = other.issue_access_token(user, Utc::now())?;

    let (status, body) = send(&app.router, me(Some(&forged))?).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "Unauthorized");
    Ok(())
}

#[tokio::test]
async fn expired_access_token_is_unauthorized() -> Result<()> {
    let user = Uuid::new_v4();
    let app = app(&[user])?;
    let stale = codec()?.issue_access_token(user, Utc::now() - TimeDelta::minutes(11))?;

    let (status, _) = send(&app.router, me(Some(&stale))?).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn deleted_user_token_is_unauthorized() -> Result<()> {
    let user = Uuid::new_v4();
    let app = app(&[user])?;
    let pair = app.sessions.issue(user, Utc::now()).await?;

    let (status, _) = send(&app.router, me(Some(&pair.access_token))?).await?;
    assert_eq!(status, StatusCode::OK);

    app.store.remove_user(user).await;

    let (status, _) = send(&app.router, me(Some(&pair.access_token))?).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // refresh tokens go with the user
    let request = exchange(&format!(r#"{{"refreshToken":"{}"}}"#, pair.refresh_token))?;
    let (status, _) = send(&app.router, request).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn refresh_exchange_issues_usable_access_token() -> Result<()> {
    let user = Uuid::new_v4();
    let app = app(&[user])?;
    let pair = app.sessions.issue(user, Utc::now()).await?;
    let body = format!(r#"{{"refreshToken":"{}"}}"#, pair.refresh_token);

    // reusable: no rotation
    for _ in 0..2 {
        let (status, response) = send(&app.router, exchange(&body)?).await?;
        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_str(&response)?;
        let access = json["accessToken"].as_str().unwrap_or_default().to_string();

        let (status, _) = send(&app.router, me(Some(&access))?).await?;
        assert_eq!(status, StatusCode::OK);
    }
    assert_eq!(app.store.refresh_tokens_for(user).await.len(), 1);
    Ok(())
}

#[tokio::test]
async fn unknown_refresh_token_is_not_found() -> Result<()> {
    let app = app(&[])?;
    let body = format!(r#"{{"refreshToken":"{}"}}"#, "ab".repeat(32));
    let (status, response) = send(&app.router, exchange(&body)?).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(response, "refresh token not found");
    Ok(())
}

#[tokio::test]
async fn expired_refresh_token_is_unauthorized() -> Result<()> {
    let user = Uuid::new_v4();
    let app = app(&[user])?;
    let pair = app
        .sessions
        .issue(user, Utc::now() - TimeDelta::days(8))
        .await?;

    let body = format!(r#"{{"refreshToken":"{}"}}"#, pair.refresh_token);
    let (status, response) = send(&app.router, exchange(&body)?).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(response, "token expired");

    // lazily expired: the row stays
    assert_eq!(app.store.refresh_tokens_for(user).await.len(), 1);
    Ok(())
}

#[tokio::test]
async fn malformed_exchange_body_is_bad_request() -> Result<()> {
    let app = app(&[])?;
    let (status, response) = send(&app.router, exchange("{not json")?).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response, "invalid json body");
    Ok(())
}

#[tokio::test]
async fn health_reports_version_and_request_id() -> Result<()> {
    let app = app(&[])?;
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "01J0TESTREQUEST")
        .body(Body::empty())?;
    let response = app.router.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|value| value.to_str().ok()),
        Some("01J0TESTREQUEST")
    );

    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let json: Value = serde_json::from_slice(&bytes)?;
    assert_eq!(json["name"], env!("CARGO_PKG_NAME"));
    assert_eq!(json["database"], "ok");
    Ok(())
}

#[tokio::test]
async fn request_id_is_generated_when_absent() -> Result<()> {
    let app = app(&[])?;
    let request = Request::builder().uri("/health").body(Body::empty())?;
    let response = app.router.clone().oneshot(request).await?;
    let request_id = response
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    assert_eq!(request_id.len(), 26);
    Ok(())
}

#[tokio::test]
async fn openapi_document_is_served() -> Result<()> {
    let app = app(&[])?;
    let request = Request::builder().uri("/openapi.json").body(Body::empty())?;
    let (status, body) = send(&app.router, request).await?;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body)?;
    assert!(json["paths"]["/v1/auth/login"].is_object());
    assert!(json["paths"]["/v1/auth/token"].is_object());
    Ok(())
}
