use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use std::sync::Arc;
use tower::ServiceExt;

use aisync::Config;
use aisync::api::AppState;
use aisync::entities::users;

async fn test_state() -> Arc<AppState> {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    aisync::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state")
}

fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn register_user(app: &Router, email: &str, username: &str) -> String {
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/register",
            &serde_json::json!({
                "email": email,
                "username": username,
                "password": "Abcdef1",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    body["token"].as_str().expect("token in envelope").to_string()
}

async fn find_user(state: &AppState, email: &str) -> users::Model {
    users::Entity::find()
        .filter(users::Column::Email.eq(email))
        .one(&state.store().conn)
        .await
        .unwrap()
        .expect("user row")
}

async fn login_status(app: &Router, email: &str, password: &str) -> StatusCode {
    app.clone()
        .oneshot(post_json(
            "/api/login",
            &serde_json::json!({"email": email, "password": password}),
        ))
        .await
        .unwrap()
        .status()
}

// ============================================================================
// Password reset
// ============================================================================

#[tokio::test]
async fn test_forgot_password_is_enumeration_safe() {
    let state = test_state().await;
    let app = aisync::api::router(state.clone()).await;
    register_user(&app, "a@b.com", "abc").await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/forgot-password",
            &serde_json::json!({"email": "nobody@b.com"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let unknown = body_json(response).await;

    // The unknown-email request wrote nothing
    let before = find_user(&state, "a@b.com").await;
    assert!(before.reset_token.is_none());
    assert!(before.reset_token_expires.is_none());

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/forgot-password",
            &serde_json::json!({"email": "a@b.com"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let known = body_json(response).await;

    // Identical envelope whether or not the account exists
    assert_eq!(known, unknown);

    // The real account got a token with an expiry about an hour out
    let user = find_user(&state, "a@b.com").await;
    assert!(user.reset_token.is_some());
    let expires = user.reset_token_expires.expect("expiry set");
    let delta = expires - chrono::Utc::now().timestamp_millis();
    assert!(delta > 3_500_000 && delta <= 3_600_000);
}

#[tokio::test]
async fn test_forgot_password_overwrites_prior_token() {
    let state = test_state().await;
    let app = aisync::api::router(state.clone()).await;
    register_user(&app, "a@b.com", "abc").await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/forgot-password",
            &serde_json::json!({"email": "a@b.com"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let first = find_user(&state, "a@b.com").await.reset_token.unwrap();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/forgot-password",
            &serde_json::json!({"email": "a@b.com"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let second = find_user(&state, "a@b.com").await.reset_token.unwrap();
    assert_ne!(first, second);
}

#[tokio::test]
async fn test_reset_password_consumes_token() {
    let state = test_state().await;
    let app = aisync::api::router(state.clone()).await;
    register_user(&app, "a@b.com", "abc").await;

    app.clone()
        .oneshot(post_json(
            "/api/forgot-password",
            &serde_json::json!({"email": "a@b.com"}),
        ))
        .await
        .unwrap();

    let token = find_user(&state, "a@b.com").await.reset_token.unwrap();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/reset-password",
            &serde_json::json!({"token": token, "newPassword": "Newpass1"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Credential swapped and token cleared in the same update
    assert_eq!(login_status(&app, "a@b.com", "Newpass1").await, StatusCode::OK);
    assert_eq!(
        login_status(&app, "a@b.com", "Abcdef1").await,
        StatusCode::UNAUTHORIZED
    );

    let user = find_user(&state, "a@b.com").await;
    assert!(user.reset_token.is_none());
    assert!(user.reset_token_expires.is_none());

    // A consumed token is never accepted twice
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/reset-password",
            &serde_json::json!({"token": token, "newPassword": "Other1a"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reset_password_rejects_expired_token() {
    let state = test_state().await;
    let app = aisync::api::router(state.clone()).await;
    register_user(&app, "a@b.com", "abc").await;

    let user = find_user(&state, "a@b.com").await;
    let mut active: users::ActiveModel = user.into();
    active.reset_token = Set(Some("expired-token".to_string()));
    active.reset_token_expires = Set(Some(chrono::Utc::now().timestamp_millis() - 10_000));
    active.update(&state.store().conn).await.unwrap();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/reset-password",
            &serde_json::json!({"token": "expired-token", "newPassword": "Newpass1"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Invalid or expired reset token");

    // Credential unchanged
    assert_eq!(login_status(&app, "a@b.com", "Abcdef1").await, StatusCode::OK);
}

#[tokio::test]
async fn test_reset_password_rejects_unknown_token() {
    let app = aisync::api::router(test_state().await).await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/reset-password",
            &serde_json::json!({"token": "never-issued", "newPassword": "Newpass1"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Invalid or expired reset token");
}

// ============================================================================
// Two-factor
// ============================================================================

async fn setup_two_factor(app: &Router, token: &str) -> serde_json::Value {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/setup-2fa")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

fn current_code(secret: &str) -> String {
    aisync::auth::totp::code_at(secret, chrono::Utc::now().timestamp()).expect("valid secret")
}

#[tokio::test]
async fn test_two_factor_full_lifecycle() {
    let state = test_state().await;
    let app = aisync::api::router(state.clone()).await;
    let token = register_user(&app, "a@b.com", "abc").await;

    let setup = setup_two_factor(&app, &token).await;
    let secret = setup["secret"].as_str().unwrap().to_string();
    assert_eq!(setup["manualEntryKey"], setup["secret"]);
    assert!(
        setup["qrCode"]
            .as_str()
            .unwrap()
            .starts_with("data:image/svg+xml;base64,")
    );
    assert!(
        setup["otpauthUrl"]
            .as_str()
            .unwrap()
            .starts_with("otpauth://totp/")
    );

    // Secret stored but still pending
    let user = find_user(&state, "a@b.com").await;
    assert!(!user.two_factor_enabled);
    assert_eq!(user.two_factor_secret.as_deref(), Some(secret.as_str()));

    // Confirm with one valid code flips the account to enabled
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/confirm-2fa")
                .header("Authorization", format!("Bearer {token}"))
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({"code": current_code(&secret)}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let user = find_user(&state, "a@b.com").await;
    assert!(user.two_factor_enabled);
    assert!(user.two_factor_enabled_at.is_some());

    // Login now withholds the token and flags the second factor
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/login",
            &serde_json::json!({"email": "a@b.com", "password": "Abcdef1"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["requires2FA"], true);
    assert!(body.get("token").is_none());

    // verify-2fa completes the login for an enabled account
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/verify-2fa",
            &serde_json::json!({"email": "a@b.com", "code": current_code(&secret)}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["token"].is_string());

    // Re-setup is rejected once enabled
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/setup-2fa")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_repeated_setup_rotates_pending_secret() {
    let state = test_state().await;
    let app = aisync::api::router(state.clone()).await;
    let token = register_user(&app, "a@b.com", "abc").await;

    let first = setup_two_factor(&app, &token).await;
    let second = setup_two_factor(&app, &token).await;

    let first_secret = first["secret"].as_str().unwrap();
    let second_secret = second["secret"].as_str().unwrap();
    assert_ne!(first_secret, second_secret);

    // Only the latest secret is stored; codes from the first no longer pass
    let user = find_user(&state, "a@b.com").await;
    assert_eq!(user.two_factor_secret.as_deref(), Some(second_secret));

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/verify-2fa",
            &serde_json::json!({"email": "a@b.com", "code": current_code(second_secret)}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_verify_2fa_rejects_wrong_code() {
    let app = aisync::api::router(test_state().await).await;
    let token = register_user(&app, "a@b.com", "abc").await;
    let setup = setup_two_factor(&app, &token).await;
    let secret = setup["secret"].as_str().unwrap();

    // A code three steps in the past is outside the drift window. Skip the
    // assertion on the off chance it collides with a code still inside it.
    let now = chrono::Utc::now().timestamp();
    let stale = aisync::auth::totp::code_at(secret, now - 90).unwrap();
    let window: Vec<String> = (-2..=3)
        .map(|step| aisync::auth::totp::code_at(secret, now + step * 30).unwrap())
        .collect();
    if !window.contains(&stale) {
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/verify-2fa",
                &serde_json::json!({"email": "a@b.com", "code": stale}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let garbage = if window.contains(&"000000".to_string()) {
        "000001"
    } else {
        "000000"
    };
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/verify-2fa",
            &serde_json::json!({"email": "a@b.com", "code": garbage}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_verify_2fa_requires_setup() {
    let app = aisync::api::router(test_state().await).await;
    register_user(&app, "a@b.com", "abc").await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/verify-2fa",
            &serde_json::json!({"email": "a@b.com", "code": "123456"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(
        body["message"],
        "Two-factor authentication is not set up for this account"
    );
}
