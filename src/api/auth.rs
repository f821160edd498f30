use axum::{
    Json,
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use super::types::{LoginResponse, RegisterResponse};
use super::validation::{validate_email, validate_password, validate_username};
use super::{ApiError, ApiResponse, AppState};
use crate::services::NewAccount;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub new_password: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Identity of the verified token holder, inserted into request extensions
/// by [`require_auth`].
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i32,
    pub email: String,
    pub username: String,
}

/// Bearer-token middleware. A missing header, a malformed prefix, and an
/// invalid or expired token all produce the same 401.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers()).ok_or_else(ApiError::unauthorized)?;

    let claims = state
        .tokens()
        .verify(&token)
        .ok_or_else(ApiError::unauthorized)?;

    tracing::Span::current().record("user_id", claims.sub);

    request.extensions_mut().insert(AuthUser {
        id: claims.sub,
        email: claims.email,
        username: claims.username,
    });

    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers.get("Authorization")?.to_str().ok()?;
    let token = auth_header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/register
/// Create an account and return the sanitized user plus a session token.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<RegisterResponse>>, ApiError> {
    validate_email(&payload.email)?;
    validate_username(&payload.username)?;
    validate_password(&payload.password)?;

    let user = state
        .auth_service()
        .register(NewAccount {
            email: payload.email,
            username: payload.username,
            password: payload.password,
            first_name: payload.first_name,
            last_name: payload.last_name,
        })
        .await?;

    // Welcome email must never delay or fail registration
    state.mailer().send_welcome(&user.email, &user.username);

    let token = state
        .tokens()
        .issue(&user)
        .map_err(|e| ApiError::internal(format!("Failed to issue token: {e}")))?;

    Ok(Json(ApiResponse::success_with_message(
        "Registration successful",
        RegisterResponse {
            user: user.into(),
            token,
        },
    )))
}

/// POST /api/login
/// Verify credentials. Accounts with two-factor enabled get
/// `requires2FA: true` and no token; the token is issued by verify-2fa.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    if payload.email.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let outcome = state
        .auth_service()
        .login(&payload.email, &payload.password)
        .await?;

    if outcome.requires_two_factor {
        return Ok(Json(ApiResponse::success_with_message(
            "Two-factor verification code required",
            LoginResponse {
                token: None,
                requires_two_factor: Some(true),
                user: outcome.user.into(),
            },
        )));
    }

    let token = state
        .tokens()
        .issue(&outcome.user)
        .map_err(|e| ApiError::internal(format!("Failed to issue token: {e}")))?;

    Ok(Json(ApiResponse::success_with_message(
        "Login successful",
        LoginResponse {
            token: Some(token),
            requires_two_factor: None,
            user: outcome.user.into(),
        },
    )))
}

/// POST /api/forgot-password
/// Anti-enumeration: the response is identical whether or not the email
/// maps to an account.
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_email(&payload.email)?;

    if let Some(request) = state.auth_service().forgot_password(&payload.email).await? {
        state
            .mailer()
            .send_password_reset(&request.user.email, &request.token);
    }

    Ok(Json(ApiResponse::message(
        "If an account exists for that email, a reset link has been sent",
    )))
}

/// POST /api/reset-password
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.token.is_empty() {
        return Err(ApiError::validation("Reset token is required"));
    }
    validate_password(&payload.new_password)?;

    state
        .auth_service()
        .reset_password(&payload.token, &payload.new_password)
        .await?;

    Ok(Json(ApiResponse::message("Password has been reset")))
}
