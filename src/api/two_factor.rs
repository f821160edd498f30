use axum::{Extension, Json, extract::State};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::AuthUser;
use super::types::{TokenResponse, TwoFactorSetupResponse};
use super::validation::{validate_email, validate_two_factor_code};
use super::{ApiError, ApiResponse, AppState};

#[derive(Deserialize)]
pub struct VerifyRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub code: String,
}

#[derive(Deserialize)]
pub struct ConfirmRequest {
    #[serde(default)]
    pub code: String,
}

/// POST /api/setup-2fa
/// Provision a fresh secret. Rejected once the account is enabled; while
/// still pending, repeating setup overwrites the prior secret.
pub async fn setup(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<ApiResponse<TwoFactorSetupResponse>>, ApiError> {
    let setup = state.two_factor_service().setup(auth.id).await?;

    Ok(Json(ApiResponse::success_with_message(
        "Scan the QR code with your authenticator app, then confirm with a code",
        TwoFactorSetupResponse {
            manual_entry_key: setup.secret.clone(),
            secret: setup.secret,
            qr_code: setup.qr_code,
            otpauth_url: setup.otpauth_url,
        },
    )))
}

/// POST /api/verify-2fa
/// Check a code against the stored secret (±2 time steps of drift). Does
/// not change enabled state; for an enabled account a valid code completes
/// the login and returns a session token.
pub async fn verify(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<VerifyRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>, ApiError> {
    validate_email(&payload.email)?;
    validate_two_factor_code(&payload.code)?;

    let verification = state
        .two_factor_service()
        .verify(&payload.email, &payload.code)
        .await?;

    if verification.enabled {
        let token = state
            .tokens()
            .issue(&verification.user)
            .map_err(|e| ApiError::internal(format!("Failed to issue token: {e}")))?;

        return Ok(Json(ApiResponse::success_with_message(
            "Verification successful",
            TokenResponse { token },
        )));
    }

    Ok(Json(ApiResponse {
        success: true,
        message: Some("Verification code is valid".to_string()),
        data: None,
    }))
}

/// POST /api/confirm-2fa
/// Explicit confirm-and-enable transition: one valid code flips the
/// account from pending to enabled.
pub async fn confirm(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<ConfirmRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    validate_two_factor_code(&payload.code)?;

    state
        .two_factor_service()
        .confirm(auth.id, &payload.code)
        .await?;

    Ok(Json(ApiResponse::message(
        "Two-factor authentication enabled",
    )))
}
