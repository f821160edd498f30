use axum::{Extension, Json, extract::State};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::AuthUser;
use super::types::{PreferencesResponse, ProfileResponse};
use super::validation::{validate_email, validate_username};
use super::{ApiError, ApiResponse, AppState};
use crate::models::PreferencesUpdate;
use crate::services::ProfileUpdate;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// GET /api/me
/// Current account as seen by the token holder.
pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<ApiResponse<ProfileResponse>>, ApiError> {
    let user = state.account_service().get(auth.id).await?;

    Ok(Json(ApiResponse::success(ProfileResponse {
        user: user.into(),
    })))
}

/// PUT /api/update-profile
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<ProfileResponse>>, ApiError> {
    validate_email(&payload.email)?;
    validate_username(&payload.username)?;

    let user = state
        .account_service()
        .update_profile(
            auth.id,
            ProfileUpdate {
                email: payload.email,
                username: payload.username,
                first_name: payload.first_name,
                last_name: payload.last_name,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success_with_message(
        "Profile updated",
        ProfileResponse { user: user.into() },
    )))
}

/// GET /api/preferences
/// Stored bundle with defaults backfilled for missing keys.
pub async fn get_preferences(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<ApiResponse<PreferencesResponse>>, ApiError> {
    let preferences = state.account_service().preferences(auth.id).await?;

    Ok(Json(ApiResponse::success(PreferencesResponse {
        preferences,
    })))
}

/// PUT /api/preferences
/// Partial update; absent fields keep their stored value.
pub async fn update_preferences(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<PreferencesUpdate>,
) -> Result<Json<ApiResponse<PreferencesResponse>>, ApiError> {
    let preferences = state
        .account_service()
        .update_preferences(auth.id, payload)
        .await?;

    Ok(Json(ApiResponse::success_with_message(
        "Preferences updated",
        PreferencesResponse { preferences },
    )))
}

/// DELETE /api/delete-account
/// Destroys the user record and cascades to the user's chat sessions.
/// Outstanding session tokens keep verifying until natural expiry.
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.account_service().delete(auth.id).await?;

    Ok(Json(ApiResponse::message("Account deleted")))
}
