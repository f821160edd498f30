//! `SeaORM` implementation of the [`TwoFactorService`] trait.

use async_trait::async_trait;
use chrono::Utc;

use crate::db::Store;
use crate::services::two_factor_service::{
    TwoFactorError, TwoFactorService, TwoFactorSetup, TwoFactorVerification,
};

pub struct SeaOrmTwoFactorService {
    store: Store,
    /// Issuer label shown in authenticator apps
    app_name: String,
}

impl SeaOrmTwoFactorService {
    #[must_use]
    pub const fn new(store: Store, app_name: String) -> Self {
        Self { store, app_name }
    }
}

#[async_trait]
impl TwoFactorService for SeaOrmTwoFactorService {
    async fn setup(&self, user_id: i32) -> Result<TwoFactorSetup, TwoFactorError> {
        let state = self
            .store
            .two_factor_state_by_id(user_id)
            .await?
            .ok_or(TwoFactorError::UserNotFound)?;

        if state.enabled {
            return Err(TwoFactorError::AlreadyEnabled);
        }

        let secret = crate::auth::totp::generate_secret();
        let otpauth_url =
            crate::auth::totp::provisioning_uri(&secret, &state.user.email, &self.app_name);
        let qr_code = crate::auth::totp::qr_data_url(&otpauth_url)
            .map_err(|e| TwoFactorError::Internal(e.to_string()))?;

        self.store.set_two_factor_secret(user_id, &secret).await?;

        tracing::info!(user_id, "Two-factor secret provisioned");
        Ok(TwoFactorSetup {
            secret,
            otpauth_url,
            qr_code,
        })
    }

    async fn verify(
        &self,
        email: &str,
        code: &str,
    ) -> Result<TwoFactorVerification, TwoFactorError> {
        let state = self
            .store
            .two_factor_state_by_email(email)
            .await?
            .ok_or(TwoFactorError::UserNotFound)?;

        let secret = state.secret.ok_or(TwoFactorError::NotConfigured)?;

        if !crate::auth::totp::verify_code(&secret, code, Utc::now().timestamp()) {
            return Err(TwoFactorError::InvalidCode);
        }

        Ok(TwoFactorVerification {
            user: state.user,
            enabled: state.enabled,
        })
    }

    async fn confirm(&self, user_id: i32, code: &str) -> Result<(), TwoFactorError> {
        let state = self
            .store
            .two_factor_state_by_id(user_id)
            .await?
            .ok_or(TwoFactorError::UserNotFound)?;

        if state.enabled {
            return Err(TwoFactorError::AlreadyEnabled);
        }

        let secret = state.secret.ok_or(TwoFactorError::NotConfigured)?;

        if !crate::auth::totp::verify_code(&secret, code, Utc::now().timestamp()) {
            return Err(TwoFactorError::InvalidCode);
        }

        self.store.enable_two_factor(user_id).await?;

        tracing::info!(user_id, "Two-factor authentication enabled");
        Ok(())
    }
}
