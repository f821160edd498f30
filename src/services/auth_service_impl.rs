//! `SeaORM` implementation of the [`AuthService`] trait.

use async_trait::async_trait;
use chrono::Utc;
use tokio::task;

use crate::auth::{password, reset};
use crate::config::SecurityConfig;
use crate::db::{NewUser, Store, User};
use crate::services::auth_service::{
    AuthError, AuthService, LoginOutcome, NewAccount, ResetRequest,
};

pub struct SeaOrmAuthService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    /// Hash on the blocking pool; Argon2 would stall the async runtime.
    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let password = password.to_string();
        let security = self.security.clone();

        task::spawn_blocking(move || password::hash_password(&password, &security))
            .await
            .map_err(|e| AuthError::Internal(format!("Hashing task panicked: {e}")))?
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    /// Map an insert failure, treating the storage unique index as the
    /// authoritative duplicate-identity signal (the pre-check races).
    fn map_create_error(err: anyhow::Error) -> AuthError {
        if let Some(db_err) = err.downcast_ref::<sea_orm::DbErr>()
            && let Some(sea_orm::SqlErr::UniqueConstraintViolation(message)) = db_err.sql_err()
        {
            if message.contains("email") {
                return AuthError::EmailTaken;
            }
            return AuthError::UsernameTaken;
        }
        AuthError::Database(err.to_string())
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(&self, account: NewAccount) -> Result<User, AuthError> {
        // Advisory pre-checks give precise messages; the unique index below
        // still decides under concurrency.
        if self.store.get_user_by_email(&account.email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }
        if self
            .store
            .get_user_by_username(&account.username)
            .await?
            .is_some()
        {
            return Err(AuthError::UsernameTaken);
        }

        let password_hash = self.hash_password(&account.password).await?;

        let user = self
            .store
            .create_user(NewUser {
                email: account.email,
                username: account.username,
                password_hash,
                first_name: account.first_name,
                last_name: account.last_name,
            })
            .await
            .map_err(Self::map_create_error)?;

        tracing::info!(user_id = user.id, "User registered");
        Ok(user)
    }

    async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let Some((user, password_hash)) = self.store.get_user_by_email_with_hash(email).await?
        else {
            return Err(AuthError::InvalidCredentials);
        };

        let password = password.to_string();
        let is_valid = task::spawn_blocking(move || {
            password::verify_password(&password, &password_hash)
        })
        .await
        .map_err(|e| AuthError::Internal(format!("Verification task panicked: {e}")))?
        .map_err(|e| AuthError::Internal(e.to_string()))?;

        if !is_valid {
            return Err(AuthError::InvalidCredentials);
        }

        let requires_two_factor = user.two_factor_enabled;
        Ok(LoginOutcome {
            user,
            requires_two_factor,
        })
    }

    async fn forgot_password(&self, email: &str) -> Result<Option<ResetRequest>, AuthError> {
        let Some(user) = self.store.get_user_by_email(email).await? else {
            // Unknown email: no write, the handler answers identically
            return Ok(None);
        };

        let token = reset::generate_token();
        let expires_ms = reset::expiry_from_now();

        self.store
            .set_reset_token(user.id, &token, expires_ms)
            .await?;

        tracing::info!(user_id = user.id, "Password reset token issued");
        Ok(Some(ResetRequest { user, token }))
    }

    async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        let password_hash = self.hash_password(new_password).await?;
        let now_ms = Utc::now().timestamp_millis();

        let consumed = self
            .store
            .consume_reset_token(token, now_ms, &password_hash)
            .await?;

        if !consumed {
            return Err(AuthError::InvalidResetToken);
        }

        tracing::info!("Password reset completed");
        Ok(())
    }
}
