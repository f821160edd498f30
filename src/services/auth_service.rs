//! Domain service for registration, login, and the reset-token lifecycle.

use thiserror::Error;

use crate::db::User;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email is already registered")]
    EmailTaken,

    #[error("Username is already taken")]
    UsernameTaken,

    #[error("Invalid or expired reset token")]
    InvalidResetToken,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Registration input; the password arrives plain and is hashed inside the
/// service.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub username: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Successful credential check. When the account has two-factor enabled the
/// caller must complete a TOTP verification before issuing a session token.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub requires_two_factor: bool,
}

/// A reset token issued for an existing account.
#[derive(Debug, Clone)]
pub struct ResetRequest {
    pub user: User,
    pub token: String,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates an account and returns the sanitized user.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::EmailTaken`] / [`AuthError::UsernameTaken`] on
    /// duplicate identity; the storage unique index is the authoritative
    /// source for that decision.
    async fn register(&self, account: NewAccount) -> Result<User, AuthError>;

    /// Verifies credentials.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for an unknown email or a
    /// wrong password, without distinguishing the two.
    async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError>;

    /// Issues a reset token for the account, overwriting any prior token.
    ///
    /// Returns `Ok(None)` for an unknown email: no write happens and the
    /// handler responds with the same success envelope either way.
    async fn forgot_password(&self, email: &str) -> Result<Option<ResetRequest>, AuthError>;

    /// Consumes a reset token and updates the credential in the same row
    /// update.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidResetToken`] when no user matches the
    /// token with an expiry still in the future.
    async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError>;
}
