//! Domain service for the TOTP two-factor lifecycle:
//! disabled -> pending (secret stored) -> enabled.

use thiserror::Error;

use crate::db::User;

#[derive(Debug, Error)]
pub enum TwoFactorError {
    #[error("Two-factor authentication is already enabled")]
    AlreadyEnabled,

    #[error("Two-factor authentication is not set up for this account")]
    NotConfigured,

    #[error("Invalid verification code")]
    InvalidCode,

    #[error("User not found")]
    UserNotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for TwoFactorError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Provisioning material returned from setup.
#[derive(Debug, Clone)]
pub struct TwoFactorSetup {
    /// Base32 secret, also usable for manual entry
    pub secret: String,
    pub otpauth_url: String,
    /// SVG QR image as a base64 data URL
    pub qr_code: String,
}

/// A code that checked out against the stored secret.
#[derive(Debug, Clone)]
pub struct TwoFactorVerification {
    pub user: User,
    /// Whether the account already has two-factor enabled (as opposed to
    /// pending confirmation)
    pub enabled: bool,
}

#[async_trait::async_trait]
pub trait TwoFactorService: Send + Sync {
    /// Generates and stores a fresh secret in the pending state.
    ///
    /// # Errors
    ///
    /// Returns [`TwoFactorError::AlreadyEnabled`] when the account has
    /// completed confirmation; repeating setup while pending succeeds and
    /// overwrites the prior secret.
    async fn setup(&self, user_id: i32) -> Result<TwoFactorSetup, TwoFactorError>;

    /// Checks a submitted code against the stored secret with clock-drift
    /// tolerance. Never mutates the enabled flag.
    async fn verify(&self, email: &str, code: &str)
    -> Result<TwoFactorVerification, TwoFactorError>;

    /// Confirm-and-enable transition: one successful verification flips the
    /// account from pending to enabled.
    async fn confirm(&self, user_id: i32, code: &str) -> Result<(), TwoFactorError>;
}
