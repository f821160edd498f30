//! Domain service for profile, preferences, and account deletion.

use thiserror::Error;

use crate::db::User;
use crate::models::{Preferences, PreferencesUpdate};

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("User not found")]
    NotFound,

    #[error("Email is already taken")]
    EmailTaken,

    #[error("Username is already taken")]
    UsernameTaken,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AccountError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub email: String,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[async_trait::async_trait]
pub trait AccountService: Send + Sync {
    /// Looks up the token holder's account.
    async fn get(&self, user_id: i32) -> Result<User, AccountError>;

    /// Updates identity and profile fields.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::EmailTaken`] / [`AccountError::UsernameTaken`]
    /// when the new identity collides with another account.
    async fn update_profile(
        &self,
        user_id: i32,
        update: ProfileUpdate,
    ) -> Result<User, AccountError>;

    /// Returns the stored preference bundle with defaults backfilled for
    /// missing keys.
    async fn preferences(&self, user_id: i32) -> Result<Preferences, AccountError>;

    /// Applies a partial preference update and returns the resulting bundle.
    async fn update_preferences(
        &self,
        user_id: i32,
        update: PreferencesUpdate,
    ) -> Result<Preferences, AccountError>;

    /// Deletes the account, cascading to the user's chat sessions.
    async fn delete(&self, user_id: i32) -> Result<(), AccountError>;
}
