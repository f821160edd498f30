//! `SeaORM` implementation of the [`AccountService`] trait.

use async_trait::async_trait;

use crate::db::Store;
use crate::models::{Preferences, PreferencesUpdate};
use crate::services::account_service::{AccountError, AccountService, ProfileUpdate};

pub struct SeaOrmAccountService {
    store: Store,
}

impl SeaOrmAccountService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AccountService for SeaOrmAccountService {
    async fn get(&self, user_id: i32) -> Result<crate::db::User, AccountError> {
        self.store
            .get_user_by_id(user_id)
            .await?
            .ok_or(AccountError::NotFound)
    }

    async fn update_profile(
        &self,
        user_id: i32,
        update: ProfileUpdate,
    ) -> Result<crate::db::User, AccountError> {
        // Uniqueness checks must not trip over the caller's own record
        if let Some(other) = self.store.get_user_by_email(&update.email).await?
            && other.id != user_id
        {
            return Err(AccountError::EmailTaken);
        }
        if let Some(other) = self.store.get_user_by_username(&update.username).await?
            && other.id != user_id
        {
            return Err(AccountError::UsernameTaken);
        }

        let user = self
            .store
            .update_user_profile(
                user_id,
                &update.email,
                &update.username,
                update.first_name,
                update.last_name,
            )
            .await?
            .ok_or(AccountError::NotFound)?;

        tracing::info!(user_id, "Profile updated");
        Ok(user)
    }

    async fn preferences(&self, user_id: i32) -> Result<Preferences, AccountError> {
        let (_, stored) = self
            .store
            .get_user_with_preferences(user_id)
            .await?
            .ok_or(AccountError::NotFound)?;

        Ok(Preferences::from_stored(stored.as_deref()))
    }

    async fn update_preferences(
        &self,
        user_id: i32,
        update: PreferencesUpdate,
    ) -> Result<Preferences, AccountError> {
        let (_, stored) = self
            .store
            .get_user_with_preferences(user_id)
            .await?
            .ok_or(AccountError::NotFound)?;

        let mut preferences = Preferences::from_stored(stored.as_deref());
        preferences.apply(update);

        let serialized = preferences
            .to_stored()
            .map_err(|e| AccountError::Internal(e.to_string()))?;

        if !self.store.set_user_preferences(user_id, &serialized).await? {
            return Err(AccountError::NotFound);
        }

        Ok(preferences)
    }

    async fn delete(&self, user_id: i32) -> Result<(), AccountError> {
        let sessions = self.store.delete_chat_sessions_for_user(user_id).await?;

        if !self.store.delete_user(user_id).await? {
            return Err(AccountError::NotFound);
        }

        tracing::info!(user_id, sessions, "Account deleted");
        Ok(())
    }
}
