use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};

use crate::entities::users;

/// User data returned from the repository (without the password hash).
#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub two_factor_enabled: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            username: model.username,
            first_name: model.first_name,
            last_name: model.last_name,
            two_factor_enabled: model.two_factor_enabled,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Fields required to insert a user row.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Two-factor fields alongside the sanitized user.
#[derive(Debug, Clone)]
pub struct TwoFactorState {
    pub user: User,
    pub secret: Option<String>,
    pub enabled: bool,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert a new user row.
    ///
    /// A duplicate email or username surfaces as the storage layer's unique
    /// constraint violation; callers map that to a conflict response.
    pub async fn create(&self, new_user: NewUser) -> Result<User> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = users::ActiveModel {
            email: Set(new_user.email),
            username: Set(new_user.username),
            password_hash: Set(new_user.password_hash),
            first_name: Set(new_user.first_name),
            last_name: Set(new_user.last_name),
            preferences: Set(None),
            two_factor_enabled: Set(false),
            two_factor_secret: Set(None),
            two_factor_enabled_at: Set(None),
            reset_token: Set(None),
            reset_token_expires: Set(None),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active.insert(&self.conn).await?;
        Ok(User::from(model))
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        Ok(user.map(User::from))
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")?;

        Ok(user.map(User::from))
    }

    /// Get user by email together with the stored password hash (for login).
    pub async fn get_by_email_with_hash(&self, email: &str) -> Result<Option<(User, String)>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user for credential check")?;

        Ok(user.map(|u| {
            let password_hash = u.password_hash.clone();
            (User::from(u), password_hash)
        }))
    }

    /// Update identity/profile fields. Returns `None` when the user is gone.
    pub async fn update_profile(
        &self,
        id: i32,
        email: &str,
        username: &str,
        first_name: Option<String>,
        last_name: Option<String>,
    ) -> Result<Option<User>> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for profile update")?;

        let Some(user) = user else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = user.into();
        active.email = Set(email.to_string());
        active.username = Set(username.to_string());
        active.first_name = Set(first_name);
        active.last_name = Set(last_name);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let model = active.update(&self.conn).await?;
        Ok(Some(User::from(model)))
    }

    /// Get user together with the raw stored preference document.
    pub async fn get_with_preferences(&self, id: i32) -> Result<Option<(User, Option<String>)>> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user preferences")?;

        Ok(user.map(|u| {
            let preferences = u.preferences.clone();
            (User::from(u), preferences)
        }))
    }

    /// Replace the stored preference document. Returns false when the user
    /// is gone.
    pub async fn set_preferences(&self, id: i32, preferences: &str) -> Result<bool> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for preference update")?;

        let Some(user) = user else {
            return Ok(false);
        };

        let mut active: users::ActiveModel = user.into();
        active.preferences = Set(Some(preferences.to_string()));
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(true)
    }

    /// Store a reset token and its expiry, overwriting any prior token.
    pub async fn set_reset_token(&self, id: i32, token: &str, expires_ms: i64) -> Result<bool> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for reset token")?;

        let Some(user) = user else {
            return Ok(false);
        };

        let mut active: users::ActiveModel = user.into();
        active.reset_token = Set(Some(token.to_string()));
        active.reset_token_expires = Set(Some(expires_ms));
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(true)
    }

    /// Consume a reset token: the row must match the token value and its
    /// expiry must be strictly in the future. The credential update and the
    /// token clear happen in a single row update. Returns false when no row
    /// qualifies (unknown or expired token).
    pub async fn consume_reset_token(
        &self,
        token: &str,
        now_ms: i64,
        new_password_hash: &str,
    ) -> Result<bool> {
        let user = users::Entity::find()
            .filter(users::Column::ResetToken.eq(token))
            .filter(users::Column::ResetTokenExpires.gt(now_ms))
            .one(&self.conn)
            .await
            .context("Failed to query user by reset token")?;

        let Some(user) = user else {
            return Ok(false);
        };

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(new_password_hash.to_string());
        active.reset_token = Set(None);
        active.reset_token_expires = Set(None);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(true)
    }

    /// Clear reset tokens whose expiry has passed. Returns the number of
    /// rows touched.
    pub async fn prune_expired_reset_tokens(&self, now_ms: i64) -> Result<u64> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::ResetToken, sea_orm::sea_query::Expr::value(Option::<String>::None))
            .col_expr(
                users::Column::ResetTokenExpires,
                sea_orm::sea_query::Expr::value(Option::<i64>::None),
            )
            .filter(users::Column::ResetToken.is_not_null())
            .filter(users::Column::ResetTokenExpires.lte(now_ms))
            .exec(&self.conn)
            .await
            .context("Failed to prune expired reset tokens")?;

        Ok(result.rows_affected)
    }

    /// Store a fresh TOTP secret with enabled forced off (pending state).
    pub async fn set_two_factor_secret(&self, id: i32, secret: &str) -> Result<bool> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for two-factor setup")?;

        let Some(user) = user else {
            return Ok(false);
        };

        let mut active: users::ActiveModel = user.into();
        active.two_factor_secret = Set(Some(secret.to_string()));
        active.two_factor_enabled = Set(false);
        active.two_factor_enabled_at = Set(None);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(true)
    }

    /// Flip the enabled flag after a confirmed verification.
    pub async fn enable_two_factor(&self, id: i32) -> Result<bool> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for two-factor enable")?;

        let Some(user) = user else {
            return Ok(false);
        };

        let now = chrono::Utc::now().to_rfc3339();
        let mut active: users::ActiveModel = user.into();
        active.two_factor_enabled = Set(true);
        active.two_factor_enabled_at = Set(Some(now.clone()));
        active.updated_at = Set(now);
        active.update(&self.conn).await?;

        Ok(true)
    }

    pub async fn two_factor_state_by_email(&self, email: &str) -> Result<Option<TwoFactorState>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query two-factor state")?;

        Ok(user.map(Self::two_factor_state))
    }

    pub async fn two_factor_state_by_id(&self, id: i32) -> Result<Option<TwoFactorState>> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query two-factor state")?;

        Ok(user.map(Self::two_factor_state))
    }

    fn two_factor_state(model: users::Model) -> TwoFactorState {
        let secret = model.two_factor_secret.clone();
        let enabled = model.two_factor_enabled;
        TwoFactorState {
            user: User::from(model),
            secret,
            enabled,
        }
    }

    /// Delete the user row. Returns false when no row existed.
    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = users::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete user")?;

        Ok(result.rows_affected > 0)
    }
}
