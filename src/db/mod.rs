use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::user::{NewUser, TwoFactorState, User};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn session_repo(&self) -> repositories::session::ChatSessionRepository {
        repositories::session::ChatSessionRepository::new(self.conn.clone())
    }

    // ========== Users ==========

    pub async fn create_user(&self, new_user: NewUser) -> Result<User> {
        self.user_repo().create(new_user).await
    }

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_user_by_email_with_hash(
        &self,
        email: &str,
    ) -> Result<Option<(User, String)>> {
        self.user_repo().get_by_email_with_hash(email).await
    }

    pub async fn update_user_profile(
        &self,
        id: i32,
        email: &str,
        username: &str,
        first_name: Option<String>,
        last_name: Option<String>,
    ) -> Result<Option<User>> {
        self.user_repo()
            .update_profile(id, email, username, first_name, last_name)
            .await
    }

    pub async fn get_user_with_preferences(
        &self,
        id: i32,
    ) -> Result<Option<(User, Option<String>)>> {
        self.user_repo().get_with_preferences(id).await
    }

    pub async fn set_user_preferences(&self, id: i32, preferences: &str) -> Result<bool> {
        self.user_repo().set_preferences(id, preferences).await
    }

    pub async fn delete_user(&self, id: i32) -> Result<bool> {
        self.user_repo().delete(id).await
    }

    // ========== Reset tokens ==========

    pub async fn set_reset_token(&self, id: i32, token: &str, expires_ms: i64) -> Result<bool> {
        self.user_repo().set_reset_token(id, token, expires_ms).await
    }

    pub async fn consume_reset_token(
        &self,
        token: &str,
        now_ms: i64,
        new_password_hash: &str,
    ) -> Result<bool> {
        self.user_repo()
            .consume_reset_token(token, now_ms, new_password_hash)
            .await
    }

    pub async fn prune_expired_reset_tokens(&self, now_ms: i64) -> Result<u64> {
        self.user_repo().prune_expired_reset_tokens(now_ms).await
    }

    // ========== Two-factor ==========

    pub async fn set_two_factor_secret(&self, id: i32, secret: &str) -> Result<bool> {
        self.user_repo().set_two_factor_secret(id, secret).await
    }

    pub async fn enable_two_factor(&self, id: i32) -> Result<bool> {
        self.user_repo().enable_two_factor(id).await
    }

    pub async fn two_factor_state_by_email(&self, email: &str) -> Result<Option<TwoFactorState>> {
        self.user_repo().two_factor_state_by_email(email).await
    }

    pub async fn two_factor_state_by_id(&self, id: i32) -> Result<Option<TwoFactorState>> {
        self.user_repo().two_factor_state_by_id(id).await
    }

    // ========== Chat sessions ==========

    pub async fn create_chat_session(&self, user_id: i32, title: &str) -> Result<i32> {
        self.session_repo().create(user_id, title).await
    }

    pub async fn count_chat_sessions(&self, user_id: i32) -> Result<u64> {
        self.session_repo().count_for_user(user_id).await
    }

    pub async fn delete_chat_sessions_for_user(&self, user_id: i32) -> Result<u64> {
        self.session_repo().delete_for_user(user_id).await
    }
}
