use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};

use crate::entities::chat_sessions;

/// Chat session rows exist here only as the cascade target of account
/// deletion; chat content and AI proxying live outside this service.
pub struct ChatSessionRepository {
    conn: DatabaseConnection,
}

impl ChatSessionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, user_id: i32, title: &str) -> Result<i32> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = chat_sessions::ActiveModel {
            user_id: Set(user_id),
            title: Set(title.to_string()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to create chat session")?;

        Ok(model.id)
    }

    pub async fn count_for_user(&self, user_id: i32) -> Result<u64> {
        let count = chat_sessions::Entity::find()
            .filter(chat_sessions::Column::UserId.eq(user_id))
            .count(&self.conn)
            .await
            .context("Failed to count chat sessions")?;

        Ok(count)
    }

    /// Remove every session belonging to the user. Returns rows deleted.
    pub async fn delete_for_user(&self, user_id: i32) -> Result<u64> {
        let result = chat_sessions::Entity::delete_many()
            .filter(chat_sessions::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete chat sessions for user")?;

        Ok(result.rows_affected)
    }
}
