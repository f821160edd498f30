use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub email: String,

    #[sea_orm(unique)]
    pub username: String,

    /// Argon2id password hash
    pub password_hash: String,

    pub first_name: Option<String>,

    pub last_name: Option<String>,

    /// Preference bundle serialized as JSON; missing keys are backfilled
    /// with defaults on read.
    pub preferences: Option<String>,

    pub two_factor_enabled: bool,

    /// Base32-encoded TOTP secret. Present while pending or enabled.
    pub two_factor_secret: Option<String>,

    pub two_factor_enabled_at: Option<String>,

    /// Current password-reset token. A new request overwrites the prior one.
    pub reset_token: Option<String>,

    /// Reset token expiry as epoch milliseconds.
    pub reset_token_expires: Option<i64>,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
