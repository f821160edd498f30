pub use super::chat_sessions::Entity as ChatSessions;
pub use super::users::Entity as Users;
