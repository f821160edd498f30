pub mod prelude;

pub mod chat_sessions;
pub mod users;
