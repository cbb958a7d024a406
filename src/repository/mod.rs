pub mod messages;
pub mod users;

pub use messages::{MessageRepository, PgMessageRepository};
