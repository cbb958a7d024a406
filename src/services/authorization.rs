//! Ownership checks for message reads and mutations.

use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::message::Message;

/// A user may read or mutate a message only if they authored it.
pub fn ensure_author(message: &Message, acting_user_id: Uuid) -> AppResult<()> {
    if message.author_id == acting_user_id {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}
