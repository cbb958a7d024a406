use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::status::StatusMeta;

/// A validated destination number in canonical international form.
/// Constructed only by the validator (or from already-canonical rows).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Wrap a string that is already known to be canonical. Callers are
    /// the phone validator and the repository row mapping.
    pub(crate) fn new_unchecked(canonical: String) -> Self {
        Self(canonical)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// An outbound message owned by one user.
///
/// `status_meta` is recomputed from `status_code` on every read; it is
/// never written independently.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub id: Uuid,
    pub content: String,
    pub author_id: Uuid,
    pub numbers: Vec<PhoneNumber>,
    pub status_code: i32,
    pub status_meta: StatusMeta,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
