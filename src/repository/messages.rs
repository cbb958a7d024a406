//! Message persistence.
//!
//! All writes for a given message id go through a transaction; a failed
//! number insert rolls back the whole create, and every status update is
//! followed by a re-read so callers always observe a committed snapshot.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::message::{Message, PhoneNumber};
use crate::status::{self, MessageStatus};

/// Hard cap on list results; full pagination is a non-goal.
const LIST_LIMIT: i64 = 5000;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Insert a message and all its destination numbers in one
    /// transaction, with status CREATED. Returns the committed row.
    async fn create(
        &self,
        author_id: Uuid,
        content: &str,
        numbers: &[PhoneNumber],
    ) -> AppResult<Message>;

    async fn get_by_id(&self, id: Uuid) -> AppResult<Message>;

    /// Transactionally set `status_code` and refresh `updated_at`, then
    /// re-read and return the full message.
    async fn update_status_code(&self, id: Uuid, status: MessageStatus) -> AppResult<Message>;

    /// Messages authored by `user_id` whose status has reached at least
    /// RECEIVED, or at least SENT when `include_sent` is set. Ordered by
    /// most recent activity first.
    async fn list_for_user(&self, user_id: Uuid, include_sent: bool) -> AppResult<Vec<Message>>;
}

/// Minimum status code a message must have reached to show up in a list.
fn list_status_floor(include_sent: bool) -> i32 {
    if include_sent {
        MessageStatus::Sent.code()
    } else {
        MessageStatus::Received.code()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: Uuid,
    content: String,
    author_id: Uuid,
    status_code: i32,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
    numbers: Vec<String>,
}

impl MessageRow {
    fn into_message(self) -> AppResult<Message> {
        // status_meta is always recomputed from the committed code
        let status_meta = status::meta_for_code(self.status_code)?;
        Ok(Message {
            id: self.id,
            content: self.content,
            author_id: self.author_id,
            numbers: self
                .numbers
                .into_iter()
                .map(PhoneNumber::new_unchecked)
                .collect(),
            status_code: self.status_code,
            status_meta,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_MESSAGE: &str = r#"
    SELECT m.id,
           m.content,
           m.author_id,
           m.status_code,
           m.created_at,
           m.updated_at,
           COALESCE(
               array_agg(n.number ORDER BY n.position)
                   FILTER (WHERE n.number IS NOT NULL),
               '{}'
           ) AS numbers
    FROM messages m
    LEFT JOIN message_numbers n ON n.message_id = m.id
"#;

#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn create(
        &self,
        author_id: Uuid,
        content: &str,
        numbers: &[PhoneNumber],
    ) -> AppResult<Message> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO messages (id, author_id, content, status_code, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(id)
        .bind(author_id)
        .bind(content)
        .bind(MessageStatus::Created.code())
        .bind(now)
        .bind(now)
        .execute(tx.as_mut())
        .await?;

        // position preserves the caller's insertion order
        for (position, number) in numbers.iter().enumerate() {
            sqlx::query(
                "INSERT INTO message_numbers (message_id, number, position) VALUES ($1, $2, $3)",
            )
            .bind(id)
            .bind(number.as_str())
            .bind(position as i32)
            .execute(tx.as_mut())
            .await?;
        }

        tx.commit().await?;

        self.get_by_id(id).await
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Message> {
        let sql = format!("{SELECT_MESSAGE} WHERE m.id = $1 GROUP BY m.id");
        let row = sqlx::query_as::<_, MessageRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound)?;

        row.into_message()
    }

    async fn update_status_code(&self, id: Uuid, status: MessageStatus) -> AppResult<Message> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE messages SET status_code = $1, updated_at = $2 WHERE id = $3",
        )
        .bind(status.code())
        .bind(Utc::now())
        .bind(id)
        .execute(tx.as_mut())
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }

        tx.commit().await?;

        // Re-read so the caller observes the committed snapshot, numbers
        // and recomputed meta included.
        self.get_by_id(id).await
    }

    async fn list_for_user(&self, user_id: Uuid, include_sent: bool) -> AppResult<Vec<Message>> {
        let sql = format!(
            "{SELECT_MESSAGE} \
             WHERE m.author_id = $1 AND m.status_code >= $2 \
             GROUP BY m.id \
             ORDER BY m.updated_at DESC \
             LIMIT $3"
        );

        let rows = sqlx::query_as::<_, MessageRow>(&sql)
            .bind(user_id)
            .bind(list_status_floor(include_sent))
            .bind(LIST_LIMIT)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(MessageRow::into_message).collect()
    }
}
