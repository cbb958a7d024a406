//! Best-effort notification fan-out over Redis pub/sub.
//!
//! Publishing is fire-and-forget relative to the write path: the caller
//! schedules the publish on a detached task and never awaits delivery.
//! Failures are logged and swallowed; they must never fail or roll back
//! the triggering write.

use redis::AsyncCommands;
use uuid::Uuid;

use crate::models::message::Message;

/// Channel prefix shared by the publisher and the subscription listener.
pub const TOPIC_PREFIX: &str = "messages:";

/// Routing key scoping delivery to one user's subscribers.
pub fn topic_for_user(user_id: Uuid, username: &str) -> String {
    format!("{TOPIC_PREFIX}/uid-{user_id}/uname-{username}")
}

#[cfg_attr(test, mockall::automock)]
pub trait NotificationPublisher: Send + Sync {
    /// Schedule a message-changed event on the author's topic.
    fn publish_message_changed(&self, author_id: Uuid, author_username: &str, message: &Message);
}

pub struct RedisPublisher {
    client: redis::Client,
}

impl RedisPublisher {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }
}

impl NotificationPublisher for RedisPublisher {
    fn publish_message_changed(&self, author_id: Uuid, author_username: &str, message: &Message) {
        let topic = topic_for_user(author_id, author_username);

        let payload = match serde_json::to_string(&serde_json::json!({
            "type": "message_changed",
            "message": message,
        })) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, %topic, "failed to serialize notification");
                return;
            }
        };

        let client = self.client.clone();
        tokio::spawn(async move {
            let mut conn = match client.get_multiplexed_async_connection().await {
                Ok(conn) => conn,
                Err(e) => {
                    tracing::warn!(error = %e, %topic, "notification publish skipped: no redis connection");
                    return;
                }
            };

            if let Err(e) = conn.publish::<_, _, ()>(&topic, &payload).await {
                tracing::warn!(error = %e, %topic, "notification publish failed");
            }
        });
    }
}
