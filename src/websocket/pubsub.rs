//! Redis pub/sub listener: forwards published notification events to the
//! local subscriber registry. Runs on its own task for the lifetime of
//! the process; publishing happens in the service layer.

use axum::extract::ws::Message;
use futures_util::StreamExt;

use crate::services::publisher::TOPIC_PREFIX;
use crate::websocket::ConnectionRegistry;

pub async fn start_pubsub_listener(
    client: redis::Client,
    registry: ConnectionRegistry,
) -> redis::RedisResult<()> {
    // Pub/sub needs a dedicated connection, not the multiplexed one.
    let conn = client.get_async_connection().await?;
    let mut pubsub = conn.into_pubsub();
    pubsub.psubscribe(format!("{TOPIC_PREFIX}*")).await?;

    let mut stream = pubsub.on_message();
    while let Some(msg) = stream.next().await {
        let topic: String = msg.get_channel_name().to_string();
        let payload: String = match msg.get_payload() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, %topic, "dropping undecodable pubsub payload");
                continue;
            }
        };

        registry.broadcast(&topic, Message::Text(payload)).await;
    }

    Ok(())
}
