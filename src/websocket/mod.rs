use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::ws::Message;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::RwLock;

pub mod handlers;
pub mod pubsub;

/// Active subscriber connections, keyed by topic. Senders whose receiver
/// side has gone away are dropped on the next broadcast.
#[derive(Default, Clone)]
pub struct ConnectionRegistry {
    inner: Arc<RwLock<HashMap<String, Vec<UnboundedSender<Message>>>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_subscriber(&self, topic: &str) -> UnboundedReceiver<Message> {
        let (tx, rx) = unbounded_channel();
        let mut guard = self.inner.write().await;
        guard.entry(topic.to_string()).or_default().push(tx);
        rx
    }

    pub async fn broadcast(&self, topic: &str, msg: Message) {
        let mut guard = self.inner.write().await;
        if let Some(list) = guard.get_mut(topic) {
            list.retain(|sender| sender.send(msg.clone()).is_ok());
            if list.is_empty() {
                guard.remove(topic);
            }
        }
    }
}
