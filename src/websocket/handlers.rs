use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Extension;
use futures_util::{SinkExt, StreamExt};

use crate::middleware::auth::AuthedUser;
use crate::services::publisher::topic_for_user;
use crate::state::AppState;
use crate::websocket::ConnectionRegistry;

/// Upgrade to a WebSocket subscribed to the caller's own topic. Identity
/// comes from the auth middleware, so a user can only ever subscribe to
/// their own event stream.
pub async fn subscribe(
    State(state): State<AppState>,
    Extension(user): Extension<AuthedUser>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let topic = topic_for_user(user.id, &user.username);
    let registry = state.registry.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, registry, topic))
}

async fn handle_socket(socket: WebSocket, registry: ConnectionRegistry, topic: String) {
    let mut rx = registry.add_subscriber(&topic).await;
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            outbound = rx.recv() => {
                match outbound {
                    Some(msg) => {
                        if sink.send(msg).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            inbound = stream.next() => {
                match inbound {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    // Subscribers only listen; anything else is ignored.
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}
