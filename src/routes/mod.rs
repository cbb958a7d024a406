use axum::routing::{get, post};
use axum::Router;

use crate::middleware::auth::require_auth;
use crate::state::AppState;
use crate::websocket;

pub mod auth;
pub mod messages;
pub mod users;

async fn health() -> &'static str {
    "ok"
}

pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    let authed = Router::new()
        .route(
            "/messages",
            post(messages::create_message).get(messages::get_messages),
        )
        .route("/messages/subscribe", get(websocket::handlers::subscribe))
        .route("/messages/:id", get(messages::get_message))
        .route("/messages/:id/received", post(messages::mark_received))
        .route("/messages/:id/sent", post(messages::mark_sent))
        .route("/user", get(users::current_user))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", public.merge(authed))
        .with_state(state)
}
