use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::services::MessageService;
use crate::websocket::ConnectionRegistry;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub messages: Arc<MessageService>,
    pub registry: ConnectionRegistry,
    pub config: Arc<Config>,
}
