use std::sync::Arc;

use sms_gateway::repository::PgMessageRepository;
use sms_gateway::services::{MessageService, RedisPublisher};
use sms_gateway::state::AppState;
use sms_gateway::websocket::pubsub::start_pubsub_listener;
use sms_gateway::websocket::ConnectionRegistry;
use sms_gateway::{config, db, error, logging, routes};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> Result<(), error::AppError> {
    logging::init_tracing();
    let cfg = Arc::new(config::Config::from_env()?);

    let pool = db::init_pool(&cfg)
        .await
        .map_err(|e| error::AppError::Config(format!("db: {e}")))?;

    // Embedded migrations, idempotent; a schema mismatch is fatal.
    db::MIGRATOR
        .run(&pool)
        .await
        .map_err(|e| error::AppError::Config(format!("migrations: {e}")))?;

    let redis_client = redis::Client::open(cfg.redis_url.as_str())
        .map_err(|e| error::AppError::Config(format!("redis: {e}")))?;

    let registry = ConnectionRegistry::new();
    let repo = Arc::new(PgMessageRepository::new(pool.clone()));
    let publisher = Arc::new(RedisPublisher::new(redis_client.clone()));
    let messages = Arc::new(MessageService::new(repo, publisher));

    let state = AppState {
        db: pool,
        messages,
        registry: registry.clone(),
        config: cfg.clone(),
    };

    // Cross-task fan-out: events published to Redis come back through
    // this listener and reach local WebSocket subscribers.
    tokio::spawn(async move {
        if let Err(e) = start_pubsub_listener(redis_client, registry).await {
            tracing::error!(error = %e, "pubsub listener failed");
        }
    });

    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let bind_addr = format!("0.0.0.0:{}", cfg.port);
    tracing::info!(%bind_addr, "starting sms-gateway");

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| error::AppError::Config(format!("bind {bind_addr}: {e}")))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| error::AppError::Internal(format!("server: {e}")))
}
