use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chat_api::config::Config;
use chat_api::db::history::{HistoryStore, MemoryHistoryStore, PgHistoryStore};
use chat_api::AppState;
use ligo_common::{MemoryBus, RedisStreamBus, TopicBus};

#[tokio::main]
async fn main() {
    // Load .env file (silently skip if missing; env vars may be set externally)
    if dotenvy::dotenv().is_err() {
        let env_path = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(env_path);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let port = config.port;

    let store: Arc<dyn HistoryStore> = match &config.database_url {
        Some(url) => Arc::new(PgHistoryStore::new(chat_api::db::pool::connect(url))),
        None => {
            tracing::warn!("DATABASE_URL not set; message history kept in memory");
            Arc::new(MemoryHistoryStore::new())
        }
    };

    let bus: Arc<dyn TopicBus> = match &config.redis_url {
        Some(url) => Arc::new(
            RedisStreamBus::connect(url)
                .await
                .expect("failed to connect to Redis"),
        ),
        None => {
            tracing::warn!("REDIS_URL not set; using in-process topic bus, side-channel workers unreachable");
            Arc::new(MemoryBus::new())
        }
    };

    tracing::info!(
        consumer_group = %config.consumer_group,
        history_room = %config.history_room,
        "chat-api configured"
    );

    let state = AppState::new(config, bus, store);
    state
        .start_consumers()
        .await
        .expect("failed to subscribe to relay topics");

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(chat_api::routes::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "chat-api listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown signal received");
}
