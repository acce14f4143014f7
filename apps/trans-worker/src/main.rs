use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ligo_common::{RedisStreamBus, TopicBus};
use trans_worker::backend::{GroqBackend, LanguageBackend};
use trans_worker::config::Config;
use trans_worker::service::Worker;

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

    let backend: Arc<dyn LanguageBackend> =
        Arc::new(GroqBackend::new(&config.backend).expect("failed to build backend client"));
    let bus: Arc<dyn TopicBus> = Arc::new(
        RedisStreamBus::connect(&config.redis_url)
            .await
            .expect("failed to connect to Redis"),
    );

    tracing::info!(
        consumer_group = %config.consumer_group,
        model = %config.backend.model,
        timeout = ?config.backend.timeout,
        "trans-worker configured"
    );

    let worker = Arc::new(Worker::new(bus, backend));
    let handles = worker
        .spawn(&config.consumer_group)
        .await
        .expect("failed to subscribe to request topics");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
    for handle in handles {
        handle.abort();
    }
}
