//! Topic substrate used between the chat relay and side-channel workers.
//!
//! Publishing is fire-and-forget: it returns once the substrate has accepted
//! the payload. Subscribing joins a consumer group; every group receives each
//! payload once, and consumers sharing a group split the payloads between them.

pub mod memory;
pub mod redis_stream;

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::event::ChatEvent;

pub use self::memory::MemoryBus;
pub use self::redis_stream::RedisStreamBus;

/// Raw payloads delivered to a subscriber, in publish order per topic.
pub type PayloadStream = BoxStream<'static, String>;

#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Abstraction over a durable topic substrate.
///
/// Backed by Redis Streams in production and an in-process queue in tests.
#[async_trait]
pub trait TopicBus: Send + Sync {
    async fn publish(&self, topic: &str, payload: String) -> Result<(), BusError>;

    /// Join `group` on `topic`. The group exists once this returns, so no
    /// payload published afterwards is missed.
    async fn subscribe(&self, topic: &str, group: &str) -> Result<PayloadStream, BusError>;
}

/// Serialize `event` and publish it to `topic`.
pub async fn publish_event(
    bus: &dyn TopicBus,
    topic: &str,
    event: &ChatEvent,
) -> Result<(), BusError> {
    let payload = serde_json::to_string(event)?;
    bus.publish(topic, payload).await
}
