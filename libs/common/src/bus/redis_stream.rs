//! Redis Streams-backed topic bus.
//!
//! Each topic is a stream key. Consumer groups map onto Redis consumer groups
//! (`XGROUP CREATE … $ MKSTREAM`), read with `XREADGROUP … BLOCK`. Entries are
//! acknowledged as soon as they are read, so delivery is at-most-once.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream;
use redis::aio::{ConnectionManager, MultiplexedConnection};
use redis::streams::{StreamMaxlen, StreamReadOptions, StreamReadReply};
use redis::AsyncCommands;

use super::{BusError, PayloadStream, TopicBus};
use crate::id::{prefix, prefixed_ulid};

/// Field holding the serialized event inside a stream entry.
const PAYLOAD_FIELD: &str = "payload";

/// Approximate cap on entries kept per topic stream.
const MAX_STREAM_LEN: usize = 50_000;

/// How long one `XREADGROUP` blocks before looping.
const BLOCK_MS: usize = 5_000;

const READ_BATCH: usize = 100;

/// Back-off after a failed read before retrying.
const RETRY_DELAY: Duration = Duration::from_secs(1);

pub struct RedisStreamBus {
    client: redis::Client,
    publisher: ConnectionManager,
    consumer: String,
}

impl RedisStreamBus {
    pub async fn connect(url: &str) -> Result<Self, BusError> {
        let client = redis::Client::open(url)?;
        let publisher = ConnectionManager::new(client.clone()).await?;
        let consumer = prefixed_ulid(prefix::CONSUMER);
        tracing::info!(%consumer, "connected to redis topic bus");
        Ok(Self {
            client,
            publisher,
            consumer,
        })
    }
}

#[async_trait]
impl TopicBus for RedisStreamBus {
    async fn publish(&self, topic: &str, payload: String) -> Result<(), BusError> {
        let mut conn = self.publisher.clone();
        let _entry_id: String = conn
            .xadd_maxlen(
                topic,
                StreamMaxlen::Approx(MAX_STREAM_LEN),
                "*",
                &[(PAYLOAD_FIELD, payload.as_str())],
            )
            .await?;
        Ok(())
    }

    async fn subscribe(&self, topic: &str, group: &str) -> Result<PayloadStream, BusError> {
        // Blocking reads get their own connection so they never stall publishes.
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let created: redis::RedisResult<()> = conn.xgroup_create_mkstream(topic, group, "$").await;
        match created {
            Ok(()) => tracing::info!(%topic, %group, "created consumer group"),
            Err(e) if e.code() == Some("BUSYGROUP") => {}
            Err(e) => return Err(e.into()),
        }

        let reader = StreamReader {
            conn,
            topic: topic.to_string(),
            options: StreamReadOptions::default()
                .group(group, &self.consumer)
                .block(BLOCK_MS)
                .count(READ_BATCH),
            group: group.to_string(),
            pending: VecDeque::new(),
        };

        let payloads = stream::unfold(reader, |mut reader| async move {
            loop {
                if let Some(payload) = reader.pending.pop_front() {
                    return Some((payload, reader));
                }
                if let Err(e) = reader.fill().await {
                    tracing::warn!(?e, topic = %reader.topic, "stream read failed; retrying");
                    tokio::time::sleep(RETRY_DELAY).await;
                }
            }
        });

        Ok(Box::pin(payloads))
    }
}

struct StreamReader {
    conn: MultiplexedConnection,
    topic: String,
    group: String,
    options: StreamReadOptions,
    pending: VecDeque<String>,
}

impl StreamReader {
    /// Read the next batch for this consumer, ack it, and queue the payloads.
    async fn fill(&mut self) -> redis::RedisResult<()> {
        let reply: Option<StreamReadReply> = self
            .conn
            .xread_options(&[self.topic.as_str()], &[">"], &self.options)
            .await?;

        let Some(reply) = reply else {
            return Ok(());
        };

        let mut ids = Vec::new();
        for key in reply.keys {
            for entry in key.ids {
                match entry.get::<String>(PAYLOAD_FIELD) {
                    Some(payload) => self.pending.push_back(payload),
                    None => tracing::warn!(id = %entry.id, topic = %self.topic, "entry without payload"),
                }
                ids.push(entry.id);
            }
        }

        if !ids.is_empty() {
            let _acked: i64 = self.conn.xack(&self.topic, &self.group, &ids).await?;
        }

        Ok(())
    }
}
