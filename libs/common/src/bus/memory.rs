//! In-process topic bus for single-node runs and tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::stream;
use tokio::sync::{mpsc, Mutex};

use super::{BusError, PayloadStream, TopicBus};

/// One queue per consumer group. Consumers in the same group share the
/// receiver, so each payload goes to exactly one of them.
struct GroupQueue {
    tx: mpsc::UnboundedSender<String>,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<String>>>,
}

impl GroupQueue {
    fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
        }
    }
}

/// Topic → group → queue. Payloads published to a topic with no group yet
/// are dropped, mirroring a substrate whose new groups start at the tail.
#[derive(Default)]
pub struct MemoryBus {
    topics: DashMap<String, HashMap<String, GroupQueue>>,
}

impl MemoryBus {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TopicBus for MemoryBus {
    async fn publish(&self, topic: &str, payload: String) -> Result<(), BusError> {
        match self.topics.get(topic) {
            Some(groups) => {
                for queue in groups.values() {
                    // The receiver lives as long as the queue entry.
                    let _ = queue.tx.send(payload.clone());
                }
            }
            None => tracing::trace!(%topic, "no consumer group; payload dropped"),
        }
        Ok(())
    }

    async fn subscribe(&self, topic: &str, group: &str) -> Result<PayloadStream, BusError> {
        let rx = {
            let mut groups = self.topics.entry(topic.to_string()).or_default();
            groups
                .entry(group.to_string())
                .or_insert_with(GroupQueue::new)
                .rx
                .clone()
        };

        let payloads = stream::unfold(rx, |rx| async move {
            let next = {
                let mut guard = rx.lock().await;
                guard.recv().await
            };
            next.map(|payload| (payload, rx))
        });

        Ok(Box::pin(payloads))
    }
}
