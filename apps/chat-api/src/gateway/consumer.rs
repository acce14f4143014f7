//! Topic consumers: one long-lived task per subscribed topic.

use std::sync::Arc;

use futures_util::StreamExt;
use ligo_common::{topic, BusError, ChatEvent, TopicBus};
use tokio::task::JoinHandle;

use crate::error::RelayError;

use super::correlator::{response_routes, ResponseCorrelator, ResponseRoute};
use super::fanout::Fanout;

/// What happens to a payload read from a bound topic.
#[derive(Debug, Clone)]
pub enum TopicHandler {
    /// Chat traffic: decode and broadcast.
    Broadcast,
    /// A side-channel response: hand to the correlator.
    Correlate(ResponseRoute),
}

#[derive(Debug, Clone)]
pub struct TopicBinding {
    pub topic: &'static str,
    pub handler: TopicHandler,
}

/// Every topic the relay consumes.
pub fn bindings() -> Vec<TopicBinding> {
    let mut bindings = vec![TopicBinding {
        topic: topic::MESSAGING,
        handler: TopicHandler::Broadcast,
    }];
    bindings.extend(response_routes().into_iter().map(|route| TopicBinding {
        topic: route.topic,
        handler: TopicHandler::Correlate(route),
    }));
    bindings
}

/// Subscribe to every binding and spawn its consumer task.
///
/// Subscriptions are complete when this returns.
pub async fn spawn_consumers(
    bus: Arc<dyn TopicBus>,
    group: &str,
    fanout: Arc<Fanout>,
    correlator: Arc<ResponseCorrelator>,
) -> Result<Vec<JoinHandle<()>>, BusError> {
    let mut handles = Vec::new();

    for binding in bindings() {
        let mut payloads = bus.subscribe(binding.topic, group).await?;
        let fanout = fanout.clone();
        let correlator = correlator.clone();
        tracing::info!(topic = binding.topic, %group, "topic consumer started");

        handles.push(tokio::spawn(async move {
            while let Some(raw) = payloads.next().await {
                match &binding.handler {
                    TopicHandler::Broadcast => on_chat_payload(&fanout, binding.topic, &raw),
                    TopicHandler::Correlate(route) => {
                        if let Err(e) = correlator.on_side_channel_response(&raw, route) {
                            log_dropped(route.topic, &e);
                        }
                    }
                }
            }
            tracing::warn!(topic = binding.topic, "topic consumer stopped");
        }));
    }

    Ok(handles)
}

fn on_chat_payload(fanout: &Fanout, topic: &str, raw: &str) {
    match serde_json::from_str::<ChatEvent>(raw) {
        Ok(event) => {
            fanout.broadcast(event);
        }
        Err(e) => tracing::warn!(%topic, error = %e, "skipping malformed chat payload"),
    }
}

fn log_dropped(topic: &str, err: &RelayError) {
    match err {
        RelayError::SessionGone(_) => {
            tracing::info!(%topic, error = %err, "side-channel result dropped")
        }
        _ => tracing::warn!(%topic, error = %err, "side-channel result dropped"),
    }
}
