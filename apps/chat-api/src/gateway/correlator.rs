//! Response correlator: routes side-channel worker results back to the
//! session that asked for them.
//!
//! Each request carries the originating `sessionId`; workers echo it in the
//! response. A response is delivered once or dropped, with no retries: a
//! session that disconnected while its request was in flight simply never
//! sees the result.

use std::sync::Arc;

use ligo_common::{topic, ChatEvent, EventKind};

use crate::error::RelayError;

use super::events::Channel;
use super::fanout::Fanout;

/// How a correlated response reaches clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Re-broadcast to everyone (translations).
    Broadcast,
    /// Only the originating session, on the given private channel.
    Private(&'static str),
}

/// Binding of one response topic to its result kind and delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseRoute {
    pub topic: &'static str,
    pub result_kind: EventKind,
    pub delivery: Delivery,
}

/// Routing table for every side-channel response topic.
pub fn response_routes() -> Vec<ResponseRoute> {
    vec![
        ResponseRoute {
            topic: topic::TRANSLATE_RESPONSE,
            result_kind: EventKind::TranslationResult,
            delivery: Delivery::Broadcast,
        },
        ResponseRoute {
            topic: topic::CHECK_GRAMMAR_RESPONSE,
            result_kind: EventKind::GrammarResult,
            delivery: Delivery::Private(Channel::CHECK_GRAMMAR),
        },
        ResponseRoute {
            topic: topic::ASK_BOT_RESPONSE,
            result_kind: EventKind::BotResult,
            delivery: Delivery::Private(Channel::ASK_LIGOBOT),
        },
    ]
}

pub struct ResponseCorrelator {
    fanout: Arc<Fanout>,
}

impl ResponseCorrelator {
    pub fn new(fanout: Arc<Fanout>) -> Self {
        Self { fanout }
    }

    /// Decode a worker response, tag it with the route's result kind, and
    /// deliver it. Errors mean the response was dropped.
    pub fn on_side_channel_response(
        &self,
        raw: &str,
        route: &ResponseRoute,
    ) -> Result<(), RelayError> {
        let mut event: ChatEvent = serde_json::from_str(raw)
            .map_err(|e| RelayError::MalformedResponse(e.to_string()))?;
        event.kind = route.result_kind.clone();

        match route.delivery {
            Delivery::Broadcast => {
                self.fanout.broadcast(event);
                Ok(())
            }
            Delivery::Private(channel) => {
                let session_id = event
                    .session_id
                    .clone()
                    .ok_or_else(|| RelayError::MalformedResponse("missing sessionId".into()))?;
                self.fanout.send_to(&session_id, channel, event)?;
                tracing::debug!(%session_id, topic = route.topic, "side-channel result delivered");
                Ok(())
            }
        }
    }
}
