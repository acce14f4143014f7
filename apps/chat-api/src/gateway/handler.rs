//! Inbound verb dispatch: joins, chat messages, and side-channel requests.

use std::sync::Arc;

use ligo_common::bus::publish_event;
use ligo_common::{topic, ChatEvent, EventKind, SideChannelMode, TopicBus};

use crate::error::RelayError;

use super::events::Verb;
use super::registry::{SessionRegistry, USERNAME};

/// Heartbeat interval sent to clients in the READY payload (ms).
pub const HEARTBEAT_INTERVAL_MS: u64 = 41250;

/// Every broadcast a session causes (JOIN, CHAT, LEAVE) goes through the
/// `messaging` topic, so peers see one session's events in the order it sent them.
pub struct RelayDispatcher {
    registry: Arc<SessionRegistry>,
    bus: Arc<dyn TopicBus>,
}

impl RelayDispatcher {
    pub fn new(registry: Arc<SessionRegistry>, bus: Arc<dyn TopicBus>) -> Self {
        Self { registry, bus }
    }

    /// Route one inbound event from `session_id` to its verb handler.
    pub async fn dispatch(&self, verb: Verb, event: ChatEvent, session_id: &str) {
        match verb {
            Verb::AddUser => {
                let event = self.on_join(event, session_id);
                self.publish(topic::MESSAGING, &event).await;
            }
            Verb::SendMessage => self.on_chat_message(event, session_id).await,
            Verb::CheckGrammar => self.on_grammar_check_request(event, session_id).await,
            Verb::AskLigobot => self.on_bot_request(event, session_id).await,
        }
    }

    /// Remember the sender's name for this session. The returned event is
    /// what gets broadcast.
    pub fn on_join(&self, mut event: ChatEvent, session_id: &str) -> ChatEvent {
        event.session_id = Some(session_id.to_string());
        self.registry.set_attribute(session_id, USERNAME, &event.sender);
        tracing::info!(%session_id, sender = %event.sender, "user joined");
        event
    }

    /// Publish a chat message for broadcast, plus a translation request when
    /// the sender asked for one.
    pub async fn on_chat_message(&self, mut event: ChatEvent, session_id: &str) {
        event.session_id = Some(session_id.to_string());
        if let Some(username) = self.registry.attribute(session_id, USERNAME) {
            event.sender = username;
        }

        self.publish(topic::MESSAGING, &event).await;

        match event.side_channel_mode() {
            SideChannelMode::None => {}
            SideChannelMode::Translate(language) => {
                tracing::debug!(%session_id, language = language.code(), "translation requested");
                self.publish(topic::TRANSLATE_REQUEST, &event).await;
            }
            SideChannelMode::Unknown(mode) => {
                tracing::warn!(%session_id, %mode, "unknown translation mode; message sent untranslated");
            }
        }
    }

    /// Announce that a joined session went away.
    pub async fn on_leave(&self, username: &str, session_id: &str) {
        let mut leave = ChatEvent::new(EventKind::Leave, username, "");
        leave.session_id = Some(session_id.to_string());
        self.publish(topic::MESSAGING, &leave).await;
    }

    pub async fn on_grammar_check_request(&self, mut event: ChatEvent, session_id: &str) {
        event.session_id = Some(session_id.to_string());
        self.publish(topic::CHECK_GRAMMAR_REQUEST, &event).await;
    }

    pub async fn on_bot_request(&self, mut event: ChatEvent, session_id: &str) {
        event.session_id = Some(session_id.to_string());
        self.publish(topic::ASK_BOT_REQUEST, &event).await;
    }

    async fn publish(&self, topic: &'static str, event: &ChatEvent) {
        if let Err(source) = publish_event(self.bus.as_ref(), topic, event).await {
            let err = RelayError::Publish { topic, source };
            tracing::error!(error = %err, "dropping event");
        }
    }
}
