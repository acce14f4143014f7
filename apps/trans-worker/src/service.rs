//! Request consumers: read side-channel requests, ask the backend, publish
//! the answer on the matching response topic.

use std::sync::Arc;

use futures_util::StreamExt;
use ligo_common::bus::publish_event;
use ligo_common::{topic, BusError, ChatEvent, SideChannelMode, TopicBus};
use tokio::task::JoinHandle;

use crate::backend::LanguageBackend;
use crate::prompt::{self, Task};

/// Reply content for a translation request with no usable mode.
pub const UNSUPPORTED_MODE: &str = "Unsupported translation mode";

/// Backend calls in flight per request topic.
pub const MAX_IN_FLIGHT: usize = 8;

/// The three request topics the worker serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Translate,
    CheckGrammar,
    AskBot,
}

impl RequestKind {
    pub const ALL: [RequestKind; 3] = [
        RequestKind::Translate,
        RequestKind::CheckGrammar,
        RequestKind::AskBot,
    ];

    pub fn request_topic(self) -> &'static str {
        match self {
            RequestKind::Translate => topic::TRANSLATE_REQUEST,
            RequestKind::CheckGrammar => topic::CHECK_GRAMMAR_REQUEST,
            RequestKind::AskBot => topic::ASK_BOT_REQUEST,
        }
    }

    pub fn response_topic(self) -> &'static str {
        match self {
            RequestKind::Translate => topic::TRANSLATE_RESPONSE,
            RequestKind::CheckGrammar => topic::CHECK_GRAMMAR_RESPONSE,
            RequestKind::AskBot => topic::ASK_BOT_RESPONSE,
        }
    }
}

pub struct Worker {
    bus: Arc<dyn TopicBus>,
    backend: Arc<dyn LanguageBackend>,
}

impl Worker {
    pub fn new(bus: Arc<dyn TopicBus>, backend: Arc<dyn LanguageBackend>) -> Self {
        Self { bus, backend }
    }

    /// Subscribe to every request topic in `group` and spawn one consumer
    /// task per topic. Each task answers up to [`MAX_IN_FLIGHT`] requests at
    /// once. Subscriptions are complete when this returns.
    pub async fn spawn(self: Arc<Self>, group: &str) -> Result<Vec<JoinHandle<()>>, BusError> {
        let mut handles = Vec::new();

        for kind in RequestKind::ALL {
            let requests = self.bus.subscribe(kind.request_topic(), group).await?;
            let worker = self.clone();
            tracing::info!(topic = kind.request_topic(), %group, "request consumer started");

            handles.push(tokio::spawn(async move {
                requests
                    .for_each_concurrent(MAX_IN_FLIGHT, |raw| {
                        let worker = worker.clone();
                        async move { worker.handle(kind, &raw).await }
                    })
                    .await;
                tracing::warn!(topic = kind.request_topic(), "request consumer stopped");
            }));
        }

        Ok(handles)
    }

    /// Answer one raw request and publish the result. Undecodable requests are skipped.
    pub async fn handle(&self, kind: RequestKind, raw: &str) {
        let request: ChatEvent = match serde_json::from_str(raw) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(topic = kind.request_topic(), error = %e, "skipping malformed request");
                return;
            }
        };

        let response = self.answer(kind, request).await;
        if let Err(e) = publish_event(self.bus.as_ref(), kind.response_topic(), &response).await {
            tracing::error!(topic = kind.response_topic(), error = %e, "failed to publish response");
        }
    }

    /// Build the response event. The session id and every other field are
    /// echoed; only `content` changes.
    pub async fn answer(&self, kind: RequestKind, mut event: ChatEvent) -> ChatEvent {
        event.content = match kind {
            RequestKind::Translate => {
                let mode = event.translation_mode.clone().unwrap_or_default();
                let translated = match event.side_channel_mode() {
                    SideChannelMode::Translate(language) => {
                        self.complete(Task::Translate(language), &event.content).await
                    }
                    SideChannelMode::None | SideChannelMode::Unknown(_) => {
                        tracing::warn!(%mode, "unknown translation mode");
                        UNSUPPORTED_MODE.to_string()
                    }
                };
                format!("{mode}: {translated}")
            }
            RequestKind::CheckGrammar => self.complete(Task::CheckGrammar, &event.content).await,
            RequestKind::AskBot => self.complete(Task::AskBot, &event.content).await,
        };
        event
    }

    /// Backend failures become the answer text.
    async fn complete(&self, task: Task, content: &str) -> String {
        match self.backend.complete(&prompt::build(task, content)).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(?task, error = %e, "language backend error");
                format!("An error occurred: {e}")
            }
        }
    }
}
