//! History sink: best-effort persistence of broadcast events.

use std::sync::Arc;

use ligo_common::{ChatEvent, EventKind};
use tokio::task::JoinHandle;

use crate::db::history::HistoryStore;
use crate::models::message::NewHistoryRecord;

/// Cloneable handle over the history store. Never fails toward its caller.
#[derive(Clone)]
pub struct HistorySink {
    store: Arc<dyn HistoryStore>,
    room: String,
}

impl HistorySink {
    pub fn new(store: Arc<dyn HistoryStore>, room: impl Into<String>) -> Self {
        Self {
            store,
            room: room.into(),
        }
    }

    /// Append a record in the background. Failures are logged and swallowed.
    pub fn record(&self, sender: &str, content: &str, kind: &EventKind, room: &str) -> JoinHandle<()> {
        let store = self.store.clone();
        let record = NewHistoryRecord::new(sender, content, kind, room);
        tokio::spawn(async move {
            match store.append(record).await {
                Ok(()) => tracing::trace!("chat message persisted"),
                Err(e) => tracing::error!(error = %e, "failed to persist chat message"),
            }
        })
    }

    /// Record a broadcast event in this sink's room.
    pub fn record_event(&self, event: &ChatEvent) -> JoinHandle<()> {
        self.record(&event.sender, &event.content, &event.kind, &self.room)
    }

    /// The last `limit` records, oldest first. Empty on any store failure.
    pub async fn recent(&self, limit: usize) -> Vec<ChatEvent> {
        if limit == 0 {
            return Vec::new();
        }
        match self.store.query_recent(limit).await {
            Ok(mut records) => {
                // The store hands back newest-first.
                records.reverse();
                tracing::debug!(count = records.len(), "retrieved recent messages");
                records.iter().map(|r| r.to_event()).collect()
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to retrieve recent messages");
                Vec::new()
            }
        }
    }
}
