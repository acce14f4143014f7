//! Fan-out hub: per-session mailboxes, broadcast, and private delivery.
//!
//! Every live session owns a bounded mailbox drained by its socket task.
//! Broadcast walks the sessions known to the registry and offers the event
//! to each mailbox independently, so a slow or vanished recipient only costs
//! itself the message.

use std::sync::Arc;

use dashmap::DashMap;
use ligo_common::ChatEvent;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::error::RelayError;

use super::events::{Channel, Outbound};
use super::history::HistorySink;
use super::registry::SessionRegistry;

/// Capacity of one session's mailbox. A recipient this far behind starts
/// losing events instead of stalling everyone else.
const MAILBOX_CAPACITY: usize = 1024;

/// The receiving end handed to a session's socket task.
pub type Mailbox = mpsc::Receiver<Arc<Outbound>>;

/// Outcome of one broadcast.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
}

pub struct Fanout {
    registry: Arc<SessionRegistry>,
    mailboxes: DashMap<String, mpsc::Sender<Arc<Outbound>>>,
    history: Option<HistorySink>,
}

impl Fanout {
    pub fn new(registry: Arc<SessionRegistry>, history: Option<HistorySink>) -> Self {
        Self {
            registry,
            mailboxes: DashMap::new(),
            history,
        }
    }

    /// Open the mailbox for a registered session.
    pub fn attach(&self, session_id: &str) -> Mailbox {
        let (tx, rx) = mpsc::channel(MAILBOX_CAPACITY);
        self.mailboxes.insert(session_id.to_string(), tx);
        rx
    }

    /// Close a session's mailbox. Idempotent.
    pub fn detach(&self, session_id: &str) {
        self.mailboxes.remove(session_id);
    }

    /// Deliver `event` on the public channel to every session live right now,
    /// then hand it to the history sink without waiting.
    pub fn broadcast(&self, event: ChatEvent) -> DeliveryReport {
        let outbound = Arc::new(Outbound {
            channel: Channel::PUBLIC,
            event,
        });

        let mut report = DeliveryReport::default();
        let mut closed = Vec::new();

        for session_id in self.registry.session_ids() {
            let Some(tx) = self.mailboxes.get(&session_id).map(|tx| tx.clone()) else {
                tracing::debug!(%session_id, "session has no mailbox yet; skipped");
                report.failed += 1;
                continue;
            };
            match tx.try_send(outbound.clone()) {
                Ok(()) => report.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(%session_id, "mailbox full; broadcast dropped for session");
                    report.failed += 1;
                }
                Err(TrySendError::Closed(_)) => {
                    closed.push(session_id);
                    report.failed += 1;
                }
            }
        }

        for session_id in closed {
            tracing::debug!(%session_id, "pruning closed mailbox");
            self.mailboxes.remove(&session_id);
        }

        if let Some(history) = &self.history {
            history.record_event(&outbound.event);
        }

        tracing::debug!(
            kind = %outbound.event.kind,
            delivered = report.delivered,
            failed = report.failed,
            "broadcast"
        );
        report
    }

    /// Deliver `event` to exactly one session on a private channel.
    pub fn send_to(
        &self,
        session_id: &str,
        channel: &'static str,
        event: ChatEvent,
    ) -> Result<(), RelayError> {
        if !self.registry.contains(session_id) {
            return Err(RelayError::SessionGone(session_id.to_string()));
        }
        let tx = self
            .mailboxes
            .get(session_id)
            .map(|tx| tx.clone())
            .ok_or_else(|| RelayError::SessionGone(session_id.to_string()))?;

        match tx.try_send(Arc::new(Outbound { channel, event })) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(RelayError::MailboxFull(session_id.to_string())),
            Err(TrySendError::Closed(_)) => {
                self.mailboxes.remove(session_id);
                Err(RelayError::SessionGone(session_id.to_string()))
            }
        }
    }
}
