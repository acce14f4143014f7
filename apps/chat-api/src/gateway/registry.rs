//! Session registry: live sessions and their mutable attributes.
//!
//! Holds no transport handles; delivery lives in [`super::fanout`].

use std::collections::HashMap;
use std::time::Instant;

use dashmap::DashMap;
use ligo_common::id::{prefix, prefixed_ulid};
use parking_lot::Mutex;

/// Attribute key under which a session's display name is stored.
pub const USERNAME: &str = "username";

/// Per-session metadata.
pub struct SessionEntry {
    pub attributes: HashMap<String, String>,
    pub connected_at: Instant,
}

/// Shared registry of all live sessions.
///
/// Uses `DashMap` for shard-level concurrency and `parking_lot::Mutex` per
/// entry for non-poisoning, fast locking. Attributes are only ever written
/// by their own session, so per-key atomicity is enough.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, Mutex<SessionEntry>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection and return its session id.
    pub fn register(&self) -> String {
        let session_id = prefixed_ulid(prefix::SESSION);
        let entry = SessionEntry {
            attributes: HashMap::new(),
            connected_at: Instant::now(),
        };
        self.sessions.insert(session_id.clone(), Mutex::new(entry));
        session_id
    }

    /// Set an attribute. A no-op if the session already disconnected.
    pub fn set_attribute(&self, session_id: &str, key: &str, value: &str) {
        match self.sessions.get(session_id) {
            Some(entry) => {
                entry.lock().attributes.insert(key.to_string(), value.to_string());
            }
            None => tracing::debug!(%session_id, %key, "attribute set on unknown session ignored"),
        }
    }

    pub fn attribute(&self, session_id: &str, key: &str) -> Option<String> {
        let entry = self.sessions.get(session_id)?;
        let e = entry.lock();
        e.attributes.get(key).cloned()
    }

    /// Remove a session and all of its attributes. Idempotent.
    pub fn unregister(&self, session_id: &str) -> Option<SessionEntry> {
        self.sessions
            .remove(session_id)
            .map(|(_, entry)| entry.into_inner())
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Snapshot of the ids of every live session.
    pub fn session_ids(&self) -> Vec<String> {
        self.sessions.iter().map(|e| e.key().clone()).collect()
    }
}
