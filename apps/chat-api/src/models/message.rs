use chrono::{DateTime, Utc};
use diesel::prelude::*;
use ligo_common::{ChatEvent, EventKind};

use crate::db::schema::chat_messages;

/// Durable projection of a broadcast chat event. Never mutated after insert.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = chat_messages)]
pub struct HistoryRecord {
    pub id: i64,
    pub sender: String,
    pub content: String,
    pub message_type: String,
    pub room_id: String,
    pub created_at: DateTime<Utc>,
}

impl HistoryRecord {
    /// The record as the event shape clients already understand.
    pub fn to_event(&self) -> ChatEvent {
        ChatEvent::new(
            EventKind::from(self.message_type.clone()),
            self.sender.clone(),
            self.content.clone(),
        )
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = chat_messages)]
pub struct NewHistoryRecord {
    pub sender: String,
    pub content: String,
    pub message_type: String,
    pub room_id: String,
    pub created_at: DateTime<Utc>,
}

impl NewHistoryRecord {
    pub fn new(sender: &str, content: &str, kind: &EventKind, room: &str) -> Self {
        Self {
            sender: sender.to_string(),
            content: content.to_string(),
            message_type: kind.to_string(),
            room_id: room.to_string(),
            created_at: Utc::now(),
        }
    }
}
