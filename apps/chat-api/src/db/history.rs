use std::collections::VecDeque;

use async_trait::async_trait;
use diesel::prelude::*;
use parking_lot::Mutex;

use crate::db::pool::DbPool;
use crate::db::schema::chat_messages;
use crate::error::RelayError;
use crate::models::message::{HistoryRecord, NewHistoryRecord};

/// Abstraction over the message history store.
///
/// Backed by PostgreSQL in production and an in-memory list in tests.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append(&self, record: NewHistoryRecord) -> Result<(), RelayError>;

    /// The `limit` most recent records, newest first.
    async fn query_recent(&self, limit: usize) -> Result<Vec<HistoryRecord>, RelayError>;
}

// ---------------------------------------------------------------------------
// PostgreSQL implementation
// ---------------------------------------------------------------------------

pub struct PgHistoryStore {
    db: DbPool,
}

impl PgHistoryStore {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl HistoryStore for PgHistoryStore {
    async fn append(&self, record: NewHistoryRecord) -> Result<(), RelayError> {
        let mut conn = self.db.get().await?;
        diesel_async::RunQueryDsl::execute(
            diesel::insert_into(chat_messages::table).values(&record),
            &mut conn,
        )
        .await?;
        Ok(())
    }

    async fn query_recent(&self, limit: usize) -> Result<Vec<HistoryRecord>, RelayError> {
        let mut conn = self.db.get().await?;
        let rows: Vec<HistoryRecord> = diesel_async::RunQueryDsl::load(
            chat_messages::table
                .order((chat_messages::created_at.desc(), chat_messages::id.desc()))
                .limit(limit as i64)
                .select(HistoryRecord::as_select()),
            &mut conn,
        )
        .await?;
        Ok(rows)
    }
}

// ---------------------------------------------------------------------------
// In-memory implementation (single node / tests)
// ---------------------------------------------------------------------------

/// Records kept by [`MemoryHistoryStore`]. Older ones are evicted on append.
pub const MEMORY_HISTORY_CAPACITY: usize = 1000;

#[derive(Default)]
pub struct MemoryHistoryStore {
    records: Mutex<VecDeque<HistoryRecord>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn append(&self, record: NewHistoryRecord) -> Result<(), RelayError> {
        let mut records = self.records.lock();
        let id = records.back().map_or(1, |last| last.id + 1);
        if records.len() == MEMORY_HISTORY_CAPACITY {
            records.pop_front();
        }
        records.push_back(HistoryRecord {
            id,
            sender: record.sender,
            content: record.content,
            message_type: record.message_type,
            room_id: record.room_id,
            created_at: record.created_at,
        });
        Ok(())
    }

    async fn query_recent(&self, limit: usize) -> Result<Vec<HistoryRecord>, RelayError> {
        let records = self.records.lock();
        Ok(records.iter().rev().take(limit).cloned().collect())
    }
}
