use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::db::Database;
use crate::models::{RawDetection, RawMessage};

/// Read-only access to the raw landing tables.
///
/// The pipeline never reaches into the raw tables directly; it goes through
/// this trait so the source can be swapped (SQLite in production, in-memory
/// rows in tests).
#[async_trait]
pub trait RawSource: Send + Sync {
    /// Fetch every raw message row in a stable order
    async fn fetch_messages(&self) -> Result<Vec<RawMessage>>;

    /// Fetch every raw detection row in a stable order
    async fn fetch_detections(&self) -> Result<Vec<RawDetection>>;
}

/// Raw source backed by the warehouse SQLite database
pub struct SqliteRawSource {
    database: Arc<Database>,
}

impl SqliteRawSource {
    #[must_use]
    pub fn new(database: Arc<Database>) -> Self {
        Self { database }
    }
}

#[async_trait]
impl RawSource for SqliteRawSource {
    async fn fetch_messages(&self) -> Result<Vec<RawMessage>> {
        self.database.fetch_raw_messages()
    }

    async fn fetch_detections(&self) -> Result<Vec<RawDetection>> {
        self.database.fetch_raw_detections()
    }
}

/// Raw source over fixed in-memory rows, for tests and dry runs
#[derive(Debug, Default, Clone)]
pub struct MemoryRawSource {
    messages: Vec<RawMessage>,
    detections: Vec<RawDetection>,
}

impl MemoryRawSource {
    #[must_use]
    pub fn new(messages: Vec<RawMessage>, detections: Vec<RawDetection>) -> Self {
        Self { messages, detections }
    }
}

#[async_trait]
impl RawSource for MemoryRawSource {
    async fn fetch_messages(&self) -> Result<Vec<RawMessage>> {
        Ok(self.messages.clone())
    }

    async fn fetch_detections(&self) -> Result<Vec<RawDetection>> {
        Ok(self.detections.clone())
    }
}
