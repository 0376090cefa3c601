//! Live view of a user's journal rows kept in a remote table.

pub mod memory;
pub mod rest;
pub mod watcher;

use crate::models::JournalEntry;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::future::Future;
use thiserror::Error;
use tokio::sync::broadcast;

pub use memory::MemoryJournalTable;
pub use rest::{RestJournalTable, WebhookPayload};
pub use watcher::{JournalView, JournalWatcher};

const CHANGE_FEED_CAPACITY: usize = 64;

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("journal table returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("journal table unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// One row-level notification; carries the owner so subscribers can filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub user_id: String,
    pub entry_id: Option<String>,
}

/// Broadcast hub of row changes.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        let (tx, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self { tx }
    }
}

impl ChangeFeed {
    pub fn publish(&self, event: ChangeEvent) {
        // No subscribers is fine: nobody is watching that journal yet.
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }
}

pub trait JournalTable: Send + Sync + 'static {
    /// All rows owned by `user_id`, newest date first, most recently created first
    /// within a day.
    fn fetch(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Vec<JournalEntry>, JournalError>> + Send;

    fn changes(&self) -> broadcast::Receiver<ChangeEvent>;
}

/// Backend chosen at startup.
pub enum JournalBackend {
    Memory(MemoryJournalTable),
    Rest(RestJournalTable),
}

impl JournalBackend {
    pub fn feed(&self) -> &ChangeFeed {
        match self {
            Self::Memory(table) => table.feed(),
            Self::Rest(table) => table.feed(),
        }
    }
}

impl JournalTable for JournalBackend {
    async fn fetch(&self, user_id: &str) -> Result<Vec<JournalEntry>, JournalError> {
        match self {
            Self::Memory(table) => table.fetch(user_id).await,
            Self::Rest(table) => table.fetch(user_id).await,
        }
    }

    fn changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.feed().subscribe()
    }
}

/// Date descending, then creation time descending. Rows without a creation time
/// sort after those that have one.
pub fn sort_entries(entries: &mut [JournalEntry]) {
    entries.sort_by_key(|entry| (Reverse(entry.date), Reverse(entry.created_at)));
}
