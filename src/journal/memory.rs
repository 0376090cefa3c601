use super::{ChangeEvent, ChangeFeed, ChangeKind, JournalError, JournalTable, sort_entries};
use crate::models::JournalEntry;
use chrono::Utc;
use tokio::sync::{RwLock, broadcast};

#[derive(Debug, Clone)]
struct Row {
    user_id: String,
    entry: JournalEntry,
}

/// In-process journal table. Writes stamp `created_at`/`updated_at` the way the
/// remote table does and publish to the change feed.
#[derive(Debug, Default)]
pub struct MemoryJournalTable {
    rows: RwLock<Vec<Row>>,
    feed: ChangeFeed,
}

impl MemoryJournalTable {
    pub fn new(feed: ChangeFeed) -> Self {
        Self {
            rows: RwLock::default(),
            feed,
        }
    }

    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    pub async fn insert(&self, user_id: &str, mut entry: JournalEntry) -> JournalEntry {
        let now = Utc::now();
        entry.created_at.get_or_insert(now);
        entry.updated_at = Some(now);

        self.rows.write().await.push(Row {
            user_id: user_id.to_string(),
            entry: entry.clone(),
        });
        self.notify(ChangeKind::Insert, user_id, &entry.id);
        entry
    }

    /// Replaces the row with the same id; returns false when the user has no such row.
    pub async fn update(&self, user_id: &str, mut entry: JournalEntry) -> bool {
        let mut rows = self.rows.write().await;
        let Some(row) = rows
            .iter_mut()
            .find(|row| row.user_id == user_id && row.entry.id == entry.id)
        else {
            return false;
        };

        entry.created_at = row.entry.created_at;
        entry.updated_at = Some(Utc::now());
        row.entry = entry;
        let id = row.entry.id.clone();
        drop(rows);

        self.notify(ChangeKind::Update, user_id, &id);
        true
    }

    pub async fn delete(&self, user_id: &str, entry_id: &str) -> bool {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|row| !(row.user_id == user_id && row.entry.id == entry_id));
        let removed = rows.len() != before;
        drop(rows);

        if removed {
            self.notify(ChangeKind::Delete, user_id, entry_id);
        }
        removed
    }

    fn notify(&self, kind: ChangeKind, user_id: &str, entry_id: &str) {
        self.feed.publish(ChangeEvent {
            kind,
            user_id: user_id.to_string(),
            entry_id: Some(entry_id.to_string()),
        });
    }
}

impl JournalTable for MemoryJournalTable {
    async fn fetch(&self, user_id: &str) -> Result<Vec<JournalEntry>, JournalError> {
        let mut entries: Vec<JournalEntry> = self
            .rows
            .read()
            .await
            .iter()
            .filter(|row| row.user_id == user_id)
            .map(|row| row.entry.clone())
            .collect();
        sort_entries(&mut entries);
        Ok(entries)
    }

    fn changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.feed.subscribe()
    }
}
