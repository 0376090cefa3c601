use super::{ChangeEvent, ChangeFeed, ChangeKind, JournalError, JournalTable, sort_entries};
use crate::config::SupabaseConfig;
use crate::models::JournalEntry;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::debug;

const TABLE: &str = "journal_entries";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Journal rows served by PostgREST. Change notifications arrive through database
/// webhooks and are fed into [`RestJournalTable::feed`].
pub struct RestJournalTable {
    client: reqwest::Client,
    base_url: String,
    feed: ChangeFeed,
}

impl RestJournalTable {
    pub fn new(config: &SupabaseConfig, feed: ChangeFeed) -> Result<Self, JournalError> {
        let key = config.anon_key.expose_secret();
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(key)
                .map_err(|e| JournalError::Unavailable(format!("invalid anon key: {e}")))?,
        );
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|e| JournalError::Unavailable(format!("invalid anon key: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.clone(),
            feed,
        })
    }

    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }
}

impl JournalTable for RestJournalTable {
    async fn fetch(&self, user_id: &str) -> Result<Vec<JournalEntry>, JournalError> {
        let owner = format!("eq.{user_id}");
        let response = self
            .client
            .get(format!("{}/rest/v1/{TABLE}", self.base_url))
            .query(&[
                ("select", "*"),
                ("user_id", owner.as_str()),
                ("order", "date.desc,created_at.desc"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(JournalError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let mut entries: Vec<JournalEntry> = response.json().await?;
        sort_entries(&mut entries);
        debug!(user_id, rows = entries.len(), "journal fetched");
        Ok(entries)
    }

    fn changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.feed.subscribe()
    }
}

/// Body of a database webhook: `{type, table, record, old_record}`.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub record: Option<Value>,
    #[serde(default)]
    pub old_record: Option<Value>,
}

impl WebhookPayload {
    /// The change this webhook describes, or `None` when it is for another table
    /// or carries no owner.
    pub fn into_change(self) -> Option<ChangeEvent> {
        if self.table.as_deref().is_some_and(|table| table != TABLE) {
            return None;
        }

        let row = match self.kind {
            ChangeKind::Delete => self.old_record.or(self.record),
            ChangeKind::Insert | ChangeKind::Update => self.record.or(self.old_record),
        }?;
        let field = |name: &str| row.get(name).and_then(Value::as_str).map(str::to_string);

        Some(ChangeEvent {
            kind: self.kind,
            user_id: field("user_id")?,
            entry_id: field("id"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn delete_webhook_reads_old_record() {
        let payload: WebhookPayload = serde_json::from_value(json!({
            "type": "DELETE",
            "table": "journal_entries",
            "schema": "public",
            "record": null,
            "old_record": { "id": "e1", "user_id": "u1" }
        }))
        .unwrap();

        let change = payload.into_change().unwrap();
        assert_eq!(change.kind, ChangeKind::Delete);
        assert_eq!(change.user_id, "u1");
        assert_eq!(change.entry_id.as_deref(), Some("e1"));
    }

    #[test]
    fn other_tables_and_ownerless_rows_are_ignored() {
        let other: WebhookPayload = serde_json::from_value(json!({
            "type": "INSERT",
            "table": "profiles",
            "record": { "id": "p1", "user_id": "u1" }
        }))
        .unwrap();
        assert!(other.into_change().is_none());

        let ownerless: WebhookPayload = serde_json::from_value(json!({
            "type": "UPDATE",
            "table": "journal_entries",
            "record": { "id": "e1" }
        }))
        .unwrap();
        assert!(ownerless.into_change().is_none());
    }
}
