use super::JournalTable;
use crate::models::JournalEntry;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Notify, broadcast::error::RecvError, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JournalView {
    pub entries: Vec<JournalEntry>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Keeps a [`JournalView`] in sync with one user's rows. Every change notified for
/// that user triggers a full re-fetch. Dropping the watcher tears the
/// subscription down.
pub struct JournalWatcher<T> {
    table: Arc<T>,
    user_id: Option<String>,
    view: Arc<watch::Sender<JournalView>>,
    refresh: Arc<Notify>,
    task: Option<JoinHandle<()>>,
}

impl<T: JournalTable> JournalWatcher<T> {
    pub fn start(table: Arc<T>, user_id: Option<String>) -> Self {
        let (view, _) = watch::channel(JournalView::default());
        let mut watcher = Self {
            table,
            user_id: None,
            view: Arc::new(view),
            refresh: Arc::new(Notify::new()),
            task: None,
        };
        watcher.set_user(user_id);
        watcher
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn view(&self) -> JournalView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<JournalView> {
        self.view.subscribe()
    }

    /// Requests a full re-fetch. No-op while signed out.
    pub fn refresh(&self) {
        if self.task.is_some() {
            self.refresh.notify_one();
        }
    }

    /// Switches to another user (or none), tearing down the previous subscription.
    pub fn set_user(&mut self, user_id: Option<String>) {
        self.stop();
        self.user_id = user_id;

        let Some(user_id) = self.user_id.clone() else {
            self.view.send_replace(JournalView::default());
            return;
        };

        info!(%user_id, "watching journal");
        self.view.send_modify(|view| {
            view.loading = true;
            view.error = None;
        });
        self.refresh = Arc::new(Notify::new());
        self.task = Some(tokio::spawn(run(
            self.table.clone(),
            user_id,
            self.view.clone(),
            self.refresh.clone(),
        )));
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl<T> Drop for JournalWatcher<T> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run<T: JournalTable>(
    table: Arc<T>,
    user_id: String,
    view: Arc<watch::Sender<JournalView>>,
    refresh: Arc<Notify>,
) {
    // Subscribe before the first fetch so no change falls between the two.
    let mut changes = table.changes();
    load(table.as_ref(), &user_id, &view).await;

    loop {
        tokio::select! {
            event = changes.recv() => match event {
                Ok(event) if event.user_id == user_id => {
                    debug!(%user_id, kind = ?event.kind, "journal changed");
                    load(table.as_ref(), &user_id, &view).await;
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(%user_id, skipped, "journal change feed lagged");
                    load(table.as_ref(), &user_id, &view).await;
                }
                Err(RecvError::Closed) => break,
            },
            () = refresh.notified() => load(table.as_ref(), &user_id, &view).await,
        }
    }

    debug!(%user_id, "journal change feed closed, manual refresh only");
    loop {
        refresh.notified().await;
        load(table.as_ref(), &user_id, &view).await;
    }
}

// On failure the previous entries are kept and only the error is set.
async fn load<T: JournalTable>(table: &T, user_id: &str, view: &watch::Sender<JournalView>) {
    view.send_modify(|view| view.loading = true);
    match table.fetch(user_id).await {
        Ok(entries) => view.send_modify(|view| {
            view.entries = entries;
            view.loading = false;
            view.error = None;
        }),
        Err(err) => {
            warn!(%user_id, "journal fetch failed: {err}");
            view.send_modify(|view| {
                view.loading = false;
                view.error = Some(err.to_string());
            });
        }
    }
}
