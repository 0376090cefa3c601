use crate::actions::Action;
use crate::models::AppData;
use crate::reducer::{Effect, reduce};
use crate::storage::{LocalStore, persist_app_data};
use serde::Serialize;
use tokio::sync::{Mutex, watch};
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn from_dark(dark: bool) -> Self {
        if dark { Self::Dark } else { Self::Light }
    }
}

/// Owns the client state. Actions are applied one at a time in the order they
/// are dispatched; each transition is persisted before the next one starts.
pub struct Store {
    storage: LocalStore,
    data: Mutex<AppData>,
    state_tx: watch::Sender<AppData>,
    theme_tx: watch::Sender<Theme>,
}

impl Store {
    pub fn new(storage: LocalStore, data: AppData) -> Self {
        let theme = Theme::from_dark(data.dark_mode);
        let (state_tx, _) = watch::channel(data.clone());
        let (theme_tx, _) = watch::channel(theme);
        Self {
            storage,
            data: Mutex::new(data),
            state_tx,
            theme_tx,
        }
    }

    pub async fn dispatch(&self, action: Action) -> AppData {
        let name = action.name();
        let mut data = self.data.lock().await;
        let effects = reduce(&mut data, action);
        debug!(action = name, coins = data.coins, "applied action");

        for effect in effects {
            match effect {
                Effect::Persist => {
                    if let Err(err) = persist_app_data(&self.storage, &data).await {
                        error!("failed to persist app state: {err}");
                    }
                }
                Effect::ApplyTheme { dark } => {
                    let theme = Theme::from_dark(dark);
                    self.theme_tx.send_if_modified(|current| {
                        if *current == theme {
                            return false;
                        }
                        info!(?theme, "theme changed");
                        *current = theme;
                        true
                    });
                }
            }
        }

        self.state_tx.send_replace(data.clone());
        data.clone()
    }

    pub async fn snapshot(&self) -> AppData {
        self.data.lock().await.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AppData> {
        self.state_tx.subscribe()
    }

    pub fn theme(&self) -> watch::Receiver<Theme> {
        self.theme_tx.subscribe()
    }
}
