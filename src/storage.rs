use crate::actions::{Action, AppDataPatch};
use crate::models::AppData;
use crate::reducer::reduce;
use serde::{Serialize, de::DeserializeOwned};
use std::path::PathBuf;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, error};

pub const STATE_KEY: &str = "coton-noir-state";
pub const TIP_CACHE_KEY: &str = "coton-noir-tips";
pub const LAST_TIP_DATE_KEY: &str = "last-tip-date";
pub const LANGUAGE_KEY: &str = "language";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error on {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt value under {key}: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Key-value store of JSON documents, one file per key.
#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await.map_err(|source| StorageError::Io {
            key: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let bytes = match fs::read(self.path_for(key)).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StorageError::Io {
                    key: key.to_string(),
                    source,
                });
            }
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StorageError::Corrupt {
                key: key.to_string(),
                source,
            })
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let payload = serde_json::to_vec_pretty(value).map_err(|source| StorageError::Corrupt {
            key: key.to_string(),
            source,
        })?;
        fs::write(self.path_for(key), payload)
            .await
            .map_err(|source| StorageError::Io {
                key: key.to_string(),
                source,
            })?;
        debug!(key, "stored value");
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }
}

/// Hydrates the persisted snapshot over defaults. Never fails: a missing or
/// unreadable snapshot yields the default state.
pub async fn load_app_data(store: &LocalStore) -> AppData {
    let mut data = AppData::default();
    match store.get::<AppDataPatch>(STATE_KEY).await {
        Ok(Some(snapshot)) => {
            reduce(&mut data, Action::LoadState { snapshot });
        }
        Ok(None) => {}
        Err(err) => error!("failed to load app state: {err}"),
    }
    data
}

pub async fn persist_app_data(store: &LocalStore, data: &AppData) -> Result<(), StorageError> {
    store.set(STATE_KEY, data).await
}
