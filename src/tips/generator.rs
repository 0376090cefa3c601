use super::cache::TipCache;
use super::fallback::fallback_tip;
use super::source::{TipRequest, TipSource};
use super::{HairTip, TipType};
use crate::models::DetailedHairProfile;
use crate::storage::{LAST_TIP_DATE_KEY, LocalStore, TIP_CACHE_KEY};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, watch};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TipState {
    pub current: Option<HairTip>,
    pub loading: bool,
    pub error: Option<String>,
}

pub struct TipGenerator<S> {
    source: S,
    storage: LocalStore,
    cache: Mutex<TipCache>,
    in_flight: AtomicBool,
    state_tx: watch::Sender<TipState>,
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<S: TipSource> TipGenerator<S> {
    /// Builds a generator around the tip cache persisted in `storage`.
    pub async fn load(source: S, storage: LocalStore) -> Self {
        let cache = match storage.get::<TipCache>(TIP_CACHE_KEY).await {
            Ok(cache) => cache.unwrap_or_default(),
            Err(err) => {
                error!("failed to load tip cache: {err}");
                TipCache::default()
            }
        };
        let (state_tx, _) = watch::channel(TipState::default());

        Self {
            source,
            storage,
            cache: Mutex::new(cache),
            in_flight: AtomicBool::new(false),
            state_tx,
        }
    }

    pub fn state(&self) -> TipState {
        self.state_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TipState> {
        self.state_tx.subscribe()
    }

    pub async fn cache(&self) -> TipCache {
        self.cache.lock().await.clone()
    }

    /// Generates a tip for `profile`. Returns `None` without calling the source when
    /// another generation is still running. Failures produce a fallback tip from
    /// the static table and record the error.
    pub async fn generate(
        &self,
        profile: &DetailedHairProfile,
        tip_type: TipType,
        context: Option<String>,
    ) -> Option<HairTip> {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            debug!(%tip_type, "tip generation already in flight, dropping call");
            return None;
        }
        let _guard = InFlight(&self.in_flight);

        self.state_tx.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });

        let request = TipRequest {
            hair_profile: profile.clone(),
            tip_type,
            context,
        };

        let (tip, error) = match self.source.fetch_tip(&request).await {
            Ok(reply) => {
                let tip = HairTip {
                    tip: reply.tip,
                    tip_type,
                    timestamp: reply.timestamp,
                };
                self.remember(tip.clone()).await;
                info!(%tip_type, "tip generated");
                (tip, None)
            }
            Err(err) => {
                warn!(%tip_type, hair_type = %profile.hair_type, "using fallback tip: {err}");
                let tip = HairTip {
                    tip: fallback_tip(&profile.hair_type, tip_type).to_string(),
                    tip_type,
                    timestamp: Utc::now(),
                };
                (tip, Some(err.to_string()))
            }
        };

        self.state_tx.send_modify(|state| {
            state.current = Some(tip.clone());
            state.loading = false;
            state.error = error;
        });
        Some(tip)
    }

    /// Produces the tip of the day once the detailed profile is complete. The first
    /// call of a day generates a `general` tip; later calls adopt the newest tip
    /// cached today.
    pub async fn ensure_daily_tip(
        &self,
        profile: &DetailedHairProfile,
        today: NaiveDate,
    ) -> Option<HairTip> {
        if !profile.is_completed || self.state_tx.borrow().current.is_some() {
            return None;
        }

        let marker = match self.storage.get::<NaiveDate>(LAST_TIP_DATE_KEY).await {
            Ok(marker) => marker,
            Err(err) => {
                warn!("ignoring unreadable tip date marker: {err}");
                None
            }
        };

        if marker != Some(today) {
            let tip = self.generate(profile, TipType::General, None).await?;
            if let Err(err) = self.storage.set(LAST_TIP_DATE_KEY, &today).await {
                error!("failed to store tip date marker: {err}");
            }
            return Some(tip);
        }

        let cached = self.cache.lock().await.latest_on(today).cloned()?;
        debug!(tip_type = %cached.tip_type, "adopting cached tip of the day");
        self.state_tx.send_modify(|state| {
            state.current = Some(cached.clone());
            state.error = None;
        });
        Some(cached)
    }

    async fn remember(&self, tip: HairTip) {
        let mut cache = self.cache.lock().await;
        cache.insert(tip);
        if let Err(err) = self.storage.set(TIP_CACHE_KEY, &*cache).await {
            error!("failed to persist tip cache: {err}");
        }
    }
}
