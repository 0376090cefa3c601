use super::{HairTip, TipType};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const RETENTION_DAYS: u64 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct CacheKey {
    date: NaiveDate,
    tip_type: TipType,
}

/// Generated tips, one per (tip type, day). A newer tip for the same slot replaces
/// the older one and days outside the retention window are evicted on insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TipCache {
    entries: BTreeMap<CacheKey, HairTip>,
}

impl TipCache {
    pub fn insert(&mut self, tip: HairTip) {
        let key = CacheKey {
            date: tip.timestamp.date_naive(),
            tip_type: tip.tip_type,
        };
        let newer = self
            .entries
            .get(&key)
            .is_none_or(|existing| existing.timestamp <= tip.timestamp);
        if newer {
            self.entries.insert(key, tip);
        }

        if let Some(newest) = self.entries.keys().next_back().map(|key| key.date) {
            self.evict_before(newest.checked_sub_days(Days::new(RETENTION_DAYS - 1)));
        }
    }

    fn evict_before(&mut self, cutoff: Option<NaiveDate>) {
        if let Some(cutoff) = cutoff {
            self.entries.retain(|key, _| key.date >= cutoff);
        }
    }

    pub fn get(&self, tip_type: TipType, date: NaiveDate) -> Option<&HairTip> {
        self.entries.get(&CacheKey { date, tip_type })
    }

    /// Most recently generated tip of the given day, any type.
    pub fn latest_on(&self, date: NaiveDate) -> Option<&HairTip> {
        self.entries
            .iter()
            .filter(|(key, _)| key.date == date)
            .map(|(_, tip)| tip)
            .max_by_key(|tip| tip.timestamp)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for TipCache {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries.values())
    }
}

impl<'de> Deserialize<'de> for TipCache {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tips = Vec::<HairTip>::deserialize(deserializer)?;
        let mut cache = TipCache::default();
        for tip in tips {
            cache.insert(tip);
        }
        Ok(cache)
    }
}
