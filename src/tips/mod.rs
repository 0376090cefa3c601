//! Hair tips: the generator used by the app, its bounded cache, the static
//! fallback table and the sources a tip can come from.

pub mod cache;
pub mod fallback;
pub mod generator;
pub mod source;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use cache::TipCache;
pub use generator::{TipGenerator, TipState};
pub use source::{
    FunctionsClient, InProcessTips, TipBackend, TipError, TipReply, TipRequest, TipSource,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TipType {
    Routine,
    General,
    Product,
    Seasonal,
    Styling,
}

impl TipType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Routine => "routine",
            Self::General => "general",
            Self::Product => "product",
            Self::Seasonal => "seasonal",
            Self::Styling => "styling",
        }
    }
}

impl fmt::Display for TipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HairTip {
    pub tip: String,
    pub tip_type: TipType,
    pub timestamp: DateTime<Utc>,
}
