use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;

pub const STARTING_COINS: u64 = 100;
pub const CHALLENGE_DAYS: u8 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HairSubtype {
    #[serde(rename = "3C")]
    ThreeC,
    #[serde(rename = "4A")]
    FourA,
    #[serde(rename = "4B")]
    FourB,
    #[serde(rename = "4C")]
    FourC,
}

impl HairSubtype {
    pub const ALL: [HairSubtype; 4] = [Self::ThreeC, Self::FourA, Self::FourB, Self::FourC];

    /// Lenient parse used on free-text profile fields ("4c", " 4C ", "type 4c").
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|subtype| normalized.ends_with(subtype.code()))
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::ThreeC => "3C",
            Self::FourA => "4A",
            Self::FourB => "4B",
            Self::FourC => "4C",
        }
    }
}

// Unknown codes ("3A", "") decode as no subtype instead of failing the document.
fn lenient_subtype<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<HairSubtype>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(HairSubtype::parse))
}

impl fmt::Display for HairSubtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Challenge {
    pub joined: bool,
    #[serde(deserialize_with = "clamped_days")]
    pub days: u8,
}

fn clamped_days<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let days = i64::deserialize(deserializer)?;
    Ok(days.clamp(0, i64::from(CHALLENGE_DAYS)) as u8)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct HairProfile {
    #[serde(deserialize_with = "lenient_subtype")]
    pub hair_type: Option<HairSubtype>,
    pub needs: BTreeSet<String>,
    pub objectives: BTreeSet<String>,
    pub is_completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DetailedHairProfile {
    pub hair_type: String,
    pub porosity: String,
    pub objective: String,
    pub problems: Vec<String>,
    pub needs: Vec<String>,
    pub is_completed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Routine,
    Treatment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub title: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub note: String,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Redeem {
    pub partner_id: String,
    pub code: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: String,
    pub name: String,
    pub price_cents: u32,
    pub period: String,
    pub perks: Vec<String>,
}

pub fn plan_catalog() -> Vec<Plan> {
    let plan = |id: &str, name: &str, price_cents, period: &str, perks: &[&str]| Plan {
        id: id.to_string(),
        name: name.to_string(),
        price_cents,
        period: period.to_string(),
        perks: perks.iter().map(|perk| perk.to_string()).collect(),
    };

    vec![
        plan(
            "monthly",
            "Coton Noir Premium",
            499,
            "month",
            &["Conseils IA illimités", "Routine personnalisée", "Box découverte"],
        ),
        plan(
            "yearly",
            "Coton Noir Premium annuel",
            3999,
            "year",
            &[
                "Conseils IA illimités",
                "Routine personnalisée",
                "Box découverte",
                "2 mois offerts",
            ],
        ),
    ]
}

/// Full client state. Serialized as a single JSON document on every change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppData {
    pub coins: u64,
    pub premium: bool,
    pub box_unlocked: bool,
    pub dark_mode: bool,
    pub challenge: Challenge,
    pub hair_profile: HairProfile,
    pub detailed_hair_profile: DetailedHairProfile,
    pub journal_entries: Vec<JournalEntry>,
    pub redeems: Vec<Redeem>,
    pub plans: Vec<Plan>,
}

impl Default for AppData {
    fn default() -> Self {
        Self {
            coins: STARTING_COINS,
            premium: false,
            box_unlocked: false,
            dark_mode: false,
            challenge: Challenge::default(),
            hair_profile: HairProfile::default(),
            detailed_hair_profile: DetailedHairProfile::default(),
            journal_entries: Vec::new(),
            redeems: Vec::new(),
            plans: plan_catalog(),
        }
    }
}
