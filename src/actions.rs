use crate::models::{
    Challenge, DetailedHairProfile, HairProfile, HairSubtype, JournalEntry, Redeem,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Every state transition the store accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    AddCoins { amount: u64 },
    SpendCoins { amount: u64 },
    SetPremium { value: bool },
    SetBoxUnlocked { value: bool },
    ToggleDarkMode,
    JoinChallenge,
    AdvanceChallenge,
    UpdateHairProfile { profile: HairProfilePatch },
    UpdateDetailedHairProfile { profile: DetailedHairProfilePatch },
    AddJournalEntry { entry: JournalEntry },
    AddRedeem { redeem: Redeem },
    LoadState { snapshot: AppDataPatch },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddCoins { .. } => "ADD_COINS",
            Self::SpendCoins { .. } => "SPEND_COINS",
            Self::SetPremium { .. } => "SET_PREMIUM",
            Self::SetBoxUnlocked { .. } => "SET_BOX_UNLOCKED",
            Self::ToggleDarkMode => "TOGGLE_DARK_MODE",
            Self::JoinChallenge => "JOIN_CHALLENGE",
            Self::AdvanceChallenge => "ADVANCE_CHALLENGE",
            Self::UpdateHairProfile { .. } => "UPDATE_HAIR_PROFILE",
            Self::UpdateDetailedHairProfile { .. } => "UPDATE_DETAILED_HAIR_PROFILE",
            Self::AddJournalEntry { .. } => "ADD_JOURNAL_ENTRY",
            Self::AddRedeem { .. } => "ADD_REDEEM",
            Self::LoadState { .. } => "LOAD_STATE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct HairProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hair_type: Option<HairSubtype>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub needs: Option<BTreeSet<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objectives: Option<BTreeSet<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DetailedHairProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hair_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub porosity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problems: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub needs: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
}

/// Top-level fields of a persisted snapshot. Any field left out keeps its current
/// value; nested objects that are present replace the current ones wholesale.
/// The plan catalog is not part of the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AppDataPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coins: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub premium: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_unlocked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dark_mode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge: Option<Challenge>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hair_profile: Option<HairProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detailed_hair_profile: Option<DetailedHairProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub journal_entries: Option<Vec<JournalEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redeems: Option<Vec<Redeem>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_use_screaming_snake_tags() {
        let action: Action =
            serde_json::from_value(serde_json::json!({ "type": "ADD_COINS", "amount": 10 }))
                .unwrap();
        assert_eq!(action, Action::AddCoins { amount: 10 });
        assert_eq!(action.name(), "ADD_COINS");

        let action: Action =
            serde_json::from_value(serde_json::json!({ "type": "TOGGLE_DARK_MODE" })).unwrap();
        assert_eq!(action, Action::ToggleDarkMode);
    }

    #[test]
    fn snapshot_ignores_unknown_and_plan_fields() {
        let patch: AppDataPatch = serde_json::from_value(serde_json::json!({
            "coins": 50,
            "plans": [],
            "language": "fr"
        }))
        .unwrap();
        assert_eq!(patch.coins, Some(50));
        assert_eq!(patch.premium, None);
    }

    #[test]
    fn negative_amounts_are_rejected_at_the_boundary() {
        let result: Result<Action, _> =
            serde_json::from_value(serde_json::json!({ "type": "SPEND_COINS", "amount": -5 }));
        assert!(result.is_err());
    }
}
