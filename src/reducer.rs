use crate::actions::{Action, AppDataPatch, DetailedHairProfilePatch, HairProfilePatch};
use crate::models::{AppData, DetailedHairProfile, HairProfile, CHALLENGE_DAYS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Persist,
    ApplyTheme { dark: bool },
}

/// Applies one action in place. Transitions never fail: out-of-range amounts are
/// clamped instead of rejected.
pub fn reduce(state: &mut AppData, action: Action) -> Vec<Effect> {
    let mut effects = vec![Effect::Persist];

    match action {
        Action::AddCoins { amount } => {
            state.coins = state.coins.saturating_add(amount);
        }
        Action::SpendCoins { amount } => {
            state.coins = state.coins.saturating_sub(amount);
        }
        Action::SetPremium { value } => {
            state.premium = value;
        }
        Action::SetBoxUnlocked { value } => {
            state.box_unlocked = value;
        }
        Action::ToggleDarkMode => {
            state.dark_mode = !state.dark_mode;
            effects.push(Effect::ApplyTheme {
                dark: state.dark_mode,
            });
        }
        Action::JoinChallenge => {
            state.challenge.joined = true;
        }
        Action::AdvanceChallenge => {
            state.challenge.days = state.challenge.days.saturating_add(1).min(CHALLENGE_DAYS);
        }
        Action::UpdateHairProfile { profile } => {
            merge_hair_profile(&mut state.hair_profile, profile);
        }
        Action::UpdateDetailedHairProfile { profile } => {
            merge_detailed_profile(&mut state.detailed_hair_profile, profile);
        }
        Action::AddJournalEntry { entry } => {
            state.journal_entries.insert(0, entry);
        }
        Action::AddRedeem { redeem } => {
            state.redeems.insert(0, redeem);
        }
        Action::LoadState { snapshot } => {
            merge_snapshot(state, snapshot);
            effects.push(Effect::ApplyTheme {
                dark: state.dark_mode,
            });
        }
    }

    effects
}

fn merge_hair_profile(profile: &mut HairProfile, patch: HairProfilePatch) {
    if let Some(hair_type) = patch.hair_type {
        profile.hair_type = Some(hair_type);
    }
    if let Some(needs) = patch.needs {
        profile.needs = needs;
    }
    if let Some(objectives) = patch.objectives {
        profile.objectives = objectives;
    }
    if let Some(is_completed) = patch.is_completed {
        profile.is_completed = is_completed;
    }
}

fn merge_detailed_profile(profile: &mut DetailedHairProfile, patch: DetailedHairProfilePatch) {
    if let Some(hair_type) = patch.hair_type {
        profile.hair_type = hair_type;
    }
    if let Some(porosity) = patch.porosity {
        profile.porosity = porosity;
    }
    if let Some(objective) = patch.objective {
        profile.objective = objective;
    }
    if let Some(problems) = patch.problems {
        profile.problems = problems;
    }
    if let Some(needs) = patch.needs {
        profile.needs = needs;
    }
    if let Some(is_completed) = patch.is_completed {
        profile.is_completed = is_completed;
    }
}

// Shallow: nested objects in the snapshot replace, they are not merged further.
fn merge_snapshot(state: &mut AppData, snapshot: AppDataPatch) {
    if let Some(coins) = snapshot.coins {
        state.coins = coins;
    }
    if let Some(premium) = snapshot.premium {
        state.premium = premium;
    }
    if let Some(box_unlocked) = snapshot.box_unlocked {
        state.box_unlocked = box_unlocked;
    }
    if let Some(dark_mode) = snapshot.dark_mode {
        state.dark_mode = dark_mode;
    }
    if let Some(mut challenge) = snapshot.challenge {
        challenge.days = challenge.days.min(CHALLENGE_DAYS);
        state.challenge = challenge;
    }
    if let Some(hair_profile) = snapshot.hair_profile {
        state.hair_profile = hair_profile;
    }
    if let Some(detailed) = snapshot.detailed_hair_profile {
        state.detailed_hair_profile = detailed;
    }
    if let Some(entries) = snapshot.journal_entries {
        state.journal_entries = entries;
    }
    if let Some(redeems) = snapshot.redeems {
        state.redeems = redeems;
    }
}
