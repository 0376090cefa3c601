use crate::actions::Action;
use crate::errors::AppError;
use crate::journal::{JournalView, WebhookPayload};
use crate::models::AppData;
use crate::state::AppState;
use crate::store::Theme;
use crate::storage::LANGUAGE_KEY;
use crate::tips::{TipState, TipType};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateTipRequest {
    pub tip_type: TipType,
    #[serde(default)]
    pub context: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Fr,
    En,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LanguagePreference {
    pub language: Language,
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn get_state(State(state): State<AppState>) -> Json<AppData> {
    Json(state.store.snapshot().await)
}

#[derive(Debug, Serialize)]
pub struct ThemeView {
    pub theme: Theme,
}

pub async fn get_theme(State(state): State<AppState>) -> Json<ThemeView> {
    let theme = *state.store.theme().borrow();
    Json(ThemeView { theme })
}

pub async fn dispatch(
    State(state): State<AppState>,
    payload: Result<Json<Action>, JsonRejection>,
) -> Result<Json<AppData>, AppError> {
    let Json(action) = payload?;
    Ok(Json(state.store.dispatch(action).await))
}

pub async fn get_tips(State(state): State<AppState>) -> Json<TipState> {
    Json(state.tips.state())
}

pub async fn generate_tip(
    State(state): State<AppState>,
    payload: Result<Json<GenerateTipRequest>, JsonRejection>,
) -> Result<Json<TipState>, AppError> {
    let Json(request) = payload?;
    let profile = state.store.snapshot().await.detailed_hair_profile;

    state
        .tips
        .generate(&profile, request.tip_type, request.context)
        .await
        .ok_or_else(|| AppError::conflict("a tip is already being generated"))?;
    Ok(Json(state.tips.state()))
}

pub async fn daily_tip(State(state): State<AppState>) -> Json<TipState> {
    let profile = state.store.snapshot().await.detailed_hair_profile;
    let today = Utc::now().date_naive();
    if state.tips.ensure_daily_tip(&profile, today).await.is_none() {
        debug!("no daily tip produced");
    }
    Json(state.tips.state())
}

pub async fn get_journal(State(state): State<AppState>) -> Json<JournalView> {
    Json(state.journal.view())
}

pub async fn refresh_journal(State(state): State<AppState>) -> StatusCode {
    state.journal.refresh();
    StatusCode::ACCEPTED
}

pub async fn journal_webhook(
    State(state): State<AppState>,
    payload: Result<Json<WebhookPayload>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Json(payload) = payload?;
    match payload.into_change() {
        Some(change) => {
            info!(user_id = %change.user_id, kind = ?change.kind, "journal webhook");
            state.journal_feed.publish(change);
        }
        None => debug!("ignored journal webhook"),
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_language(State(state): State<AppState>) -> Json<LanguagePreference> {
    let language = match state.storage.get::<Language>(LANGUAGE_KEY).await {
        Ok(language) => language.unwrap_or_default(),
        Err(err) => {
            error!("failed to load language preference: {err}");
            Language::default()
        }
    };
    Json(LanguagePreference { language })
}

pub async fn put_language(
    State(state): State<AppState>,
    payload: Result<Json<LanguagePreference>, JsonRejection>,
) -> Result<Json<LanguagePreference>, AppError> {
    let Json(preference) = payload?;
    state.storage.set(LANGUAGE_KEY, &preference.language).await?;
    Ok(Json(preference))
}
