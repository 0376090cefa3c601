use crate::functions;
use crate::handlers;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/state", get(handlers::get_state))
        .route("/api/theme", get(handlers::get_theme))
        .route("/api/actions", post(handlers::dispatch))
        .route("/api/tips", get(handlers::get_tips))
        .route("/api/tips/generate", post(handlers::generate_tip))
        .route("/api/tips/daily", post(handlers::daily_tip))
        .route("/api/journal", get(handlers::get_journal))
        .route("/api/journal/refresh", post(handlers::refresh_journal))
        .route("/hooks/journal", post(handlers::journal_webhook))
        .route(
            "/api/preferences/language",
            get(handlers::get_language).put(handlers::put_language),
        )
        .nest("/functions/v1", functions::router(state.functions.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
