//! The three AI functions (`generate-hair-tips`, `generate-personalized-routine`,
//! `generate-realtime-tips`).
//!
//! Each handler is stateless per request: it builds a prompt from the caller's
//! hair profile, asks the completion API, strictly decodes the reply and answers with
//! a deterministic fallback on any failure. No path returns an error without a usable
//! body.

pub mod completion;
pub mod decode;
pub mod hair_tips;
pub mod realtime;
pub mod routine;

use crate::config::FallbackStatus;
use axum::{
    Json, Router,
    extract::rejection::JsonRejection,
    http::{HeaderName, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use completion::{ChatClient, CompletionError};
use decode::DecodeError;
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};

#[derive(Debug, Error)]
pub enum FunctionError {
    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error("malformed completion: {0}")]
    Decode(#[from] DecodeError),

    #[error("invalid request body: {0}")]
    InvalidRequest(String),
}

impl From<JsonRejection> for FunctionError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

#[derive(Clone)]
pub struct FunctionsState {
    pub chat: ChatClient,
    pub fallback_status: FallbackStatus,
}

impl FunctionsState {
    pub fn new(chat: ChatClient, fallback_status: FallbackStatus) -> Self {
        Self {
            chat,
            fallback_status,
        }
    }

    fn fallback_status_code(&self, legacy: StatusCode) -> StatusCode {
        match self.fallback_status {
            FallbackStatus::Legacy => legacy,
            FallbackStatus::AlwaysOk => StatusCode::OK,
        }
    }
}

pub fn router<S>(state: FunctionsState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/generate-hair-tips", post(hair_tips::handler))
        .route("/generate-personalized-routine", post(routine::handler))
        .route("/generate-realtime-tips", post(realtime::handler))
        .layer(cors_layer())
        .with_state(state)
}

/// Fully open CORS; preflight requests get an empty 200.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
        ])
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    (status, Json(body)).into_response()
}

fn is_false(value: &bool) -> bool {
    !*value
}
