use crate::functions::FunctionError;
use crate::functions::completion::ChatClient;
use crate::functions::hair_tips;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub use crate::functions::hair_tips::{HairTipRequest as TipRequest, HairTipResponse as TipReply};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum TipError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("tip function returned {status}")]
    Status { status: u16 },

    #[error("tip function degraded: {0}")]
    Degraded(String),

    #[error("tip reply had no tip")]
    MissingTip,

    #[error(transparent)]
    Function(#[from] FunctionError),
}

/// Where generated tips come from.
pub trait TipSource: Send + Sync {
    fn fetch_tip(
        &self,
        request: &TipRequest,
    ) -> impl Future<Output = Result<TipReply, TipError>> + Send;
}

/// Calls a deployed `generate-hair-tips` function over HTTP.
#[derive(Clone)]
pub struct FunctionsClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl FunctionsClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<SecretString>,
    ) -> Result<Self, TipError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key,
        })
    }
}

impl TipSource for FunctionsClient {
    async fn fetch_tip(&self, request: &TipRequest) -> Result<TipReply, TipError> {
        let mut call = self
            .client
            .post(format!("{}/generate-hair-tips", self.base_url))
            .json(request);
        if let Some(key) = &self.api_key {
            call = call.bearer_auth(key.expose_secret());
        }

        let response = call.send().await?;
        let status = response.status();
        if !status.is_success() && status != StatusCode::INTERNAL_SERVER_ERROR {
            return Err(TipError::Status {
                status: status.as_u16(),
            });
        }

        // A 500 carrying a tip is a degraded success, not a transport failure.
        let reply: TipReply = response.json().await?;
        debug!(status = status.as_u16(), degraded = reply.degraded, "tip function replied");
        check_reply(reply)
    }
}

/// Runs the tip function in this process with the configured completion client.
#[derive(Clone)]
pub struct InProcessTips {
    chat: ChatClient,
}

impl InProcessTips {
    pub fn new(chat: ChatClient) -> Self {
        Self { chat }
    }
}

impl TipSource for InProcessTips {
    async fn fetch_tip(&self, request: &TipRequest) -> Result<TipReply, TipError> {
        let reply = hair_tips::generate(&self.chat, request).await?;
        check_reply(reply)
    }
}

#[derive(Clone)]
pub enum TipBackend {
    InProcess(InProcessTips),
    Remote(FunctionsClient),
}

impl TipSource for TipBackend {
    async fn fetch_tip(&self, request: &TipRequest) -> Result<TipReply, TipError> {
        match self {
            Self::InProcess(source) => source.fetch_tip(request).await,
            Self::Remote(source) => source.fetch_tip(request).await,
        }
    }
}

fn check_reply(reply: TipReply) -> Result<TipReply, TipError> {
    if reply.degraded {
        return Err(TipError::Degraded(
            reply.error.unwrap_or_else(|| "no detail".to_string()),
        ));
    }
    if reply.tip.trim().is_empty() {
        return Err(TipError::MissingTip);
    }
    Ok(reply)
}
