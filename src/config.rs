//! Runtime configuration loaded from environment variables.
//!
//! - `PORT` - listen port (default: 8080)
//! - `APP_DATA_DIR` - directory of the local key-value store (default: `data`)
//! - `OPENAI_API_KEY` - chat-completion credential; without it every function answers
//!   with its fallback payload
//! - `OPENAI_BASE_URL` - chat-completion API base (default: `https://api.openai.com/v1`)
//! - `OPENAI_MODEL` - model name (default: `gpt-4o-mini`)
//! - `COTON_FUNCTIONS_URL` - remote functions base; unset means tips are generated in-process
//! - `SUPABASE_URL`, `SUPABASE_ANON_KEY` - remote journal table
//! - `COTON_USER_ID` - user whose journal is watched
//! - `COTON_FALLBACK_STATUS` - `legacy` (default) or `ok`

use secrecy::SecretString;
use std::{env, fmt, path::PathBuf};
use thiserror::Error;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// How fallback payloads are reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackStatus {
    /// `generate-hair-tips` and upstream failures of `generate-personalized-routine`
    /// answer 500; `generate-realtime-tips` answers 200.
    #[default]
    Legacy,
    /// Every fallback answers 200; `degraded: true` in the body marks it.
    AlwaysOk,
}

#[derive(Clone, Default)]
pub struct CompletionConfig {
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub model: String,
}

impl fmt::Debug for CompletionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

#[derive(Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: SecretString,
}

impl fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("anon_key", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_dir: PathBuf,
    pub completion: CompletionConfig,
    pub functions_url: Option<String>,
    pub supabase: Option<SupabaseConfig>,
    pub user_id: Option<String>,
    pub fallback_status: FallbackStatus,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match optional("PORT") {
            Some(value) => value
                .parse::<u16>()
                .map_err(|err| ConfigError::InvalidEnvVar("PORT".to_string(), err.to_string()))?,
            None => 8080,
        };

        let fallback_status = match optional("COTON_FALLBACK_STATUS").as_deref() {
            None | Some("legacy") => FallbackStatus::Legacy,
            Some("ok") => FallbackStatus::AlwaysOk,
            Some(other) => {
                return Err(ConfigError::InvalidEnvVar(
                    "COTON_FALLBACK_STATUS".to_string(),
                    format!("expected 'legacy' or 'ok', got '{other}'"),
                ));
            }
        };

        let supabase = match (optional("SUPABASE_URL"), optional("SUPABASE_ANON_KEY")) {
            (Some(url), Some(anon_key)) => Some(SupabaseConfig {
                url: url.trim_end_matches('/').to_string(),
                anon_key: SecretString::from(anon_key),
            }),
            (None, None) => None,
            _ => {
                return Err(ConfigError::InvalidEnvVar(
                    "SUPABASE_URL".to_string(),
                    "SUPABASE_URL and SUPABASE_ANON_KEY must be set together".to_string(),
                ));
            }
        };

        Ok(Self {
            port,
            data_dir: optional("APP_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data")),
            completion: CompletionConfig {
                api_key: optional("OPENAI_API_KEY").map(SecretString::from),
                base_url: optional("OPENAI_BASE_URL")
                    .map(|url| url.trim_end_matches('/').to_string())
                    .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
                model: optional("OPENAI_MODEL")
                    .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            },
            functions_url: optional("COTON_FUNCTIONS_URL")
                .map(|url| url.trim_end_matches('/').to_string()),
            supabase,
            user_id: optional("COTON_USER_ID"),
            fallback_status,
        })
    }
}

// Empty values count as unset.
fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}
