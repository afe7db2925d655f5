//! Configuration types for Bharat Guide.
//!
//! `AppConfig` represents `bharat.toml`. Every field has a default, so an
//! empty or missing file yields a working development configuration. The API
//! credential is deliberately absent: it is resolved from the environment by
//! the infra layer and never deserialized into these plain structs.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::llm::DEFAULT_MODEL;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub chat: ChatConfig,
}

/// HTTP boundary settings. Nothing here is visible to the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins; `"*"` allows any origin.
    pub cors_origins: Vec<String>,
    /// Directory of static assets served as a fallback, if it exists.
    pub web_dir: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            cors_origins: vec!["*".to_string()],
            web_dir: Some("static".to_string()),
        }
    }
}

/// Settings for the generative API client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    /// Backoff unit; retry `i` waits `2^i` units.
    pub backoff_unit_ms: u64,
    /// Allow one extra attempt after an upstream 5xx.
    pub retry_server_errors: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_secs: 60,
            max_retries: 3,
            backoff_unit_ms: 1_000,
            retry_server_errors: true,
        }
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff_unit(&self) -> Duration {
        Duration::from_millis(self.backoff_unit_ms)
    }
}

/// Conversation handling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub max_history: usize,
    pub max_message_length: usize,
    /// Sessions idle longer than this are dropped; 0 disables expiry.
    pub session_idle_timeout_secs: u64,
    pub sweep_interval_secs: u64,
    /// Optional persona template file replacing the built-in one.
    pub persona_path: Option<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_history: 10,
            max_message_length: 5_000,
            session_idle_timeout_secs: 3_600,
            sweep_interval_secs: 60,
            persona_path: None,
        }
    }
}

impl ChatConfig {
    pub fn session_idle_timeout(&self) -> Option<Duration> {
        (self.session_idle_timeout_secs > 0)
            .then(|| Duration::from_secs(self.session_idle_timeout_secs))
    }
}
