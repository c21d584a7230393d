//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.warelay/config.json`) and environment.
//! Secrets are usually supplied through the environment (or a `.env` file loaded by the CLI);
//! env values override the file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// WhatsApp Business Cloud API settings (webhook verify token, send credentials).
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,

    /// Completion provider settings (OpenAI-compatible chat completions).
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Settings for the shared outbound HTTP clients.
    #[serde(default)]
    pub clients: ClientsConfig,
}

/// Gateway bind and port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Port for HTTP (default 8000).
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
}

fn default_gateway_port() -> u16 {
    8000
}

fn default_gateway_bind() -> String {
    "127.0.0.1".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
        }
    }
}

/// WhatsApp channel config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatsAppConfig {
    /// Shared secret for the `hub.verify_token` handshake. Overridden by VERIFY_TOKEN env.
    pub verify_token: Option<String>,
    /// Bearer token for the Graph API. Overridden by WHATSAPP_TOKEN env.
    pub access_token: Option<String>,
    /// Business phone number id used in the send endpoint. Overridden by WHATSAPP_PHONE_NUMBER_ID env.
    pub phone_number_id: Option<String>,
    /// Graph API root (default "https://graph.facebook.com").
    #[serde(default = "default_graph_api_base")]
    pub graph_api_base: String,
    /// Graph API version segment (default "v18.0").
    #[serde(default = "default_graph_api_version")]
    pub graph_api_version: String,
}

fn default_graph_api_base() -> String {
    "https://graph.facebook.com".to_string()
}

fn default_graph_api_version() -> String {
    "v18.0".to_string()
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            verify_token: None,
            access_token: None,
            phone_number_id: None,
            graph_api_base: default_graph_api_base(),
            graph_api_version: default_graph_api_version(),
        }
    }
}

/// Completion provider config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionConfig {
    /// API key. Overridden by OPENAI_API_KEY env. When absent the responder always answers with its fallback.
    pub api_key: Option<String>,
    /// OpenAI-compatible base URL including the version segment (default "https://api.openai.com/v1").
    #[serde(default = "default_completion_base_url")]
    pub base_url: String,
    /// Model id (default "gpt-3.5-turbo").
    #[serde(default = "default_completion_model")]
    pub model: String,
    /// System instruction sent before the user message.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

fn default_completion_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_completion_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_system_prompt() -> String {
    "You are a helpful assistant.".to_string()
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_completion_base_url(),
            model: default_completion_model(),
            system_prompt: default_system_prompt(),
        }
    }
}

/// Outbound client settings, applied to both the completion and the Graph API client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientsConfig {
    /// Whole-request deadline in seconds. Unset means no deadline beyond the connect timeout.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    /// TCP connect timeout in seconds (default 10).
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// User-Agent header for outbound calls.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("warelay/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for ClientsConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: None,
            connect_timeout_secs: default_connect_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl ClientsConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|s| *s > 0)
            .map(Duration::from_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs.max(1))
    }
}

/// Env value with surrounding whitespace removed; empty counts as unset.
fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

/// Prefer the env value, then the trimmed, non-empty config value.
fn resolve_secret(env_key: &str, configured: Option<&String>) -> Option<String> {
    env_non_empty(env_key).or_else(|| {
        configured
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

/// Resolve the webhook verify token: env VERIFY_TOKEN overrides config.
pub fn resolve_verify_token(config: &Config) -> Option<String> {
    resolve_secret("VERIFY_TOKEN", config.whatsapp.verify_token.as_ref())
}

/// Resolve the Graph API bearer token: env WHATSAPP_TOKEN overrides config.
pub fn resolve_whatsapp_token(config: &Config) -> Option<String> {
    resolve_secret("WHATSAPP_TOKEN", config.whatsapp.access_token.as_ref())
}

/// Resolve the business phone number id: env WHATSAPP_PHONE_NUMBER_ID overrides config.
pub fn resolve_phone_number_id(config: &Config) -> Option<String> {
    resolve_secret(
        "WHATSAPP_PHONE_NUMBER_ID",
        config.whatsapp.phone_number_id.as_ref(),
    )
}

/// Resolve the completion API key: env OPENAI_API_KEY overrides config.
pub fn resolve_completion_api_key(config: &Config) -> Option<String> {
    resolve_secret("OPENAI_API_KEY", config.completion.api_key.as_ref())
}

/// Fold env overrides into the config so later stages read a single source.
pub fn apply_env_overrides(config: &mut Config) {
    config.whatsapp.verify_token = resolve_verify_token(config);
    config.whatsapp.access_token = resolve_whatsapp_token(config);
    config.whatsapp.phone_number_id = resolve_phone_number_id(config);
    config.completion.api_key = resolve_completion_api_key(config);
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("WARELAY_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".warelay").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path, or the default path (WARELAY_CONFIG_PATH or ~/.warelay/config.json).
/// Missing file => default config. Env overrides are applied before returning.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let mut config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    apply_env_overrides(&mut config);
    Ok((config, path))
}
