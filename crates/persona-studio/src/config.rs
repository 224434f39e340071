//! Studio configuration loading from file and environment variables.

use persona_genai::GenAiConfig;
use persona_voice::SpeechConfig;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level studio configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudioConfig {
    /// Hosted generative API settings.
    #[serde(default)]
    pub genai: GenAiConfig,

    /// On-device speech output.
    #[serde(default)]
    pub speech: SpeechConfig,

    /// Avatar-video proxy.
    #[serde(default)]
    pub proxy: ProxyConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the avatar-video proxy lives and how long to wait for renders.
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyConfig {
    /// Base URL of `persona-server`.
    #[serde(default = "default_proxy_url")]
    pub url: String,

    /// Delay between status polls while a video renders.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Status polls before giving up on a render.
    #[serde(default = "default_max_polls")]
    pub max_polls: u32,

    /// Request timeout in seconds.
    #[serde(default = "default_proxy_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "warn", "persona_studio=debug,warn").
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_proxy_url() -> String {
    "http://127.0.0.1:3001".to_string()
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_max_polls() -> u32 {
    60
}

fn default_proxy_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            url: default_proxy_url(),
            poll_interval_ms: default_poll_interval_ms(),
            max_polls: default_max_polls(),
            timeout_secs: default_proxy_timeout_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `GEMINI_API_KEY` overrides `genai.api_key`
/// - `GEMINI_BASE_URL` overrides `genai.base_url`
/// - `PERSONA_PROXY_URL` overrides `proxy.url`
/// - `PERSONA_LOG_LEVEL` overrides `logging.level`
/// - `PERSONA_SPEECH` overrides `speech.enabled` ("true"/"1" or "false"/"0")
/// - `ESPEAK_BINARY` overrides `speech.binary`
pub fn load_config(path: Option<&str>) -> Result<StudioConfig, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = p, "config file not found, using defaults");
                StudioConfig::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => StudioConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Applies environment overrides read through `lookup`.
pub fn apply_env_overrides(config: &mut StudioConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(key) = lookup("GEMINI_API_KEY") {
        config.genai.api_key = key;
    }
    if let Some(url) = lookup("GEMINI_BASE_URL") {
        config.genai.base_url = url;
    }
    if let Some(url) = lookup("PERSONA_PROXY_URL") {
        config.proxy.url = url;
    }
    if let Some(level) = lookup("PERSONA_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(speech) = lookup("PERSONA_SPEECH") {
        match speech.as_str() {
            "true" | "1" => config.speech.enabled = true,
            "false" | "0" => config.speech.enabled = false,
            other => tracing::warn!(value = other, "ignoring unrecognised PERSONA_SPEECH"),
        }
    }
    if let Some(binary) = lookup("ESPEAK_BINARY") {
        config.speech.binary = PathBuf::from(binary);
    }
}
