//! Server configuration loading from file and environment variables.

use serde::Deserialize;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream talking-avatar API settings.
    #[serde(default)]
    pub avatar: AvatarConfig,

    /// Request limits.
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Upstream talking-avatar API.
#[derive(Clone, Deserialize)]
pub struct AvatarConfig {
    /// Base URL of the API; `/talks` is appended.
    #[serde(default = "default_avatar_api_url")]
    pub api_url: String,

    /// Credential sent as `Authorization: Basic <api_key>`.
    #[serde(default)]
    pub api_key: String,

    /// Presenter image the avatar is animated from.
    #[serde(default = "default_source_url")]
    pub source_url: String,

    /// Upstream request timeout in seconds.
    #[serde(default = "default_avatar_timeout_secs")]
    pub timeout_secs: u64,
}

/// Per-client request limits.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Requests per minute per client IP on `/api/*`.
    #[serde(default = "default_talk_per_minute")]
    pub talk_per_minute: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "persona_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3001
}

fn default_avatar_api_url() -> String {
    "https://api.d-id.com".to_string()
}

fn default_source_url() -> String {
    "https://d-id-public-bucket.s3.us-west-2.amazonaws.com/alice.jpg".to_string()
}

fn default_avatar_timeout_secs() -> u64 {
    30
}

fn default_talk_per_minute() -> u32 {
    20
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            api_url: default_avatar_api_url(),
            api_key: String::new(),
            source_url: default_source_url(),
            timeout_secs: default_avatar_timeout_secs(),
        }
    }
}

impl fmt::Debug for AvatarConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AvatarConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"[REDACTED]")
            .field("source_url", &self.source_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            talk_per_minute: default_talk_per_minute(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `PERSONA_HOST` overrides `server.host`
/// - `PERSONA_PORT` overrides `server.port`
/// - `PERSONA_LOG_LEVEL` overrides `logging.level`
/// - `PERSONA_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `AVATAR_API_URL` overrides `avatar.api_url`
/// - `AVATAR_API_KEY` overrides `avatar.api_key`
/// - `AVATAR_SOURCE_URL` overrides `avatar.source_url`
/// - `PERSONA_TALK_RATE_LIMIT` overrides `limits.talk_per_minute`
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Applies environment overrides read through `lookup`.
pub fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(host) = lookup("PERSONA_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Some(port) = lookup("PERSONA_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Some(level) = lookup("PERSONA_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = lookup("PERSONA_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Some(url) = lookup("AVATAR_API_URL") {
        config.avatar.api_url = url;
    }
    if let Some(key) = lookup("AVATAR_API_KEY") {
        config.avatar.api_key = key;
    }
    if let Some(url) = lookup("AVATAR_SOURCE_URL") {
        config.avatar.source_url = url;
    }
    if let Some(limit) = lookup("PERSONA_TALK_RATE_LIMIT") {
        if let Ok(parsed) = limit.parse() {
            config.limits.talk_per_minute = parsed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = load_config(path.to_str()).unwrap();
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.avatar.api_url, "https://api.d-id.com");
        assert_eq!(config.avatar.timeout_secs, 30);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\nport = 8080\n\n[avatar]\nsource_url = \"https://example.com/me.png\"\n\n[limits]\ntalk_per_minute = 5"
        )
        .unwrap();

        let config = load_config(file.path().to_str()).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, default_host());
        assert_eq!(config.avatar.source_url, "https://example.com/me.png");
        assert_eq!(config.limits.talk_per_minute, 5);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nport = ").unwrap();
        assert!(matches!(
            load_config(file.path().to_str()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn env_overrides_apply_and_ignore_garbage() {
        let env: HashMap<&str, &str> = [
            ("PERSONA_PORT", "not-a-port"),
            ("PERSONA_HOST", "0.0.0.0"),
            ("PERSONA_LOG_JSON", "1"),
            ("AVATAR_API_KEY", "secret"),
            ("PERSONA_TALK_RATE_LIMIT", "3"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        apply_env_overrides(&mut config, |k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.server.port, 3001);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert!(config.logging.json);
        assert_eq!(config.avatar.api_key, "secret");
        assert_eq!(config.limits.talk_per_minute, 3);
    }

    #[test]
    fn debug_redacts_api_key() {
        let mut config = AvatarConfig::default();
        config.api_key = "hunter2".to_string();
        assert!(!format!("{:?}", config).contains("hunter2"));
    }
}
