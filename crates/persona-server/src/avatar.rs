//! Client for the upstream talking-avatar API.
//!
//! A talk is created with `POST {api_url}/talks` and rendered
//! asynchronously; its status (and, once done, the video URL) is read back
//! with `GET {api_url}/talks/{id}`. Responses are passed through untouched.

use crate::config::AvatarConfig;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Maximum upstream response body accepted (1 MiB).
const MAX_UPSTREAM_BODY_BYTES: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum AvatarError {
    #[error("avatar API is not configured: {0}")]
    Config(String),

    #[error("avatar API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("avatar API returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("avatar API returned an invalid body: {0}")]
    InvalidBody(String),
}

#[derive(Debug, Serialize)]
struct CreateTalk<'a> {
    source_url: &'a str,
    script: Script<'a>,
}

#[derive(Debug, Serialize)]
struct Script<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    input: &'a str,
    provider: Provider<'a>,
}

#[derive(Debug, Serialize)]
struct Provider<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    voice_id: &'a str,
}

#[derive(Debug, Clone)]
pub struct AvatarClient {
    http: reqwest::Client,
    config: AvatarConfig,
}

impl AvatarClient {
    pub fn new(config: AvatarConfig) -> Result<Self, AvatarError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;
        Ok(Self { http, config })
    }

    pub fn is_configured(&self) -> bool {
        !self.config.api_key.trim().is_empty()
    }

    fn talks_url(&self) -> String {
        format!("{}/talks", self.config.api_url.trim_end_matches('/'))
    }

    fn authorization(&self) -> Result<String, AvatarError> {
        if !self.is_configured() {
            return Err(AvatarError::Config(
                "API key is missing. Set avatar.api_key in config or the \
                 AVATAR_API_KEY environment variable."
                    .to_string(),
            ));
        }
        Ok(format!("Basic {}", self.config.api_key.trim()))
    }

    /// Starts rendering a talking-avatar video of `text` spoken with `voice_id`.
    pub async fn create_talk(&self, text: &str, voice_id: &str) -> Result<Value, AvatarError> {
        let body = CreateTalk {
            source_url: &self.config.source_url,
            script: Script {
                kind: "text",
                input: text,
                provider: Provider {
                    kind: "microsoft",
                    voice_id,
                },
            },
        };

        let response = self
            .http
            .post(self.talks_url())
            .header(reqwest::header::AUTHORIZATION, self.authorization()?)
            .json(&body)
            .send()
            .await?;

        Self::read_json(response).await
    }

    /// Reads the status of a previously created talk.
    pub async fn get_talk(&self, id: &str) -> Result<Value, AvatarError> {
        let response = self
            .http
            .get(format!("{}/{}", self.talks_url(), id))
            .header(reqwest::header::AUTHORIZATION, self.authorization()?)
            .send()
            .await?;

        Self::read_json(response).await
    }

    async fn read_json(response: reqwest::Response) -> Result<Value, AvatarError> {
        let status = response.status();
        let bytes = response.bytes().await?;
        if bytes.len() > MAX_UPSTREAM_BODY_BYTES {
            return Err(AvatarError::InvalidBody(format!(
                "body exceeds {} bytes",
                MAX_UPSTREAM_BODY_BYTES
            )));
        }

        if !status.is_success() {
            return Err(AvatarError::Upstream {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).chars().take(500).collect(),
            });
        }

        serde_json::from_slice(&bytes).map_err(|e| AvatarError::InvalidBody(e.to_string()))
    }
}
