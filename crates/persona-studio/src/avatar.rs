//! Client for the `persona-server` avatar-video proxy.

use crate::config::ProxyConfig;
use persona_types::{Role, TalkRequest};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("invalid avatar proxy configuration: {0}")]
    Config(String),

    #[error("avatar proxy request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("avatar proxy returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("avatar render {id} failed with status \"{status}\"")]
    RenderFailed { id: String, status: String },

    #[error("avatar render {id} not ready after {polls} polls")]
    Timeout { id: String, polls: u32 },

    #[error("avatar render {0} finished without a video URL")]
    MissingVideo(String),
}

/// A talk as reported by the avatar API.
///
/// Only the fields the studio reads are modelled; the rest of the upstream
/// payload is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Talk {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub result_url: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

pub struct AvatarProxyClient {
    http: reqwest::Client,
    config: ProxyConfig,
}

impl AvatarProxyClient {
    pub fn new(config: ProxyConfig) -> Result<Self, ProxyError> {
        if config.timeout_secs == 0 {
            return Err(ProxyError::Config(
                "proxy.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if config.max_polls == 0 {
            return Err(ProxyError::Config(
                "proxy.max_polls must be greater than zero".to_string(),
            ));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.url.trim_end_matches('/'), path)
    }

    /// Starts rendering `text` spoken by `role`.
    pub async fn talk(&self, text: &str, role: &Role) -> Result<Talk, ProxyError> {
        let body = TalkRequest {
            text: text.to_string(),
            role: role.to_string(),
        };
        let response = self
            .http
            .post(self.url("/api/talk"))
            .json(&body)
            .send()
            .await?;
        read_talk(response).await
    }

    pub async fn status(&self, id: &str) -> Result<Talk, ProxyError> {
        let response = self
            .http
            .get(self.url(&format!("/api/talk/{}", id)))
            .send()
            .await?;
        read_talk(response).await
    }

    /// Polls a talk until its video is ready and returns the video URL.
    pub async fn wait_for_video(&self, id: &str) -> Result<String, ProxyError> {
        let interval = Duration::from_millis(self.config.poll_interval_ms);

        for poll in 1..=self.config.max_polls {
            let talk = self.status(id).await?;
            match talk.status.as_deref() {
                Some("done") => {
                    return talk
                        .result_url
                        .ok_or_else(|| ProxyError::MissingVideo(id.to_string()));
                }
                Some(status @ ("error" | "rejected")) => {
                    return Err(ProxyError::RenderFailed {
                        id: id.to_string(),
                        status: status.to_string(),
                    });
                }
                status => {
                    tracing::debug!(id, poll, status = status.unwrap_or("unknown"), "video not ready");
                }
            }
            if poll < self.config.max_polls {
                tokio::time::sleep(interval).await;
            }
        }

        Err(ProxyError::Timeout {
            id: id.to_string(),
            polls: self.config.max_polls,
        })
    }
}

async fn read_talk(response: reqwest::Response) -> Result<Talk, ProxyError> {
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error)
            .unwrap_or(text);
        return Err(ProxyError::Status {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response.json().await?)
}
