use crate::config::GenAiConfig;
use crate::error::GenAiError;
use crate::prompt;
use crate::wire::{
    Content, ErrorEnvelope, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part,
};
use crate::{ImageTransformer, PersonaChat};
use async_trait::async_trait;
use persona_types::{ChatReply, EncodedImage, ImageError, Role};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Maximum characters of a chat message forwarded to the model.
pub const MAX_MESSAGE_CHARS: usize = 4000;

/// HTTP client for the hosted image- and text-generation models.
#[derive(Debug, Clone)]
pub struct GenAiClient {
    http: reqwest::Client,
    config: GenAiConfig,
}

impl GenAiClient {
    pub fn new(config: GenAiConfig) -> Result<Self, GenAiError> {
        if config.api_key.trim().is_empty() {
            return Err(GenAiError::Config(
                "API key is not configured. Set genai.api_key in config or the \
                 GEMINI_API_KEY environment variable."
                    .to_string(),
            ));
        }
        if config.timeout_secs == 0 {
            return Err(GenAiError::Config(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("persona-studio/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &GenAiConfig {
        &self.config
    }

    /// Sends one `generateContent` call and decodes the envelope.
    async fn generate(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GenAiError> {
        let url = self.config.endpoint(model);
        debug!(%model, "sending generateContent request");

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| match e.error.status {
                    Some(code) if !e.error.message.is_empty() => {
                        format!("{}: {}", code, e.error.message)
                    }
                    _ => e.error.message,
                })
                .unwrap_or_else(|_| body.chars().take(200).collect());
            warn!(%model, status = status.as_u16(), "generateContent failed");
            return Err(GenAiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| GenAiError::MalformedResponse(format!("invalid envelope: {}", e)))?;

        if let Some(reason) = parsed
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.clone())
        {
            return Err(GenAiError::Blocked(reason));
        }

        Ok(parsed)
    }
}

#[async_trait]
impl ImageTransformer for GenAiClient {
    async fn transform_image(
        &self,
        image: &EncodedImage,
        role: &Role,
    ) -> Result<EncodedImage, GenAiError> {
        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![
                Part::inline(&image.mime_type, &image.data),
                Part::text(prompt::transform_instruction(role)),
            ])],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_modalities: Some(vec!["TEXT".to_string(), "IMAGE".to_string()]),
                ..Default::default()
            }),
        };

        let response = self.generate(&self.config.image_model, &request).await?;

        let Some(data) = response.first_image() else {
            let finish = response
                .candidates
                .first()
                .and_then(|c| c.finish_reason.as_deref())
                .unwrap_or("none");
            warn!(role = %role, finish_reason = finish, "image model returned no image part");
            return Err(GenAiError::NoImage);
        };

        info!(
            role = %role,
            mime_type = %data.mime_type,
            base64_len = data.data.len(),
            "received transformed image"
        );

        let raw = EncodedImage {
            data: data.data.clone(),
            mime_type: data.mime_type.clone(),
        };
        let bytes = raw.decode().map_err(|e| {
            GenAiError::MalformedResponse(format!("image part is not usable: {}", e))
        })?;
        EncodedImage::from_bytes(&bytes, raw.mime_type).map_err(|e| match e {
            ImageError::UnsupportedType(mime) => {
                warn!(role = %role, mime_type = %mime, "image model returned an unsupported type");
                GenAiError::NoImage
            }
            other => GenAiError::MalformedResponse(format!("image part is not usable: {}", other)),
        })
    }
}

#[async_trait]
impl PersonaChat for GenAiClient {
    async fn chat(&self, role: &Role, message: &str) -> Result<ChatReply, GenAiError> {
        let message = message.trim();
        let chars = message.chars().count();
        if chars > MAX_MESSAGE_CHARS {
            return Err(GenAiError::MessageTooLong {
                chars,
                max: MAX_MESSAGE_CHARS,
            });
        }

        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![Part::text(message)])],
            system_instruction: Some(Content::system(prompt::system_instruction(role))),
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(prompt::reply_schema()),
                ..Default::default()
            }),
        };

        let response = self.generate(&self.config.text_model, &request).await?;
        let text = response.text();
        if text.trim().is_empty() {
            return Err(GenAiError::MalformedResponse(
                "model returned no text".to_string(),
            ));
        }

        let reply: ChatReply = serde_json::from_str(prompt::strip_code_fence(&text))
            .map_err(|e| GenAiError::MalformedResponse(format!("reply is not valid JSON: {}", e)))?;
        let reply = reply.normalized();

        if reply.response.is_empty() {
            return Err(GenAiError::MalformedResponse(
                "reply has an empty response".to_string(),
            ));
        }

        debug!(role = %role, language = %reply.language, "received chat reply");
        Ok(reply)
    }
}
