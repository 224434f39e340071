//! Client for the hosted generative services behind the persona studio.
//!
//! Two calls are made against a Gemini-style `generateContent` endpoint:
//! an image edit that turns the uploaded photo into the chosen role, and a
//! chat turn that answers in character with a structured
//! `{language, response}` payload. Both are exposed through small async
//! traits so the session logic can run against fakes.

pub mod client;
pub mod config;
pub mod error;
pub mod prompt;
pub mod wire;

pub use client::{GenAiClient, MAX_MESSAGE_CHARS};
pub use config::{GenAiConfig, DEFAULT_BASE_URL, DEFAULT_IMAGE_MODEL, DEFAULT_TEXT_MODEL};
pub use error::GenAiError;

use async_trait::async_trait;
use persona_types::{ChatReply, EncodedImage, Role};

/// Turns a photo into a role-themed avatar.
#[async_trait]
pub trait ImageTransformer: Send + Sync {
    async fn transform_image(
        &self,
        image: &EncodedImage,
        role: &Role,
    ) -> Result<EncodedImage, GenAiError>;
}

/// Answers a user message in character.
#[async_trait]
pub trait PersonaChat: Send + Sync {
    async fn chat(&self, role: &Role, message: &str) -> Result<ChatReply, GenAiError>;
}
