use crate::avatar::ProxyError;
use crate::config::ConfigError;
use crate::upload::UploadError;
use persona_genai::GenAiError;
use persona_voice::VoiceError;
use thiserror::Error;

/// Errors that stop the studio from starting or running.
#[derive(Error, Debug)]
pub enum StudioError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    GenAi(#[from] GenAiError),

    #[error(transparent)]
    Voice(#[from] VoiceError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Proxy(#[from] ProxyError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
