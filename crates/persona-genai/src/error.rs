use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenAiError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Request blocked: {0}")]
    Blocked(String),

    #[error("The model returned no image")]
    NoImage,

    #[error("Message is too long: {chars} characters (limit: {max})")]
    MessageTooLong { chars: usize, max: usize },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}
