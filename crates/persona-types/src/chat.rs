//! Conversation state and the structured payloads exchanged per turn.

use crate::role::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Language tag used when the model leaves `language` empty.
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// Structured reply of a chat turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    /// BCP-47 tag of the language the reply is written in (e.g. "hi-IN").
    #[serde(default)]
    pub language: String,
    /// The persona's reply text.
    pub response: String,
}

impl ChatReply {
    /// Trims both fields, replaces `_` separators in the tag and fills an
    /// empty tag with [`DEFAULT_LANGUAGE`].
    pub fn normalized(self) -> Self {
        let language = self.language.trim().replace('_', "-");
        Self {
            language: if language.is_empty() {
                DEFAULT_LANGUAGE.to_string()
            } else {
                language
            },
            response: self.response.trim().to_string(),
        }
    }
}

/// Whether the next submission sets the role or chats with it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConversationState {
    /// No persona yet; the next submission is the role for the image transform.
    #[default]
    AwaitingRole,
    /// A persona is active; submissions are chat turns.
    RoleActive(Role),
}

impl ConversationState {
    pub fn role(&self) -> Option<&Role> {
        match self {
            Self::AwaitingRole => None,
            Self::RoleActive(role) => Some(role),
        }
    }
}

/// Body of `POST /api/talk`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TalkRequest {
    pub text: String,
    /// Missing or blank selects the default voice.
    #[serde(default)]
    pub role: String,
}

/// Who produced a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    User,
    Persona,
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub at: DateTime<Utc>,
    pub author: Author,
    pub text: String,
    /// Language tag of persona replies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            at: Utc::now(),
            author: Author::User,
            text: text.into(),
            language: None,
        }
    }

    pub fn persona(reply: &ChatReply) -> Self {
        Self {
            at: Utc::now(),
            author: Author::Persona,
            text: reply.response.clone(),
            language: Some(reply.language.clone()),
        }
    }
}
