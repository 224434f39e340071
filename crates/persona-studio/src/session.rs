//! The persona session: one photo, one role at a time, one request in flight.
//!
//! A session starts with no persona. The first submission after an upload is
//! read as a role and turns the photo into that persona; every submission
//! after that is a chat turn answered in character. Failures never change the
//! state; they come back as a single message together with the input so the
//! user can retry.

use persona_genai::{GenAiError, ImageTransformer, PersonaChat};
use persona_types::{ChatReply, ConversationState, EncodedImage, Role, RoleError, Turn};
use persona_voice::Speaker;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Still working on the previous request.")]
    Busy,

    #[error("Upload a photo first.")]
    NoImage,

    #[error("Nothing to send.")]
    EmptyInput,

    #[error("That role won't work: {0}")]
    Role(#[from] RoleError),

    #[error("Could not create the persona: {0}")]
    Transform(#[source] GenAiError),

    #[error("The persona could not answer: {0}")]
    Chat(#[source] GenAiError),
}

/// A failed submission, flattened for display.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct Failure {
    /// What to show the user.
    pub message: String,
    /// The input to put back in the prompt.
    pub restored_input: String,
    #[source]
    pub error: SessionError,
}

impl Failure {
    fn new(error: SessionError, input: &str) -> Self {
        Self {
            message: error.to_string(),
            restored_input: input.to_string(),
            error,
        }
    }
}

/// What happened to the spoken half of a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechStatus {
    Spoken { voice: String },
    /// Speech output is turned off.
    Disabled,
    /// The reply could not be spoken; the turn still succeeded.
    Unavailable(String),
}

#[derive(Debug, Clone)]
pub enum Outcome {
    /// The photo now shows `role`.
    Transformed { role: Role, image: EncodedImage },
    Replied { reply: ChatReply, speech: SpeechStatus },
}

#[derive(Debug, Default)]
struct Inner {
    original: Option<EncodedImage>,
    current: Option<EncodedImage>,
    state: ConversationState,
    transcript: Vec<Turn>,
}

/// Holds the loading flag for the duration of one request.
struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Session {
    transformer: Arc<dyn ImageTransformer>,
    chat: Arc<dyn PersonaChat>,
    speaker: Option<Arc<Speaker>>,
    inner: Mutex<Inner>,
    loading: AtomicBool,
}

impl Session {
    pub fn new(
        transformer: Arc<dyn ImageTransformer>,
        chat: Arc<dyn PersonaChat>,
        speaker: Option<Arc<Speaker>>,
    ) -> Self {
        Self {
            transformer,
            chat,
            speaker,
            inner: Mutex::new(Inner::default()),
            loading: AtomicBool::new(false),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Replaces the photo and drops any active persona.
    pub fn upload(&self, image: EncodedImage) -> Result<(), SessionError> {
        let _guard = LoadingGuard::acquire(&self.loading).ok_or(SessionError::Busy)?;
        if let Some(speaker) = &self.speaker {
            speaker.stop();
        }

        let mut inner = self.lock();
        info!(mime = %image.mime_type, bytes = image.decoded_len(), "photo uploaded");
        inner.original = Some(image.clone());
        inner.current = Some(image);
        inner.state = ConversationState::AwaitingRole;
        Ok(())
    }

    /// Sets the role or chats with the active persona, depending on state.
    pub async fn submit(&self, input: &str) -> Result<Outcome, Failure> {
        let _guard = LoadingGuard::acquire(&self.loading)
            .ok_or_else(|| Failure::new(SessionError::Busy, input))?;

        let text = input.trim();
        if text.is_empty() {
            return Err(Failure::new(SessionError::EmptyInput, input));
        }

        let (state, image) = {
            let inner = self.lock();
            (inner.state.clone(), inner.current.clone())
        };

        let result = match state {
            ConversationState::AwaitingRole => self.transform(text, image).await,
            ConversationState::RoleActive(role) => self.reply(&role, text).await,
        };
        result.map_err(|error| {
            warn!(error = %error, "submission failed");
            Failure::new(error, input)
        })
    }

    async fn transform(
        &self,
        text: &str,
        image: Option<EncodedImage>,
    ) -> Result<Outcome, SessionError> {
        let role = Role::new(text)?;
        let image = image.ok_or(SessionError::NoImage)?;

        let transformed = self
            .transformer
            .transform_image(&image, &role)
            .await
            .map_err(SessionError::Transform)?;

        info!(role = %role, mime = %transformed.mime_type, "persona created");
        let mut inner = self.lock();
        inner.current = Some(transformed.clone());
        inner.state = ConversationState::RoleActive(role.clone());
        Ok(Outcome::Transformed {
            role,
            image: transformed,
        })
    }

    async fn reply(&self, role: &Role, text: &str) -> Result<Outcome, SessionError> {
        let reply = self
            .chat
            .chat(role, text)
            .await
            .map_err(SessionError::Chat)?;

        {
            let mut inner = self.lock();
            inner.transcript.push(Turn::user(text));
            inner.transcript.push(Turn::persona(&reply));
        }

        let speech = match &self.speaker {
            None => SpeechStatus::Disabled,
            Some(speaker) => match speaker.say(&reply.response, &reply.language, role).await {
                Ok(voice) => SpeechStatus::Spoken { voice: voice.name },
                Err(e) => {
                    warn!(error = %e, language = %reply.language, "reply not spoken");
                    SpeechStatus::Unavailable(e.to_string())
                }
            },
        };

        Ok(Outcome::Replied { reply, speech })
    }

    /// Drops the persona and puts the uploaded photo back.
    pub fn reset(&self) -> Result<(), SessionError> {
        let _guard = LoadingGuard::acquire(&self.loading).ok_or(SessionError::Busy)?;
        if let Some(speaker) = &self.speaker {
            speaker.stop();
        }

        let mut inner = self.lock();
        inner.state = ConversationState::AwaitingRole;
        inner.current = inner.original.clone();
        Ok(())
    }

    pub fn state(&self) -> ConversationState {
        self.lock().state.clone()
    }

    pub fn current_image(&self) -> Option<EncodedImage> {
        self.lock().current.clone()
    }

    pub fn transcript(&self) -> Vec<Turn> {
        self.lock().transcript.clone()
    }

    /// Text of the most recent persona reply.
    pub fn last_reply(&self) -> Option<String> {
        self.lock()
            .transcript
            .iter()
            .rev()
            .find(|turn| turn.author == persona_types::Author::Persona)
            .map(|turn| turn.text.clone())
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("Session")
            .field("state", &inner.state)
            .field("has_image", &inner.current.is_some())
            .field("turns", &inner.transcript.len())
            .field("loading", &self.is_loading())
            .finish()
    }
}
