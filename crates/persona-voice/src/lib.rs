//! Voice selection and speech output for personas.
//!
//! Replies are spoken on-device: the reply's language tag and a gender hint
//! derived from the role pick one of the synthesizer's installed voices, and
//! the text is handed to the platform synthesizer (`espeak-ng`). Playback is
//! fire-and-forget; starting a new utterance cancels the previous one.
//!
//! The avatar-video proxy uses a separate static table mapping roles to the
//! hosted video service's voice identifiers, also defined here.

pub mod avatar;
pub mod config;
pub mod error;
pub mod select;
pub mod speaker;
pub mod synth;

pub use avatar::{avatar_voice_id, DEFAULT_AVATAR_VOICE};
pub use config::SpeechConfig;
pub use error::VoiceError;
pub use select::{select_voice, InstalledVoice};
pub use speaker::Speaker;
pub use synth::{EspeakSynthesizer, SpeechSynthesizer, Utterance};
