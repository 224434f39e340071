use crate::config::SpeechConfig;
use crate::error::VoiceError;
use crate::select::{select_voice, InstalledVoice};
use crate::synth::{SpeechSynthesizer, Utterance};
use persona_types::Role;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

/// Speaks persona replies with a voice matching language and role.
///
/// The installed-voice list is read from the synthesizer once and cached for
/// the lifetime of the speaker.
pub struct Speaker {
    synth: Arc<dyn SpeechSynthesizer>,
    voices: OnceCell<Vec<InstalledVoice>>,
    rate_wpm: u32,
}

impl Speaker {
    pub fn new(synth: Arc<dyn SpeechSynthesizer>, config: &SpeechConfig) -> Result<Self, VoiceError> {
        config.validate()?;
        Ok(Self {
            synth,
            voices: OnceCell::new(),
            rate_wpm: config.rate_wpm,
        })
    }

    pub async fn voices(&self) -> Result<&[InstalledVoice], VoiceError> {
        let voices = self
            .voices
            .get_or_try_init(|| self.synth.voices())
            .await?;
        Ok(voices.as_slice())
    }

    /// Speaks `text` in `language` as `role`, returning the chosen voice.
    ///
    /// Fails with [`VoiceError::NoVoice`] when no installed voice speaks the
    /// language.
    pub async fn say(
        &self,
        text: &str,
        language: &str,
        role: &Role,
    ) -> Result<InstalledVoice, VoiceError> {
        let hint = role.gender_hint();
        let voice = select_voice(self.voices().await?, language, hint)
            .cloned()
            .ok_or_else(|| VoiceError::NoVoice(language.to_string()))?;

        info!(
            voice = %voice.id,
            language,
            hint = hint.map(|g| g.as_str()).unwrap_or("none"),
            "speaking reply"
        );

        self.synth
            .speak(Utterance {
                text: text.to_string(),
                voice: voice.clone(),
                rate_wpm: self.rate_wpm,
                gender_hint: hint,
            })
            .await?;

        Ok(voice)
    }

    /// Stops whatever is playing.
    pub fn stop(&self) {
        self.synth.cancel();
    }
}

impl std::fmt::Debug for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Speaker")
            .field("voices", &self.voices.get().map(Vec::len))
            .field("rate_wpm", &self.rate_wpm)
            .finish()
    }
}
