use crate::error::VoiceError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Slowest accepted speaking rate, in words per minute.
pub const MIN_RATE_WPM: u32 = 80;
/// Fastest accepted speaking rate, in words per minute.
pub const MAX_RATE_WPM: u32 = 450;

fn default_enabled() -> bool {
    true
}

fn default_binary() -> PathBuf {
    PathBuf::from("espeak-ng")
}

fn default_rate_wpm() -> u32 {
    165
}

/// Speech output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Whether replies are spoken at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Path to the `espeak-ng` binary (or a name resolved via `PATH`).
    #[serde(default = "default_binary")]
    pub binary: PathBuf,
    /// Speaking rate in words per minute.
    #[serde(default = "default_rate_wpm")]
    pub rate_wpm: u32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            binary: default_binary(),
            rate_wpm: default_rate_wpm(),
        }
    }
}

impl SpeechConfig {
    pub fn validate(&self) -> Result<(), VoiceError> {
        if !(MIN_RATE_WPM..=MAX_RATE_WPM).contains(&self.rate_wpm) {
            return Err(VoiceError::Config(format!(
                "rate_wpm must be between {} and {}",
                MIN_RATE_WPM, MAX_RATE_WPM
            )));
        }
        if self.binary.as_os_str().is_empty() {
            return Err(VoiceError::Config(
                "speech binary path is empty. Set speech.binary in config or the \
                 ESPEAK_BINARY environment variable."
                    .to_string(),
            ));
        }
        Ok(())
    }
}
