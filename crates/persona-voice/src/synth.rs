use crate::error::VoiceError;
use crate::select::InstalledVoice;
use async_trait::async_trait;
use persona_types::Gender;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Mutex;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

/// Maximum text input size for speech (64 KiB). Prevents resource exhaustion
/// from oversized utterances.
const MAX_SPEECH_INPUT_BYTES: usize = 64 * 1024;

/// Timeout for listing installed voices.
const VOICES_TIMEOUT: Duration = Duration::from_secs(10);

/// One piece of text to speak.
#[derive(Debug, Clone)]
pub struct Utterance {
    pub text: String,
    pub voice: InstalledVoice,
    /// Words per minute.
    pub rate_wpm: u32,
    /// Gender the role asked for; synthesizers may use it to adjust the voice.
    pub gender_hint: Option<Gender>,
}

/// The platform speech synthesizer.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Voices available for [`SpeechSynthesizer::speak`].
    async fn voices(&self) -> Result<Vec<InstalledVoice>, VoiceError>;

    /// Starts speaking. Returns once playback has started; any utterance
    /// still playing is cancelled first.
    async fn speak(&self, utterance: Utterance) -> Result<(), VoiceError>;

    /// Stops the current utterance, if any.
    fn cancel(&self);
}

/// Speech through the `espeak-ng` command-line synthesizer.
#[derive(Debug)]
pub struct EspeakSynthesizer {
    binary: PathBuf,
    current: Mutex<Option<Child>>,
}

impl EspeakSynthesizer {
    pub fn new(binary: impl AsRef<Path>) -> Self {
        Self {
            binary: binary.as_ref().to_path_buf(),
            current: Mutex::new(None),
        }
    }

    /// Voice argument for `-v`, adding a gender variant when the selected
    /// voice does not already match the hint.
    fn voice_arg(utterance: &Utterance) -> String {
        match (utterance.gender_hint, utterance.voice.gender) {
            (Some(hint), declared) if declared != Some(hint) => {
                let variant = match hint {
                    Gender::Female => "f3",
                    Gender::Male => "m3",
                };
                format!("{}+{}", utterance.voice.id, variant)
            }
            _ => utterance.voice.id.clone(),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<Child>> {
        match self.current.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("speech slot lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

/// Parses the table printed by `espeak-ng --voices`.
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  5  af              --/M      Afrikaans          gmw/af
///  5  en-us           --/M      English_(America)  gmw/en-US            (en 3)
/// ```
pub fn parse_voice_list(output: &str) -> Vec<InstalledVoice> {
    output
        .lines()
        .skip_while(|line| !line.trim_start().starts_with("Pty"))
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 5 {
                return None;
            }
            let gender = match fields[2].rsplit('/').next() {
                Some("F") => Some(Gender::Female),
                Some("M") => Some(Gender::Male),
                _ => None,
            };
            Some(InstalledVoice {
                id: fields[1].to_string(),
                name: fields[3].replace('_', " "),
                language: fields[1].to_string(),
                gender,
            })
        })
        .collect()
}

#[async_trait]
impl SpeechSynthesizer for EspeakSynthesizer {
    async fn voices(&self) -> Result<Vec<InstalledVoice>, VoiceError> {
        let mut command = Command::new(&self.binary);
        command
            .arg("--voices")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = tokio::time::timeout(VOICES_TIMEOUT, command.output())
            .await
            .map_err(|_| {
                VoiceError::Synthesis(format!(
                    "listing voices timed out after {} seconds",
                    VOICES_TIMEOUT.as_secs()
                ))
            })?
            .map_err(|e| VoiceError::Synthesis(format!("Failed to run espeak-ng: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VoiceError::Synthesis(format!(
                "espeak-ng --voices failed: {}",
                stderr
            )));
        }

        let voices = parse_voice_list(&String::from_utf8_lossy(&output.stdout));
        debug!(count = voices.len(), "listed installed voices");
        Ok(voices)
    }

    async fn speak(&self, utterance: Utterance) -> Result<(), VoiceError> {
        if utterance.text.len() > MAX_SPEECH_INPUT_BYTES {
            return Err(VoiceError::Synthesis(format!(
                "text exceeds maximum size: {} bytes (limit: {} bytes)",
                utterance.text.len(),
                MAX_SPEECH_INPUT_BYTES
            )));
        }
        if utterance.text.trim().is_empty() {
            return Ok(());
        }

        self.cancel();

        let mut command = Command::new(&self.binary);
        command
            .arg("-v")
            .arg(Self::voice_arg(&utterance))
            .arg("-s")
            .arg(utterance.rate_wpm.to_string())
            .arg("--stdin")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let mut child = command
            .spawn()
            .map_err(|e| VoiceError::Synthesis(format!("Failed to spawn espeak-ng: {}", e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| VoiceError::Synthesis("Failed to open stdin".to_string()))?;
        let text = utterance.text;

        // Stdin is closed when the task finishes, which ends espeak's input.
        tokio::spawn(async move {
            if let Err(e) = stdin.write_all(text.as_bytes()).await {
                warn!("failed to write utterance to espeak-ng: {}", e);
            }
        });

        *self.slot() = Some(child);
        Ok(())
    }

    fn cancel(&self) {
        if let Some(mut previous) = self.slot().take() {
            if let Err(e) = previous.start_kill() {
                debug!("previous utterance already finished: {}", e);
            }
        }
    }
}
