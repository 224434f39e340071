use async_trait::async_trait;
use persona_types::{Gender, Role};
use persona_voice::{
    InstalledVoice, SpeechConfig, SpeechSynthesizer, Speaker, Utterance, VoiceError,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Records utterances instead of playing them.
#[derive(Default)]
struct RecordingSynth {
    voices: Vec<InstalledVoice>,
    listed: AtomicUsize,
    spoken: Mutex<Vec<Utterance>>,
    cancelled: AtomicUsize,
}

#[async_trait]
impl SpeechSynthesizer for RecordingSynth {
    async fn voices(&self) -> Result<Vec<InstalledVoice>, VoiceError> {
        self.listed.fetch_add(1, Ordering::SeqCst);
        Ok(self.voices.clone())
    }

    async fn speak(&self, utterance: Utterance) -> Result<(), VoiceError> {
        self.cancel();
        self.spoken.lock().unwrap().push(utterance);
        Ok(())
    }

    fn cancel(&self) {
        self.cancelled.fetch_add(1, Ordering::SeqCst);
    }
}

fn voice(id: &str, language: &str, gender: Option<Gender>) -> InstalledVoice {
    InstalledVoice {
        id: id.to_string(),
        name: id.to_string(),
        language: language.to_string(),
        gender,
    }
}

fn synth() -> Arc<RecordingSynth> {
    Arc::new(RecordingSynth {
        voices: vec![
            voice("en-us", "en-us", Some(Gender::Male)),
            voice("en-us-f", "en-us", Some(Gender::Female)),
            voice("hi", "hi", Some(Gender::Male)),
        ],
        ..Default::default()
    })
}

#[tokio::test]
async fn say_picks_voice_by_language_and_role() {
    let synth = synth();
    let speaker = Speaker::new(synth.clone(), &SpeechConfig::default()).unwrap();

    let queen = Role::new("queen").unwrap();
    let chosen = speaker.say("Good day", "en-US", &queen).await.unwrap();
    assert_eq!(chosen.id, "en-us-f");

    let king = Role::new("king").unwrap();
    let chosen = speaker.say("Namaste", "hi-IN", &king).await.unwrap();
    assert_eq!(chosen.id, "hi");

    let spoken = synth.spoken.lock().unwrap();
    assert_eq!(spoken.len(), 2);
    assert_eq!(spoken[0].text, "Good day");
    assert_eq!(spoken[0].gender_hint, Some(Gender::Female));
    assert_eq!(spoken[0].rate_wpm, SpeechConfig::default().rate_wpm);
    assert_eq!(spoken[1].gender_hint, Some(Gender::Male));
}

#[tokio::test]
async fn voice_list_is_read_once() {
    let synth = synth();
    let speaker = Speaker::new(synth.clone(), &SpeechConfig::default()).unwrap();
    let role = Role::new("pirate").unwrap();

    for _ in 0..3 {
        speaker.say("Arr", "en-US", &role).await.unwrap();
    }
    assert_eq!(synth.listed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn missing_language_reports_no_voice() {
    let synth = synth();
    let speaker = Speaker::new(synth.clone(), &SpeechConfig::default()).unwrap();
    let role = Role::new("samurai").unwrap();

    match speaker.say("Konnichiwa", "ja-JP", &role).await {
        Err(VoiceError::NoVoice(tag)) => assert_eq!(tag, "ja-JP"),
        other => panic!("expected NoVoice, got {:?}", other),
    }
    assert!(synth.spoken.lock().unwrap().is_empty());
}

#[tokio::test]
async fn stop_cancels_playback() {
    let synth = synth();
    let speaker = Speaker::new(synth.clone(), &SpeechConfig::default()).unwrap();
    speaker.stop();
    assert_eq!(synth.cancelled.load(Ordering::SeqCst), 1);
}

#[test]
fn invalid_rate_is_rejected() {
    let config = SpeechConfig {
        rate_wpm: 10,
        ..SpeechConfig::default()
    };
    let result = Speaker::new(synth(), &config);
    match result {
        Err(VoiceError::Config(msg)) => assert!(msg.contains("between 80 and 450"), "got: {}", msg),
        other => panic!("expected Config error, got {:?}", other),
    }
}

#[test]
fn speech_config_defaults_from_partial_toml() {
    let config: SpeechConfig = toml::from_str("rate_wpm = 200").unwrap();
    assert!(config.enabled);
    assert_eq!(config.rate_wpm, 200);
    assert_eq!(config.binary, std::path::PathBuf::from("espeak-ng"));
}
