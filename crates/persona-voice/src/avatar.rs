//! Role to voice table for the hosted talking-avatar service.

use persona_types::{Gender, Role};

/// Voice used when neither a role keyword nor a gender hint applies.
pub const DEFAULT_AVATAR_VOICE: &str = "en-US-JennyNeural";

const DEFAULT_MALE_AVATAR_VOICE: &str = "en-US-GuyNeural";

/// Keyword → Microsoft neural voice id.
const AVATAR_VOICES: &[(&str, &str)] = &[
    ("queen", "en-GB-SoniaNeural"),
    ("king", "en-GB-RyanNeural"),
    ("princess", "en-US-AnaNeural"),
    ("prince", "en-US-BrandonNeural"),
    ("witch", "en-US-NancyNeural"),
    ("wizard", "en-GB-ThomasNeural"),
    ("pirate", "en-US-DavisNeural"),
    ("knight", "en-GB-AlfieNeural"),
    ("goddess", "en-US-AriaNeural"),
    ("god", "en-US-ChristopherNeural"),
    ("robot", "en-US-SteffanNeural"),
    ("detective", "en-GB-OliverNeural"),
    ("scientist", "en-US-AndrewNeural"),
    ("astronaut", "en-US-EricNeural"),
];

/// Voice id for `role`.
///
/// The first role word found in the table decides; otherwise the role's
/// gender hint picks a default.
pub fn avatar_voice_id(role: &Role) -> &'static str {
    let keywords: Vec<&str> = AVATAR_VOICES.iter().map(|(k, _)| *k).collect();
    if let Some(keyword) = role.find_keyword(&keywords) {
        if let Some((_, voice)) = AVATAR_VOICES.iter().find(|(k, _)| *k == keyword) {
            return *voice;
        }
    }
    match role.gender_hint() {
        Some(Gender::Male) => DEFAULT_MALE_AVATAR_VOICE,
        _ => DEFAULT_AVATAR_VOICE,
    }
}
