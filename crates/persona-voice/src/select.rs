//! Picking an installed voice for a reply.

use persona_types::Gender;
use serde::{Deserialize, Serialize};

/// Name fragments that mark a voice as female on common platforms.
const FEMALE_NAME_HINTS: &[&str] = &[
    "female", "woman", "zira", "samantha", "victoria", "karen", "moira", "tessa", "fiona",
    "veena", "lekha", "kyoko", "amelie", "anna", "paulina", "monica", "luciana", "alice", "sara",
    "ellen", "yuna", "tingting", "meijia", "milena", "zuzana", "heera", "kalpana", "jenny",
    "aria", "sonia", "libby",
];

/// Name fragments that mark a voice as male on common platforms.
const MALE_NAME_HINTS: &[&str] = &[
    "male", "man", "david", "mark", "daniel", "alex", "fred", "thomas", "rishi", "jorge", "diego",
    "luca", "xander", "yuri", "maged", "ravi", "hemant", "guy", "ryan", "brian",
];

/// A voice the platform synthesizer can speak with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledVoice {
    /// Identifier passed back to the synthesizer.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Language tag, as reported by the synthesizer.
    pub language: String,
    /// Declared gender, when the synthesizer reports one.
    pub gender: Option<Gender>,
}

impl InstalledVoice {
    /// Gender implied by the voice name, for synthesizers that do not
    /// declare one.
    pub fn name_gender(&self) -> Option<Gender> {
        let lower = self.name.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        if words.iter().any(|w| FEMALE_NAME_HINTS.contains(w)) {
            Some(Gender::Female)
        } else if words.iter().any(|w| MALE_NAME_HINTS.contains(w)) {
            Some(Gender::Male)
        } else {
            None
        }
    }
}

/// Normalises a language tag for comparison: lowercase, `-` separators.
fn normalize_tag(tag: &str) -> String {
    tag.trim().replace('_', "-").to_lowercase()
}

fn primary_subtag(tag: &str) -> &str {
    tag.split('-').next().unwrap_or(tag)
}

/// Selects the voice to speak `language_tag` with.
///
/// Voices whose language equals the tag are preferred; otherwise voices
/// sharing its primary subtag ("hi" for "hi-IN") are considered. Among the
/// candidates, a voice whose declared gender matches `hint` wins, then one
/// whose name suggests the hinted gender, then the first candidate.
///
/// Returns `None` when no voice speaks the language.
pub fn select_voice<'a>(
    voices: &'a [InstalledVoice],
    language_tag: &str,
    hint: Option<Gender>,
) -> Option<&'a InstalledVoice> {
    let wanted = normalize_tag(language_tag);
    if wanted.is_empty() {
        return None;
    }

    let exact: Vec<&InstalledVoice> = voices
        .iter()
        .filter(|v| normalize_tag(&v.language) == wanted)
        .collect();

    let candidates = if exact.is_empty() {
        let primary = primary_subtag(&wanted);
        voices
            .iter()
            .filter(|v| primary_subtag(&normalize_tag(&v.language)) == primary)
            .collect()
    } else {
        exact
    };

    let first = candidates.first().copied()?;
    let Some(hint) = hint else {
        return Some(first);
    };

    candidates
        .iter()
        .copied()
        .find(|v| v.gender == Some(hint))
        .or_else(|| {
            candidates
                .iter()
                .copied()
                .find(|v| v.name_gender() == Some(hint))
        })
        .or(Some(first))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice(id: &str, name: &str, language: &str, gender: Option<Gender>) -> InstalledVoice {
        InstalledVoice {
            id: id.to_string(),
            name: name.to_string(),
            language: language.to_string(),
            gender,
        }
    }

    fn catalog() -> Vec<InstalledVoice> {
        vec![
            voice("en-us", "English (America)", "en-US", Some(Gender::Male)),
            voice("en-gb", "English (Great Britain)", "en-GB", Some(Gender::Male)),
            voice("en-gb-f", "Google UK English Female", "en_GB", None),
            voice("hi", "Hindi", "hi", Some(Gender::Male)),
            voice("fr-f", "Amelie", "fr-CA", None),
            voice("fr", "French", "fr-FR", Some(Gender::Male)),
        ]
    }

    #[test]
    fn exact_tag_wins_over_primary_subtag() {
        let voices = catalog();
        let chosen = select_voice(&voices, "en-US", None).unwrap();
        assert_eq!(chosen.id, "en-us");
    }

    #[test]
    fn matching_is_case_and_separator_insensitive() {
        let voices = catalog();
        let chosen = select_voice(&voices, "EN_us", None).unwrap();
        assert_eq!(chosen.id, "en-us");
    }

    #[test]
    fn falls_back_to_primary_subtag() {
        let voices = catalog();
        let chosen = select_voice(&voices, "hi-IN", Some(Gender::Female)).unwrap();
        assert_eq!(chosen.id, "hi");
    }

    #[test]
    fn gender_hint_uses_name_when_undeclared() {
        let voices = catalog();
        let chosen = select_voice(&voices, "en-GB", Some(Gender::Female)).unwrap();
        assert_eq!(chosen.id, "en-gb-f");

        let chosen = select_voice(&voices, "en-GB", Some(Gender::Male)).unwrap();
        assert_eq!(chosen.id, "en-gb");
    }

    #[test]
    fn hint_only_reorders_within_language() {
        let voices = catalog();
        // The female French voice is a primary-subtag match only; fr-FR exists.
        let chosen = select_voice(&voices, "fr-FR", Some(Gender::Female)).unwrap();
        assert_eq!(chosen.id, "fr");
    }

    #[test]
    fn unknown_language_has_no_voice() {
        let voices = catalog();
        assert!(select_voice(&voices, "ja-JP", None).is_none());
        assert!(select_voice(&voices, "", None).is_none());
        assert!(select_voice(&[], "en-US", None).is_none());
    }

    #[test]
    fn female_is_not_read_as_male() {
        let v = voice("x", "Microsoft Zira Female", "en-US", None);
        assert_eq!(v.name_gender(), Some(Gender::Female));
        let v = voice("y", "Male Voice 2", "en-US", None);
        assert_eq!(v.name_gender(), Some(Gender::Male));
    }
}
