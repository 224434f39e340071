//! Persona roles and the keyword tables derived from them.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Longest role label accepted, in characters.
pub const MAX_ROLE_CHARS: usize = 100;

/// Role words that suggest a female voice.
const FEMALE_KEYWORDS: &[&str] = &[
    "queen",
    "princess",
    "empress",
    "duchess",
    "countess",
    "lady",
    "witch",
    "sorceress",
    "enchantress",
    "goddess",
    "priestess",
    "heroine",
    "mermaid",
    "fairy",
    "nun",
    "actress",
    "waitress",
    "woman",
    "girl",
    "mother",
    "grandmother",
    "grandma",
    "aunt",
    "sister",
    "daughter",
    "bride",
    "ballerina",
    "geisha",
    "valkyrie",
];

/// Role words that suggest a male voice.
const MALE_KEYWORDS: &[&str] = &[
    "king",
    "prince",
    "emperor",
    "duke",
    "count",
    "lord",
    "sir",
    "knight",
    "wizard",
    "sorcerer",
    "warlock",
    "god",
    "priest",
    "monk",
    "hero",
    "pirate",
    "viking",
    "samurai",
    "warrior",
    "soldier",
    "cowboy",
    "sheriff",
    "actor",
    "waiter",
    "man",
    "boy",
    "father",
    "grandfather",
    "grandpa",
    "uncle",
    "brother",
    "son",
    "groom",
    "pharaoh",
    "sultan",
    "maharaja",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoleError {
    #[error("role must not be empty")]
    Empty,

    #[error("role is too long: {0} characters (limit: {max})", max = MAX_ROLE_CHARS)]
    TooLong(usize),
}

/// Voice gender hint derived from a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Female => "female",
            Self::Male => "male",
        }
    }
}

/// A free-text persona label such as "queen" or "space pirate".
///
/// Always trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Role(String);

impl Role {
    pub fn new(label: impl AsRef<str>) -> Result<Self, RoleError> {
        let trimmed = label.as_ref().trim();
        if trimmed.is_empty() {
            return Err(RoleError::Empty);
        }
        let chars = trimmed.chars().count();
        if chars > MAX_ROLE_CHARS {
            return Err(RoleError::TooLong(chars));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercased words of the label, split on anything that is not
    /// alphanumeric.
    pub fn words(&self) -> impl Iterator<Item = String> + '_ {
        self.0
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
    }

    /// Returns the first word of the label that appears in `table`.
    pub fn find_keyword<'t>(&self, table: &[&'t str]) -> Option<&'t str> {
        self.words()
            .find_map(|word| table.iter().copied().find(|k| *k == word))
    }

    /// Gender hint for voice selection, if any role word is gendered.
    ///
    /// Female keywords are checked first so "queen mother" and
    /// "princess and the frog prince" resolve consistently.
    pub fn gender_hint(&self) -> Option<Gender> {
        if self.find_keyword(FEMALE_KEYWORDS).is_some() {
            Some(Gender::Female)
        } else if self.find_keyword(MALE_KEYWORDS).is_some() {
            Some(Gender::Male)
        } else {
            None
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Role {
    type Error = RoleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.0
    }
}

impl std::str::FromStr for Role {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_rejects_blank() {
        assert_eq!(Role::new("  queen \n").unwrap().as_str(), "queen");
        assert_eq!(Role::new("   "), Err(RoleError::Empty));
        assert_eq!(Role::new(""), Err(RoleError::Empty));
    }

    #[test]
    fn rejects_overlong_labels() {
        let long = "a".repeat(MAX_ROLE_CHARS + 1);
        assert_eq!(Role::new(&long), Err(RoleError::TooLong(MAX_ROLE_CHARS + 1)));
        assert!(Role::new("a".repeat(MAX_ROLE_CHARS)).is_ok());
    }

    #[test]
    fn too_long_message_names_both_lengths() {
        assert_eq!(
            RoleError::TooLong(140).to_string(),
            "role is too long: 140 characters (limit: 100)"
        );
    }

    #[test]
    fn gender_hint_matches_whole_words() {
        let hint = |label: &str| Role::new(label).unwrap().gender_hint();
        assert_eq!(hint("queen"), Some(Gender::Female));
        assert_eq!(hint("Evil Queen"), Some(Gender::Female));
        assert_eq!(hint("pirate-king"), Some(Gender::Male));
        assert_eq!(hint("kingfisher"), None);
        assert_eq!(hint("astronaut"), None);
        assert_eq!(hint("goddess of war"), Some(Gender::Female));
        assert_eq!(hint("god of thunder"), Some(Gender::Male));
    }

    #[test]
    fn female_keywords_take_precedence() {
        let role = Role::new("prince and princess").unwrap();
        assert_eq!(role.gender_hint(), Some(Gender::Female));
    }

    #[test]
    fn find_keyword_returns_table_entry() {
        let role = Role::new("Space Pirate Captain").unwrap();
        assert_eq!(role.find_keyword(&["captain", "pirate"]), Some("pirate"));
        assert_eq!(role.find_keyword(&["ninja"]), None);
    }

    #[test]
    fn deserialization_validates() {
        let role: Role = serde_json::from_str("\" wizard \"").unwrap();
        assert_eq!(role.as_str(), "wizard");
        assert!(serde_json::from_str::<Role>("\"  \"").is_err());
    }
}
