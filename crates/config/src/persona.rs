//! Persona configuration
//!
//! The persona is passed explicitly to the conversation core at construction and
//! on every reconfiguration; there is no ambient persona store.

use serde::{Deserialize, Serialize};

use crate::constants::persona;

/// Gender presentation of the assistant voice character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Female,
    Male,
    #[default]
    Neutral,
}

impl Gender {
    /// Directive included in the session instructions
    pub fn directive(&self) -> &'static str {
        match self {
            Gender::Female => {
                "Present yourself as a woman and speak with a feminine voice and manner."
            },
            Gender::Male => "Present yourself as a man and speak with a masculine voice and manner.",
            Gender::Neutral => "Do not present a specific gender; keep a neutral voice and manner.",
        }
    }
}

/// Character the assistant plays for a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaConfig {
    /// Stable identifier (e.g. "barista")
    #[serde(default = "default_id")]
    pub id: String,

    /// Display name (e.g. "Mia")
    #[serde(default = "default_name")]
    pub name: String,

    /// Emoji shown next to the name
    #[serde(default)]
    pub emoji: String,

    /// Personality summary
    #[serde(default)]
    pub personality: String,

    /// Background story
    #[serde(default)]
    pub background: String,

    /// Exact opening line, if the persona has one
    #[serde(default)]
    pub first_message: Option<String>,

    /// Gender presentation
    #[serde(default)]
    pub gender: Gender,

    /// Realtime voice id
    #[serde(default = "default_voice")]
    pub voice: String,

    /// Language the assistant must answer in
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_id() -> String {
    "tutor".to_string()
}

fn default_name() -> String {
    "Tutor".to_string()
}

fn default_voice() -> String {
    persona::VOICE.to_string()
}

fn default_language() -> String {
    persona::LANGUAGE.to_string()
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            id: default_id(),
            name: default_name(),
            emoji: String::new(),
            personality: "Friendly, patient English conversation partner.".to_string(),
            background: String::new(),
            first_message: None,
            gender: Gender::default(),
            voice: default_voice(),
            language: default_language(),
        }
    }
}

impl PersonaConfig {
    /// Opening line, ignoring blank values
    pub fn opening_line(&self) -> Option<&str> {
        self.first_message
            .as_deref()
            .map(str::trim)
            .filter(|line| !line.is_empty())
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }
}
