//! Persona instructions
//!
//! Builds the system instructions describing who the assistant plays, and the
//! `session.update` that carries them together with manual turn detection.

use voice_coach_config::{PersonaConfig, TurnDetectionSettings};
use voice_coach_core::{ClientMessage, SessionSettings, TurnDetection};

/// Compose the instruction text for a persona
pub fn build_instructions(persona: &PersonaConfig) -> String {
    let mut lines = Vec::with_capacity(8);

    let identity = if persona.emoji.is_empty() {
        persona.name.clone()
    } else {
        format!("{} {}", persona.name, persona.emoji)
    };
    lines.push(format!(
        "You are {}. Speak with the \"{}\" voice.",
        identity, persona.voice
    ));

    lines.push(persona.gender.directive().to_string());

    if let Some(opening) = persona.opening_line() {
        lines.push(format!(
            "Your first message must be exactly: \"{}\"",
            opening
        ));
    }

    let summary: Vec<&str> = [persona.personality.trim(), persona.background.trim()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect();
    if !summary.is_empty() {
        lines.push(format!("Remember who you are: {}", summary.join(" ")));
    }

    lines.push(format!(
        "Always respond in {} while staying in character, even if the user speaks or writes in another language.",
        persona.language
    ));
    lines.push(
        "Keep every response short (1-2 sentences) and conversational.".to_string(),
    );
    lines.push(format!(
        "Stay in character as {} for the whole conversation.",
        persona.name
    ));

    lines.join("\n")
}

/// `session.update` for a persona with manual turn detection
pub fn session_update(persona: &PersonaConfig, turn_detection: &TurnDetectionSettings) -> ClientMessage {
    ClientMessage::SessionUpdate {
        session: SessionSettings {
            instructions: build_instructions(persona),
            voice: Some(persona.voice.clone()),
            turn_detection: TurnDetection::manual(
                turn_detection.threshold,
                turn_detection.prefix_padding_ms,
                turn_detection.silence_duration_ms,
            ),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voice_coach_config::Gender;

    fn barista() -> PersonaConfig {
        PersonaConfig {
            id: "barista".to_string(),
            name: "Mia".to_string(),
            emoji: "☕".to_string(),
            personality: "Cheerful and quick.".to_string(),
            background: "Runs a small cafe in Seattle.".to_string(),
            first_message: Some("Welcome! What can I get you?".to_string()),
            gender: Gender::Female,
            voice: "shimmer".to_string(),
            language: "English".to_string(),
        }
    }

    #[test]
    fn test_instructions_content() {
        let instructions = build_instructions(&barista());

        assert!(instructions.starts_with("You are Mia ☕."));
        assert!(instructions.contains("\"shimmer\" voice"));
        assert!(instructions.contains(Gender::Female.directive()));
        assert!(instructions.contains("exactly: \"Welcome! What can I get you?\""));
        assert!(instructions.contains("Cheerful and quick. Runs a small cafe in Seattle."));
        assert!(instructions.contains("Always respond in English"));
        assert!(instructions.contains("1-2 sentences"));
        assert!(instructions.ends_with("Stay in character as Mia for the whole conversation."));
    }

    #[test]
    fn test_instructions_without_opening_line() {
        let persona = PersonaConfig {
            first_message: Some("  ".to_string()),
            ..barista()
        };
        assert!(!build_instructions(&persona).contains("first message"));
    }

    #[test]
    fn test_session_update_manual_turns() {
        let message = session_update(&barista(), &TurnDetectionSettings::default());
        let value = serde_json::to_value(&message).unwrap();

        assert_eq!(value["type"], "session.update");
        assert_eq!(value["session"]["voice"], "shimmer");
        assert_eq!(value["session"]["turn_detection"]["type"], "server_vad");
        assert_eq!(value["session"]["turn_detection"]["create_response"], false);
        assert_eq!(value["session"]["turn_detection"]["silence_duration_ms"], 800);
        assert!(value["session"]["instructions"]
            .as_str()
            .unwrap()
            .contains("Mia"));
    }
}
