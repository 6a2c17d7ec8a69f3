//! Conversation configuration

use std::time::Duration;

use voice_coach_config::{Settings, TurnDetectionSettings};
use voice_coach_core::AudioConstraints;

/// Runtime parameters of a [`crate::VoiceConversation`]
#[derive(Debug, Clone)]
pub struct ConversationConfig {
    /// Language code sent with credential requests
    pub language: String,
    /// Wait between a finalized user utterance and `response.create`
    pub response_delay: Duration,
    /// Server VAD parameters sent with `session.update`
    pub turn_detection: TurnDetectionSettings,
    /// Capture constraints requested from the transport
    pub audio: AudioConstraints,
    /// Capacity of the conversation event broadcast
    pub event_capacity: usize,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for ConversationConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            language: settings.session.language.clone(),
            response_delay: Duration::from_millis(settings.session.response_delay_ms),
            turn_detection: settings.session.turn_detection,
            audio: settings.session.audio,
            event_capacity: 100,
        }
    }
}

impl ConversationConfig {
    pub fn with_response_delay(mut self, delay: Duration) -> Self {
        self.response_delay = delay;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_settings() {
        let mut settings = Settings::default();
        settings.session.response_delay_ms = 900;
        settings.session.language = "fr".to_string();

        let config = ConversationConfig::from(&settings);
        assert_eq!(config.response_delay, Duration::from_millis(900));
        assert_eq!(config.language, "fr");
        assert_eq!(config.turn_detection.silence_duration_ms, 800);
    }
}
