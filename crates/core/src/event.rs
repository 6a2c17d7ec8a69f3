//! Inbound event vocabulary
//!
//! The realtime service emits loosely shaped JSON events keyed by a `type` field.
//! Only the turn-taking events matter to the conversation core; everything else
//! deserializes into [`RealtimeEvent::Unknown`] and is ignored.

use serde::Deserialize;

/// Turn-taking control events emitted by the realtime service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum RealtimeEvent {
    /// User speech detected by server-side VAD
    #[serde(rename = "input_audio_buffer.speech_started")]
    SpeechStarted,
    /// User went silent
    #[serde(rename = "input_audio_buffer.speech_stopped")]
    SpeechStopped,
    /// Assistant audio started streaming to the output sink
    #[serde(rename = "output_audio_buffer.started")]
    AssistantOutputStarted,
    /// Assistant audio finished (or was cleared)
    #[serde(
        rename = "output_audio_buffer.stopped",
        alias = "output_audio_buffer.cleared"
    )]
    AssistantOutputStopped,
    /// The response finished generating
    #[serde(rename = "response.done")]
    ResponseComplete,
    /// Any event the core does not act on
    #[serde(other)]
    Unknown,
}

impl RealtimeEvent {
    /// Parse a raw JSON control event
    pub fn from_json(raw: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::SpeechStarted => "speech_started",
            Self::SpeechStopped => "speech_stopped",
            Self::AssistantOutputStarted => "assistant_output_started",
            Self::AssistantOutputStopped => "assistant_output_stopped",
            Self::ResponseComplete => "response_complete",
            Self::Unknown => "unknown",
        }
    }

    /// Whether this event ends assistant playback
    pub fn ends_assistant_output(&self) -> bool {
        matches!(self, Self::AssistantOutputStopped | Self::ResponseComplete)
    }
}

/// Event delivered by a transport to the conversation core, in emission order
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// The control channel became open
    ChannelOpen,
    /// A turn-taking control event
    Control(RealtimeEvent),
    /// User speech transcription (interim or final)
    UserTranscript { text: String, is_final: bool },
    /// Assistant output text; a final fragment is the last delta of the utterance
    AssistantText { text: String, is_final: bool },
    /// Complete transcript of one assistant utterance, superseding its deltas
    AssistantTranscript { text: String },
    /// The connection was closed by the remote side or the network
    Closed { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_events() {
        let event =
            RealtimeEvent::from_json(r#"{"type":"input_audio_buffer.speech_started"}"#).unwrap();
        assert_eq!(event, RealtimeEvent::SpeechStarted);

        let event =
            RealtimeEvent::from_json(r#"{"type":"output_audio_buffer.started"}"#).unwrap();
        assert_eq!(event, RealtimeEvent::AssistantOutputStarted);

        let event = RealtimeEvent::from_json(r#"{"type":"response.done"}"#).unwrap();
        assert_eq!(event, RealtimeEvent::ResponseComplete);
    }

    #[test]
    fn test_extra_fields_ignored() {
        let event = RealtimeEvent::from_json(
            r#"{"type":"input_audio_buffer.speech_stopped","audio_end_ms":1520,"item_id":"item_1"}"#,
        )
        .unwrap();
        assert_eq!(event, RealtimeEvent::SpeechStopped);
    }

    #[test]
    fn test_cleared_is_stop() {
        let event =
            RealtimeEvent::from_json(r#"{"type":"output_audio_buffer.cleared"}"#).unwrap();
        assert_eq!(event, RealtimeEvent::AssistantOutputStopped);
        assert!(event.ends_assistant_output());
    }

    #[test]
    fn test_unknown_event() {
        let event =
            RealtimeEvent::from_json(r#"{"type":"rate_limits.updated","rate_limits":[]}"#)
                .unwrap();
        assert_eq!(event, RealtimeEvent::Unknown);
        assert!(!event.ends_assistant_output());
    }

    #[test]
    fn test_missing_type_is_error() {
        assert!(RealtimeEvent::from_json(r#"{"event":"x"}"#).is_err());
    }
}
