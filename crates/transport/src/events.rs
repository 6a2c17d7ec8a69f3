//! Server event mapping
//!
//! Turns raw realtime service JSON into [`TransportEvent`]s plus decoded
//! assistant audio. The mapper tracks whether assistant audio is streaming so
//! that the first audio delta of a response is reported as output start.
//!
//! User transcription deltas are incremental; the mapper keeps the caption so
//! far per conversation item and forwards that instead of the bare fragment.

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine as _;
use serde_json::Value;
use std::collections::HashMap;

use voice_coach_core::{RealtimeEvent, TransportEvent};

/// Result of mapping one server message
#[derive(Debug, Default, PartialEq)]
pub struct MappedMessage {
    /// Events to deliver, in order
    pub events: Vec<TransportEvent>,
    /// Decoded PCM16 assistant audio
    pub audio: Option<Vec<i16>>,
}

impl MappedMessage {
    fn event(event: TransportEvent) -> Self {
        Self {
            events: vec![event],
            audio: None,
        }
    }

    fn none() -> Self {
        Self::default()
    }
}

/// Stateful mapper for one connection
#[derive(Debug, Default)]
pub struct ServerEventMapper {
    speaking: bool,
    /// Running user caption per item id
    captions: HashMap<String, String>,
}

impl ServerEventMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether assistant audio is currently streaming
    pub fn is_speaking(&self) -> bool {
        self.speaking
    }

    /// Map one raw text frame
    pub fn map(&mut self, raw: &str) -> MappedMessage {
        let value: Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "Dropping malformed server message");
                return MappedMessage::none();
            },
        };

        let kind = value.get("type").and_then(Value::as_str).unwrap_or("");

        match kind {
            "conversation.item.input_audio_transcription.delta" => {
                let Some(delta) = text_field(&value, &["delta"]) else {
                    return MappedMessage::none();
                };
                let caption = self.captions.entry(item_id(&value)).or_default();
                caption.push_str(&delta);
                MappedMessage::event(TransportEvent::UserTranscript {
                    text: caption.clone(),
                    is_final: false,
                })
            },
            "conversation.item.input_audio_transcription.completed" => {
                let caption = self.captions.remove(&item_id(&value));
                let text = text_field(&value, &["transcript"])
                    .filter(|t| !t.trim().is_empty())
                    .or(caption)
                    .unwrap_or_default();
                MappedMessage::event(TransportEvent::UserTranscript {
                    text,
                    is_final: true,
                })
            },
            "conversation.item.input_audio_transcription.failed" => {
                self.captions.remove(&item_id(&value));
                tracing::debug!("User transcription failed");
                MappedMessage::none()
            },
            "response.audio_transcript.delta"
            | "response.output_audio_transcript.delta"
            | "response.text.delta"
            | "response.output_text.delta" => {
                text_field(&value, &["delta"]).map_or_else(MappedMessage::none, |text| {
                    MappedMessage::event(TransportEvent::AssistantText {
                        text,
                        is_final: false,
                    })
                })
            },
            "response.audio_transcript.done"
            | "response.output_audio_transcript.done"
            | "response.text.done"
            | "response.output_text.done" => {
                let text = text_field(&value, &["transcript", "text"]).unwrap_or_default();
                MappedMessage::event(TransportEvent::AssistantTranscript { text })
            },
            "response.audio.delta" | "response.output_audio.delta" => self.map_audio_delta(&value),
            "response.audio.done" | "response.output_audio.done" => self.finish_audio(),
            "error" => {
                let message = value
                    .get("error")
                    .and_then(|e| e.get("message"))
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error");
                tracing::warn!(message, "Realtime service reported an error");
                MappedMessage::none()
            },
            _ => self.map_control(raw, kind),
        }
    }

    fn map_audio_delta(&mut self, value: &Value) -> MappedMessage {
        let Some(encoded) = text_field(value, &["delta", "audio"]) else {
            return MappedMessage::none();
        };

        let samples = match B64.decode(encoded.as_bytes()) {
            Ok(bytes) => decode_pcm16(&bytes),
            Err(e) => {
                tracing::warn!(error = %e, "Dropping undecodable audio delta");
                return MappedMessage::none();
            },
        };

        let mut mapped = MappedMessage {
            events: Vec::new(),
            audio: Some(samples),
        };
        if !self.speaking {
            self.speaking = true;
            mapped
                .events
                .push(TransportEvent::Control(RealtimeEvent::AssistantOutputStarted));
        }
        mapped
    }

    fn finish_audio(&mut self) -> MappedMessage {
        if std::mem::take(&mut self.speaking) {
            MappedMessage::event(TransportEvent::Control(RealtimeEvent::AssistantOutputStopped))
        } else {
            MappedMessage::none()
        }
    }

    fn map_control(&mut self, raw: &str, kind: &str) -> MappedMessage {
        match RealtimeEvent::from_json(raw) {
            Ok(RealtimeEvent::Unknown) | Err(_) => {
                tracing::trace!(kind, "Ignoring server event");
                MappedMessage::none()
            },
            Ok(event) => {
                if event.ends_assistant_output() {
                    self.speaking = false;
                } else if event == RealtimeEvent::AssistantOutputStarted {
                    self.speaking = true;
                }
                MappedMessage::event(TransportEvent::Control(event))
            },
        }
    }
}

/// Conversation item a transcription event belongs to
fn item_id(value: &Value) -> String {
    value
        .get("item_id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// First present string field among `keys`
fn text_field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

/// Little-endian PCM16 bytes to samples; a trailing odd byte is dropped
pub fn decode_pcm16(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

/// Samples to base64 little-endian PCM16
pub fn encode_pcm16(samples: &[i16]) -> String {
    let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
    B64.encode(bytes)
}
