//! Outbound control messages
//!
//! JSON messages the client sends over the control channel. Field names and
//! `type` tags match the realtime service wire format.

use serde::{Deserialize, Serialize};

/// Control message sent to the realtime service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Configure instructions, voice and turn detection for the session
    #[serde(rename = "session.update")]
    SessionUpdate { session: SessionSettings },
    /// Inject a conversation item (synthetic user text)
    #[serde(rename = "conversation.item.create")]
    ConversationItemCreate { item: ConversationItem },
    /// Ask the service to generate a reply
    #[serde(rename = "response.create")]
    ResponseCreate { response: ResponseOptions },
    /// Append captured microphone audio (base64 PCM16)
    #[serde(rename = "input_audio_buffer.append")]
    InputAudioAppend { audio: String },
}

impl ClientMessage {
    /// Synthetic user text turn
    pub fn user_text(text: impl Into<String>) -> Self {
        Self::ConversationItemCreate {
            item: ConversationItem::user_text(text),
        }
    }

    pub fn response_create(response: ResponseOptions) -> Self {
        Self::ResponseCreate { response }
    }

    /// Wire `type` tag, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SessionUpdate { .. } => "session.update",
            Self::ConversationItemCreate { .. } => "conversation.item.create",
            Self::ResponseCreate { .. } => "response.create",
            Self::InputAudioAppend { .. } => "input_audio_buffer.append",
        }
    }

    /// Serialize to the JSON text sent over the channel
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Session configuration payload of `session.update`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// System instructions (persona, language policy)
    pub instructions: String,
    /// Output voice
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    /// Turn detection parameters
    pub turn_detection: TurnDetection,
}

/// Turn detection mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnDetection {
    /// Server-side voice activity detection
    ServerVad {
        /// Activation threshold (0.0 - 1.0)
        threshold: f32,
        /// Audio kept before detected speech (ms)
        prefix_padding_ms: u32,
        /// Silence that ends an utterance (ms)
        silence_duration_ms: u32,
        /// Whether the service replies on its own when speech stops
        create_response: bool,
    },
}

impl TurnDetection {
    /// Server VAD that reports speech boundaries but never auto-creates responses
    pub fn manual(threshold: f32, prefix_padding_ms: u32, silence_duration_ms: u32) -> Self {
        Self::ServerVad {
            threshold,
            prefix_padding_ms,
            silence_duration_ms,
            create_response: false,
        }
    }
}

/// Conversation item payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationItem {
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub role: ItemRole,
    pub content: Vec<ContentPart>,
}

impl ConversationItem {
    /// User message with a single text part
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            kind: ItemKind::Message,
            role: ItemRole::User,
            content: vec![ContentPart::InputText { text: text.into() }],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Message,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemRole {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    InputText { text: String },
}

/// Output modality of a generated response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Audio,
    Text,
}

/// Options of `response.create`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseOptions {
    pub modalities: Vec<Modality>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    /// Target conversation (`"none"` generates out-of-band)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
}

impl ResponseOptions {
    /// Audio and text modalities, no overrides
    pub fn full() -> Self {
        Self {
            modalities: vec![Modality::Audio, Modality::Text],
            ..Default::default()
        }
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_session_update_shape() {
        let msg = ClientMessage::SessionUpdate {
            session: SessionSettings {
                instructions: "Be brief".to_string(),
                voice: None,
                turn_detection: TurnDetection::manual(0.5, 300, 800),
            },
        };

        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "session.update",
                "session": {
                    "instructions": "Be brief",
                    "turn_detection": {
                        "type": "server_vad",
                        "threshold": 0.5,
                        "prefix_padding_ms": 300,
                        "silence_duration_ms": 800,
                        "create_response": false
                    }
                }
            })
        );
    }

    #[test]
    fn test_user_text_shape() {
        let value = serde_json::to_value(ClientMessage::user_text("hello")).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "conversation.item.create",
                "item": {
                    "type": "message",
                    "role": "user",
                    "content": [{"type": "input_text", "text": "hello"}]
                }
            })
        );
    }

    #[test]
    fn test_response_create_omits_unset_options() {
        let value =
            serde_json::to_value(ClientMessage::response_create(ResponseOptions::full())).unwrap();
        assert_eq!(
            value,
            json!({"type": "response.create", "response": {"modalities": ["audio", "text"]}})
        );
    }

    #[test]
    fn test_response_create_with_overrides() {
        let msg = ClientMessage::response_create(ResponseOptions {
            instructions: Some("Summarize".to_string()),
            conversation: Some("none".to_string()),
            ..ResponseOptions::full().with_voice("verse")
        });
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["response"]["instructions"], "Summarize");
        assert_eq!(value["response"]["voice"], "verse");
        assert_eq!(value["response"]["conversation"], "none");
        assert_eq!(msg.kind(), "response.create");
    }

    #[test]
    fn test_parse_back_from_wire() {
        let raw = ClientMessage::user_text("hi").to_json().unwrap();
        let parsed: ClientMessage = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, ClientMessage::user_text("hi"));
    }
}
