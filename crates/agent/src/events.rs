//! Conversation events published to the application layer

use serde::Serialize;

/// Who is speaking right now
///
/// Both flags may be false (idle). While `responding` is set, user transcripts
/// are treated as cross-talk and never finalized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TurnState {
    /// User is speaking
    pub listening: bool,
    /// Assistant audio is streaming out
    pub responding: bool,
}

impl TurnState {
    pub fn is_idle(&self) -> bool {
        !self.listening && !self.responding
    }
}

/// Event emitted by a [`crate::VoiceConversation`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ConversationEvent {
    /// A realtime session was opened
    Connected { session_id: String, model: String },
    /// The session ended (local stop or remote close)
    Disconnected { session_id: String, reason: String },
    /// The user started speaking
    UserSpeechStarted,
    /// Live caption of the user's speech, interim or final
    UserTranscriptUpdate { text: String, is_final: bool },
    /// Finalized, normalized user utterance
    UserMessage { text: String },
    /// Finalized, normalized assistant utterance
    AssistantMessage { text: String },
    /// Turn flags changed
    TurnChanged(TurnState),
    /// A `response.create` was sent
    ResponseRequested,
}
