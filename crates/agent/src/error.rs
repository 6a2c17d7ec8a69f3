use thiserror::Error;

use voice_coach_core::Error as CoreError;

/// Conversation errors
#[derive(Error, Debug)]
pub enum ConversationError {
    #[error("Credential request failed: {0}")]
    Credential(#[source] CoreError),

    #[error("Transport negotiation failed: {0}")]
    Transport(#[source] CoreError),

    #[error("Control message failed: {0}")]
    Control(#[source] CoreError),
}

impl ConversationError {
    /// Whether the error came from opening a session
    pub fn is_negotiation(&self) -> bool {
        matches!(self, Self::Credential(_) | Self::Transport(_))
    }
}
