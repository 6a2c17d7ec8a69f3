//! Error types shared across the voice conversation crates

use thiserror::Error;

/// Result alias using the core error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by collaborators of the conversation core
#[derive(Error, Debug)]
pub enum Error {
    #[error("Credential issuance failed: {0}")]
    Credential(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Control channel is not open")]
    ChannelNotOpen,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether the failure happened while negotiating a session
    pub fn is_negotiation(&self) -> bool {
        matches!(self, Self::Credential(_) | Self::Transport(_) | Self::Http(_))
    }
}
