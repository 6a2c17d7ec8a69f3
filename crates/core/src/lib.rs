//! Core traits and types for the realtime voice conversation core
//!
//! This crate provides the foundational types shared by every other crate:
//! - Inbound event vocabulary of the realtime service (`RealtimeEvent`)
//! - Outbound control messages (`ClientMessage`)
//! - Collaborator traits (credential issuer, transport, control channel, audio)
//! - Audio capture constraints
//! - Error types

pub mod audio;
pub mod control;
pub mod error;
pub mod event;
pub mod traits;

pub use audio::AudioConstraints;
pub use control::{
    ClientMessage, ContentPart, ConversationItem, ItemRole, Modality, ResponseOptions,
    SessionSettings, TurnDetection,
};
pub use error::{Error, Result};
pub use event::{RealtimeEvent, TransportEvent};

pub use traits::{
    AudioOutput, AudioSource, ChannelState, ConnectRequest, Connection, ControlChannel,
    CredentialIssuer, CredentialRequest, SessionCredential, TransportEventSender,
    TransportFactory,
};
