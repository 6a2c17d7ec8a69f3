//! Collaborator traits for the conversation core
//!
//! The conversation core never talks to the network or the audio device directly.
//! Everything outside of turn management sits behind these seams so that
//! implementations can be swapped (WebSocket, WebRTC, in-memory mocks).
//!
//! ```text
//! Session setup:
//!   - CredentialIssuer: language + voice → short-lived token + model
//!   - TransportFactory: token + model → Connection
//!
//! Live session:
//!   - Connection: control channel, local audio, stop
//!   - ControlChannel: ready state + JSON send
//!   - AudioSource: mute/unmute of local capture
//!   - AudioOutput: assistant playback sink
//! ```

mod credential;
mod transport;

pub use credential::{CredentialIssuer, CredentialRequest, SessionCredential};
pub use transport::{
    AudioOutput, AudioSource, ChannelState, ConnectRequest, Connection, ControlChannel,
    TransportEventSender, TransportFactory,
};
