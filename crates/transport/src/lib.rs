//! Realtime transport for the voice conversation core
//!
//! - [`HttpCredentialIssuer`]: fetches short-lived session credentials
//! - [`RealtimeWsFactory`]: opens WebSocket connections to the realtime service
//! - [`CaptureTrack`]: microphone frames into the connection, mutable by the turn tracker

pub mod capture;
pub mod credentials;
pub mod events;
pub mod websocket;

pub use capture::CaptureTrack;
pub use credentials::HttpCredentialIssuer;
pub use events::{MappedMessage, ServerEventMapper};
pub use websocket::{RealtimeWsFactory, WsConnection, WsControlChannel};
