//! Transport traits
//!
//! Abstract interfaces for the realtime signaling/media connection.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::{AudioConstraints, Result, TransportEvent};

/// Sender half the transport uses to deliver events, in emission order
pub type TransportEventSender = mpsc::UnboundedSender<TransportEvent>;

/// Ready state of the control channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Open,
    Closing,
    Closed,
}

impl ChannelState {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

/// Control channel carrying JSON control messages
pub trait ControlChannel: Send + Sync {
    /// Current ready state
    fn ready_state(&self) -> ChannelState;

    /// Send a serialized control message
    fn send(&self, payload: &str) -> Result<()>;
}

/// Local capture that the turn tracker can silence
///
/// Implementations apply the call to every capture track they own.
pub trait AudioSource: Send + Sync {
    fn mute(&self);

    fn unmute(&self);

    fn is_muted(&self) -> bool;
}

/// Playback sink for assistant audio
///
/// Transports hold back the end of assistant output until [`buffered`] has
/// drained, so the microphone is not re-enabled while queued audio still plays.
///
/// [`buffered`]: AudioOutput::buffered
pub trait AudioOutput: Send + Sync {
    /// Queue PCM16 samples for playback
    fn play(&self, samples: &[i16]);

    /// Drop anything still queued
    fn clear(&self);

    /// Playback time still queued
    fn buffered(&self) -> Duration {
        Duration::ZERO
    }
}

/// Parameters for opening a transport connection
#[derive(Clone)]
pub struct ConnectRequest {
    pub token: String,
    pub model: String,
    pub voice: String,
    pub audio: AudioConstraints,
    /// Where assistant audio is played
    pub output: Option<Arc<dyn AudioOutput>>,
}

impl std::fmt::Debug for ConnectRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectRequest")
            .field("model", &self.model)
            .field("voice", &self.voice)
            .field("audio", &self.audio)
            .field("output", &self.output.is_some())
            .finish()
    }
}

/// An open realtime connection
pub trait Connection: Send + Sync {
    /// Control channel for JSON messages
    fn control(&self) -> Arc<dyn ControlChannel>;

    /// Local capture stream
    fn local_audio(&self) -> Arc<dyn AudioSource>;

    /// Tear the connection down. Must be idempotent.
    fn stop(&self);
}

/// Opens realtime connections
#[async_trait]
pub trait TransportFactory: Send + Sync + 'static {
    /// Connect and start delivering events on `events`
    async fn connect(
        &self,
        request: ConnectRequest,
        events: TransportEventSender,
    ) -> Result<Box<dyn Connection>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_state_open() {
        assert!(ChannelState::Open.is_open());
        assert!(!ChannelState::Connecting.is_open());
        assert!(!ChannelState::Closed.is_open());
    }

    #[test]
    fn test_connect_request_debug_hides_token() {
        let request = ConnectRequest {
            token: "ek_123".to_string(),
            model: "gpt-realtime".to_string(),
            voice: "alloy".to_string(),
            audio: AudioConstraints::default(),
            output: None,
        };
        let debug = format!("{:?}", request);
        assert!(!debug.contains("ek_123"));
        assert!(debug.contains("alloy"));
    }
}
