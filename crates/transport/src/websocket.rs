//! WebSocket realtime transport
//!
//! One WebSocket carries both the JSON control messages and the audio:
//! captured microphone frames go up as `input_audio_buffer.append`, assistant
//! audio comes down as base64 deltas and is handed to the [`AudioOutput`].
//!
//! Two tasks serve a connection. The reader maps server frames into
//! [`TransportEvent`]s; the writer drains queued control payloads and capture
//! frames into the socket. Both stop on the connection's shutdown signal.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{header, HeaderValue, Request};
use tokio_tungstenite::tungstenite::Message;

use voice_coach_config::RealtimeConfig;
use voice_coach_core::{
    AudioOutput, AudioSource, ChannelState, ClientMessage, ConnectRequest, Connection,
    ControlChannel, Error, Result, TransportEvent, TransportEventSender, TransportFactory,
};

use crate::capture::CaptureTrack;
use crate::events::{encode_pcm16, ServerEventMapper};

/// Opens realtime connections over WebSocket
pub struct RealtimeWsFactory {
    base_url: String,
    /// Capture track of the most recent connection
    capture: Arc<RwLock<Option<Arc<CaptureTrack>>>>,
}

impl RealtimeWsFactory {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            capture: Arc::new(RwLock::new(None)),
        }
    }

    pub fn from_settings(config: &RealtimeConfig) -> Self {
        Self::new(config.realtime_url.clone())
    }

    /// Capture track of the most recent connection, for feeding microphone frames
    pub fn capture(&self) -> Option<Arc<CaptureTrack>> {
        self.capture.read().clone()
    }

    /// Build the authenticated upgrade request
    pub fn build_request(&self, token: &str, model: &str) -> Result<Request<()>> {
        let separator = if self.base_url.contains('?') { '&' } else { '?' };
        let url = format!("{}{}model={}", self.base_url, separator, model);

        let mut request = url
            .into_client_request()
            .map_err(|e| Error::Transport(format!("Invalid realtime URL: {}", e)))?;

        let bearer = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| Error::Credential("Token is not a valid header value".to_string()))?;

        let headers = request.headers_mut();
        headers.insert(header::AUTHORIZATION, bearer);
        headers.insert("OpenAI-Beta", HeaderValue::from_static("realtime=v1"));

        Ok(request)
    }
}

#[async_trait]
impl TransportFactory for RealtimeWsFactory {
    async fn connect(
        &self,
        request: ConnectRequest,
        events: TransportEventSender,
    ) -> Result<Box<dyn Connection>> {
        let upgrade = self.build_request(&request.token, &request.model)?;

        tracing::info!(model = %request.model, voice = %request.voice, "Connecting realtime WebSocket");

        let (stream, _response) = tokio_tungstenite::connect_async(upgrade)
            .await
            .map_err(|e| Error::Transport(format!("WebSocket connect failed: {}", e)))?;
        let (sink, source) = stream.split();

        let state = Arc::new(RwLock::new(ChannelState::Open));
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel::<String>();
        let (shutdown_tx, _) = broadcast::channel::<()>(1);
        let (track, frames_rx) = CaptureTrack::new(request.audio);
        let track = Arc::new(track);

        tokio::spawn(run_writer(
            sink,
            outbound_rx,
            frames_rx,
            track.clone(),
            state.clone(),
            shutdown_tx.subscribe(),
        ));
        tokio::spawn(run_reader(
            source,
            events.clone(),
            request.output.clone(),
            state.clone(),
            shutdown_tx.subscribe(),
        ));

        *self.capture.write() = Some(track.clone());

        // The socket is usable as soon as the upgrade completes
        let _ = events.send(TransportEvent::ChannelOpen);

        Ok(Box::new(WsConnection {
            control: Arc::new(WsControlChannel {
                state: state.clone(),
                outbound: outbound_tx,
            }),
            track,
            output: request.output,
            state,
            shutdown_tx,
        }))
    }
}

/// Control channel backed by the writer task's queue
pub struct WsControlChannel {
    state: Arc<RwLock<ChannelState>>,
    outbound: mpsc::UnboundedSender<String>,
}

impl ControlChannel for WsControlChannel {
    fn ready_state(&self) -> ChannelState {
        *self.state.read()
    }

    fn send(&self, payload: &str) -> Result<()> {
        if !self.ready_state().is_open() {
            return Err(Error::ChannelNotOpen);
        }
        self.outbound
            .send(payload.to_string())
            .map_err(|_| Error::ChannelNotOpen)
    }
}

/// An open WebSocket realtime connection
pub struct WsConnection {
    control: Arc<WsControlChannel>,
    track: Arc<CaptureTrack>,
    output: Option<Arc<dyn AudioOutput>>,
    state: Arc<RwLock<ChannelState>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Connection for WsConnection {
    fn control(&self) -> Arc<dyn ControlChannel> {
        self.control.clone()
    }

    fn local_audio(&self) -> Arc<dyn AudioSource> {
        self.track.clone()
    }

    fn stop(&self) {
        {
            let mut state = self.state.write();
            if matches!(*state, ChannelState::Closing | ChannelState::Closed) {
                return;
            }
            *state = ChannelState::Closing;
        }

        if let Some(output) = &self.output {
            output.clear();
        }
        let _ = self.shutdown_tx.send(());

        tracing::debug!("Realtime connection stopping");
    }
}

impl Drop for WsConnection {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_writer<S>(
    mut sink: S,
    mut outbound: mpsc::UnboundedReceiver<String>,
    mut frames: mpsc::Receiver<Vec<i16>>,
    track: Arc<CaptureTrack>,
    state: Arc<RwLock<ChannelState>>,
    mut shutdown: broadcast::Receiver<()>,
) where
    S: futures::Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    loop {
        let message = tokio::select! {
            _ = shutdown.recv() => break,
            payload = outbound.recv() => match payload {
                Some(payload) => Message::Text(payload),
                None => break,
            },
            frame = frames.recv() => match frame {
                Some(frame) if !track.is_muted() => {
                    let append = ClientMessage::InputAudioAppend { audio: encode_pcm16(&frame) };
                    match append.to_json() {
                        Ok(json) => Message::Text(json),
                        Err(e) => {
                            tracing::warn!(error = %e, "Failed to encode audio frame");
                            continue;
                        },
                    }
                },
                Some(_) => continue,
                None => break,
            },
        };

        if let Err(e) = sink.send(message).await {
            tracing::warn!(error = %e, "WebSocket send failed");
            break;
        }
    }

    if let Err(e) = sink.close().await {
        tracing::debug!(error = %e, "WebSocket close failed");
    }
    *state.write() = ChannelState::Closed;
}

async fn run_reader<S, E>(
    mut source: S,
    events: TransportEventSender,
    output: Option<Arc<dyn AudioOutput>>,
    state: Arc<RwLock<ChannelState>>,
    mut shutdown: broadcast::Receiver<()>,
) where
    S: futures::Stream<Item = std::result::Result<Message, E>> + Unpin,
    E: std::fmt::Display,
{
    let mut mapper = ServerEventMapper::new();

    let reason = loop {
        let frame = tokio::select! {
            _ = shutdown.recv() => return,
            frame = source.next() => frame,
        };

        match frame {
            Some(Ok(Message::Text(text))) => {
                let mapped = mapper.map(&text);
                if let (Some(samples), Some(output)) = (&mapped.audio, &output) {
                    output.play(samples);
                }
                for event in mapped.events {
                    if let (TransportEvent::Control(control), Some(output)) = (&event, &output) {
                        let pending = output.buffered();
                        if control.ends_assistant_output() && !pending.is_zero() {
                            tracing::trace!(
                                pending_ms = pending.as_millis() as u64,
                                "Waiting for assistant playback to drain"
                            );
                            tokio::select! {
                                _ = shutdown.recv() => return,
                                _ = tokio::time::sleep(pending) => {},
                            }
                        }
                    }
                    if events.send(event).is_err() {
                        return;
                    }
                }
            },
            Some(Ok(Message::Close(frame))) => {
                break frame
                    .map(|f| f.reason.to_string())
                    .filter(|r| !r.is_empty())
                    .unwrap_or_else(|| "closed by server".to_string());
            },
            Some(Ok(_)) => {},
            Some(Err(e)) => break e.to_string(),
            None => break "connection ended".to_string(),
        }
    };

    {
        let mut current = state.write();
        if matches!(*current, ChannelState::Closing | ChannelState::Closed) {
            return;
        }
        *current = ChannelState::Closed;
    }

    tracing::info!(reason = %reason, "Realtime connection closed remotely");
    let _ = events.send(TransportEvent::Closed { reason });
}
