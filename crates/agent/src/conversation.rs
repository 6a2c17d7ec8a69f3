//! Voice conversation
//!
//! Owns the lifecycle of one realtime session and wires the turn tracker,
//! transcript accumulator and response trigger to the transport's event
//! stream. Events are processed one at a time under a single lock, in the
//! order the transport delivered them.
//!
//! ## Flow
//!
//! ```text
//! transport events ──▶ TurnTracker ──▶ mic mute/unmute
//!        │
//!        └──────────▶ TranscriptAccumulator ──▶ UserMessage ──▶ ResponseTrigger ──▶ response.create
//!                                           └─▶ AssistantMessage
//! ```

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use voice_coach_config::PersonaConfig;
use voice_coach_core::{
    AudioOutput, ClientMessage, ConnectRequest, Connection, ControlChannel, CredentialIssuer,
    CredentialRequest, ResponseOptions, TransportEvent, TransportFactory,
};

use crate::config::ConversationConfig;
use crate::events::{ConversationEvent, TurnState};
use crate::metrics;
use crate::persona;
use crate::transcript::{TranscriptAccumulator, UserTranscriptOutcome};
use crate::trigger::{send_response_request, ResponseTrigger};
use crate::turn::TurnTracker;
use crate::ConversationError;

/// Public view of the active session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub session_id: String,
    pub model: String,
    pub voice: String,
    pub started_at: DateTime<Utc>,
}

struct ActiveSession {
    info: SessionInfo,
    connection: Box<dyn Connection>,
    control: Arc<dyn ControlChannel>,
    /// `session.update` waiting for the channel to open
    deferred_update: Option<String>,
    pump: JoinHandle<()>,
}

struct ConversationState {
    session: Option<ActiveSession>,
    turn: TurnTracker,
    transcripts: TranscriptAccumulator,
    trigger: ResponseTrigger,
}

struct Inner {
    config: ConversationConfig,
    persona: RwLock<PersonaConfig>,
    issuer: Arc<dyn CredentialIssuer>,
    factory: Arc<dyn TransportFactory>,
    output: Option<Arc<dyn AudioOutput>>,
    state: Mutex<ConversationState>,
    connecting: AtomicBool,
    /// Bumped on every teardown; events and connects from older generations are dropped
    generation: AtomicU64,
    event_tx: broadcast::Sender<ConversationEvent>,
}

/// Realtime voice conversation with one assistant persona
///
/// At most one session is active at a time. Dropping the conversation stops
/// the session and restores the microphone.
pub struct VoiceConversation {
    inner: Arc<Inner>,
}

impl VoiceConversation {
    pub fn new(
        config: ConversationConfig,
        persona: PersonaConfig,
        issuer: Arc<dyn CredentialIssuer>,
        factory: Arc<dyn TransportFactory>,
        output: Option<Arc<dyn AudioOutput>>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(config.event_capacity.max(1));
        let trigger = ResponseTrigger::new(config.response_delay);

        Self {
            inner: Arc::new(Inner {
                config,
                persona: RwLock::new(persona),
                issuer,
                factory,
                output,
                state: Mutex::new(ConversationState {
                    session: None,
                    turn: TurnTracker::new(),
                    transcripts: TranscriptAccumulator::new(),
                    trigger,
                }),
                connecting: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                event_tx,
            }),
        }
    }

    /// Subscribe to conversation events
    pub fn subscribe(&self) -> broadcast::Receiver<ConversationEvent> {
        self.inner.event_tx.subscribe()
    }

    pub fn is_active(&self) -> bool {
        self.inner.state.lock().session.is_some()
    }

    pub fn session(&self) -> Option<SessionInfo> {
        self.inner
            .state
            .lock()
            .session
            .as_ref()
            .map(|s| s.info.clone())
    }

    pub fn turn_state(&self) -> TurnState {
        self.inner.state.lock().turn.state()
    }

    /// Whether a delayed response request is waiting
    pub fn response_pending(&self) -> bool {
        self.inner.state.lock().trigger.is_pending()
    }

    pub fn persona(&self) -> PersonaConfig {
        self.inner.persona.read().clone()
    }

    /// Open a realtime session
    ///
    /// Returns `Ok(false)` when a session is already active or being opened.
    /// On failure nothing is retained and the conversation stays disconnected.
    pub async fn start_voice(&self) -> Result<bool, ConversationError> {
        if self.is_active() {
            tracing::debug!("Voice session already active");
            return Ok(false);
        }
        if self
            .inner
            .connecting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Voice session already starting");
            return Ok(false);
        }
        let _connecting = ConnectingGuard(&self.inner.connecting);

        let generation = self.inner.generation.load(Ordering::Acquire);
        let voice = self.inner.persona.read().voice.clone();

        let credential = self
            .inner
            .issuer
            .issue(&CredentialRequest {
                language: self.inner.config.language.clone(),
                voice: voice.clone(),
            })
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Credential request failed, staying disconnected");
                ConversationError::Credential(e)
            })?;

        let model = credential.model.clone();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let connection = self
            .inner
            .factory
            .connect(
                ConnectRequest {
                    token: credential.token,
                    model: credential.model,
                    voice: voice.clone(),
                    audio: self.inner.config.audio,
                    output: self.inner.output.clone(),
                },
                events_tx,
            )
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Transport negotiation failed, staying disconnected");
                ConversationError::Transport(e)
            })?;

        let mut state = self.inner.state.lock();

        if self.inner.generation.load(Ordering::Acquire) != generation || state.session.is_some() {
            drop(state);
            connection.stop();
            tracing::info!("Voice session stopped while connecting, discarding connection");
            return Ok(false);
        }

        // Built from the persona current at install time
        let payload = match self.session_update_payload(&self.inner.persona.read()) {
            Ok(payload) => payload,
            Err(e) => {
                drop(state);
                connection.stop();
                return Err(e);
            },
        };

        let control = connection.control();
        let deferred_update = if control.ready_state().is_open() {
            send_control(control.as_ref(), &payload, "session.update");
            None
        } else {
            Some(payload)
        };

        state.turn.attach(connection.local_audio());

        let info = SessionInfo {
            session_id: uuid::Uuid::new_v4().to_string(),
            model,
            voice,
            started_at: Utc::now(),
        };
        let pump = tokio::spawn(pump_events(
            Arc::downgrade(&self.inner),
            generation,
            events_rx,
        ));

        tracing::info!(
            session_id = %info.session_id,
            model = %info.model,
            voice = %info.voice,
            deferred = deferred_update.is_some(),
            "Voice session started"
        );
        metrics::record_session_started();
        self.inner.emit(ConversationEvent::Connected {
            session_id: info.session_id.clone(),
            model: info.model.clone(),
        });

        state.session = Some(ActiveSession {
            info,
            connection,
            control,
            deferred_update,
            pump,
        });

        Ok(true)
    }

    /// Stop the session, if any. Idempotent.
    pub fn stop_voice(&self) {
        self.inner.teardown("stopped");
    }

    /// Inject a typed user turn and request a reply immediately
    ///
    /// Returns `Ok(false)` when there is no open control channel or the item
    /// could not be sent.
    pub fn send_voice_message(&self, text: &str) -> Result<bool, ConversationError> {
        let item = ClientMessage::user_text(text)
            .to_json()
            .map_err(ConversationError::Control)?;

        let mut state = self.inner.state.lock();
        let Some(control) = state
            .session
            .as_ref()
            .map(|s| s.control.clone())
            .filter(|c| c.ready_state().is_open())
        else {
            tracing::debug!("No open control channel, dropping typed message");
            return Ok(false);
        };

        if !send_control(control.as_ref(), &item, "conversation.item.create") {
            return Ok(false);
        }

        // The immediate request replaces any delayed one
        state.trigger.cancel();
        let response = self.inner.response_options();
        if send_response_request(control.as_ref(), response, "immediate") {
            self.inner.emit(ConversationEvent::ResponseRequested);
        }

        Ok(true)
    }

    /// Replace the persona and reconfigure the active session
    ///
    /// The new `session.update` is sent now when the channel is open,
    /// otherwise it replaces the one waiting for the channel to open.
    pub fn update_persona(&self, persona: PersonaConfig) -> Result<(), ConversationError> {
        let payload = self.session_update_payload(&persona)?;

        tracing::info!(persona = %persona.id, voice = %persona.voice, "Persona updated");
        *self.inner.persona.write() = persona;

        let mut state = self.inner.state.lock();
        if let Some(session) = state.session.as_mut() {
            if session.control.ready_state().is_open() {
                session.deferred_update = None;
                send_control(session.control.as_ref(), &payload, "session.update");
            } else {
                session.deferred_update = Some(payload);
            }
        }

        Ok(())
    }

    /// Feed one transport event to the active session
    ///
    /// Events arriving with no active session are dropped.
    pub fn handle_transport_event(&self, event: TransportEvent) {
        let generation = self.inner.generation.load(Ordering::Acquire);
        self.inner.dispatch(generation, event);
    }

    fn session_update_payload(&self, persona: &PersonaConfig) -> Result<String, ConversationError> {
        persona::session_update(persona, &self.inner.config.turn_detection)
            .to_json()
            .map_err(ConversationError::Control)
    }
}

impl Drop for VoiceConversation {
    fn drop(&mut self) {
        self.inner.teardown("dropped");
    }
}

impl Inner {
    fn emit(&self, event: ConversationEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }

    fn emit_assistant(&self, message: Option<String>) {
        if let Some(text) = message {
            metrics::record_assistant_message();
            self.emit(ConversationEvent::AssistantMessage { text });
        }
    }

    /// Reply options for the current persona
    fn response_options(&self) -> ResponseOptions {
        ResponseOptions::full().with_voice(self.persona.read().voice.clone())
    }

    /// Apply one event; returns false once the session is gone
    fn dispatch(&self, generation: u64, event: TransportEvent) -> bool {
        let closed = {
            let mut guard = self.state.lock();
            if self.generation.load(Ordering::Acquire) != generation {
                return false;
            }
            let state = &mut *guard;
            let Some(session) = state.session.as_mut() else {
                tracing::trace!("Dropping transport event without active session");
                return false;
            };

            match event {
                TransportEvent::ChannelOpen => {
                    if let Some(payload) = session.deferred_update.take() {
                        send_control(session.control.as_ref(), &payload, "session.update");
                    }
                    None
                },
                TransportEvent::Control(control_event) => {
                    let update = state.turn.apply(control_event);
                    if update.speech_started {
                        self.emit(ConversationEvent::UserSpeechStarted);
                    }
                    if update.changed {
                        tracing::debug!(event = control_event.name(), "Turn changed");
                        self.emit(ConversationEvent::TurnChanged(state.turn.state()));
                    }
                    None
                },
                TransportEvent::UserTranscript { text, is_final } => {
                    let outcome = state.transcripts.on_user_transcript(
                        &text,
                        is_final,
                        state.turn.is_responding(),
                    );
                    match outcome {
                        UserTranscriptOutcome::Suppressed => {},
                        UserTranscriptOutcome::Live => {
                            self.emit(ConversationEvent::UserTranscriptUpdate { text, is_final });
                        },
                        UserTranscriptOutcome::Finalized(message) => {
                            self.emit(ConversationEvent::UserTranscriptUpdate { text, is_final });
                            tracing::debug!(chars = message.len(), "User utterance finalized");
                            metrics::record_user_utterance();
                            self.emit(ConversationEvent::UserMessage { text: message });
                            state.trigger.schedule(
                                session.control.clone(),
                                self.response_options(),
                                self.event_tx.clone(),
                            );
                        },
                    }
                    None
                },
                TransportEvent::AssistantText { text, is_final } => {
                    let message = state.transcripts.on_assistant_text(&text, is_final);
                    self.emit_assistant(message);
                    None
                },
                TransportEvent::AssistantTranscript { text } => {
                    let message = state.transcripts.on_assistant_transcript(&text);
                    self.emit_assistant(message);
                    None
                },
                TransportEvent::Closed { reason } => Some(reason),
            }
        };

        match closed {
            Some(reason) => {
                tracing::warn!(reason = %reason, "Realtime connection closed");
                self.teardown(&reason);
                false
            },
            None => true,
        }
    }

    /// Drop the session and return to idle
    fn teardown(&self, reason: &str) {
        self.generation.fetch_add(1, Ordering::AcqRel);

        let (session, was_idle) = {
            let mut state = self.state.lock();
            state.trigger.cancel();
            let was_idle = state.turn.state().is_idle();
            state.turn.reset();
            state.transcripts.reset();
            (state.session.take(), was_idle)
        };

        if !was_idle {
            self.emit(ConversationEvent::TurnChanged(TurnState::default()));
        }

        if let Some(session) = session {
            session.pump.abort();
            session.connection.stop();

            tracing::info!(
                session_id = %session.info.session_id,
                reason,
                duration_secs = (Utc::now() - session.info.started_at).num_seconds(),
                "Voice session ended"
            );
            self.emit(ConversationEvent::Disconnected {
                session_id: session.info.session_id,
                reason: reason.to_string(),
            });
        }
    }
}

/// Forward transport events of one session generation
async fn pump_events(
    inner: Weak<Inner>,
    generation: u64,
    mut events: mpsc::UnboundedReceiver<TransportEvent>,
) {
    while let Some(event) = events.recv().await {
        let Some(inner) = inner.upgrade() else {
            break;
        };
        if !inner.dispatch(generation, event) {
            break;
        }
    }
}

/// Best-effort control send; failures are logged
fn send_control(control: &dyn ControlChannel, payload: &str, kind: &'static str) -> bool {
    if !control.ready_state().is_open() {
        tracing::debug!(kind, "Control channel not open, skipping send");
        return false;
    }
    match control.send(payload) {
        Ok(()) => {
            tracing::debug!(kind, "Control message sent");
            true
        },
        Err(e) => {
            tracing::warn!(error = %e, kind, "Control message failed");
            false
        },
    }
}

/// Clears the connecting flag when `start_voice` returns or is cancelled
struct ConnectingGuard<'a>(&'a AtomicBool);

impl Drop for ConnectingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
