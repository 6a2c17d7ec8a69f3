//! Realtime voice conversation orchestration
//!
//! Features:
//! - Session lifecycle over an abstract realtime transport
//! - Turn tracking with microphone muting while the assistant speaks
//! - Transcript buffering, normalization and duplicate suppression
//! - Delayed, cancellable response triggering (manual turn detection)
//! - Persona instructions sent with `session.update`

pub mod config;
pub mod conversation;
pub mod error;
pub mod events;
pub mod metrics;
pub mod persona;
pub mod transcript;
pub mod trigger;
pub mod turn;

pub use config::ConversationConfig;
pub use conversation::{SessionInfo, VoiceConversation};
pub use error::ConversationError;
pub use events::{ConversationEvent, TurnState};
pub use persona::{build_instructions, session_update};
pub use transcript::{TranscriptAccumulator, UserTranscriptOutcome};
pub use trigger::ResponseTrigger;
pub use turn::{TurnTracker, TurnUpdate};
