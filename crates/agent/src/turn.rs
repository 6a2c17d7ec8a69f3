//! Turn tracking
//!
//! Derives the `listening` / `responding` flags from the control event stream
//! and silences the local microphone while the assistant speaks, so the
//! assistant's own playback is never captured as user speech.

use std::sync::Arc;

use voice_coach_core::{AudioSource, RealtimeEvent};

use crate::events::TurnState;

/// Outcome of applying one control event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnUpdate {
    /// The event was a user speech start
    pub speech_started: bool,
    /// The flags changed
    pub changed: bool,
}

/// Tracks speaking turns and owns microphone muting
#[derive(Default)]
pub struct TurnTracker {
    state: TurnState,
    mic: Option<Arc<dyn AudioSource>>,
}

impl TurnTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn is_responding(&self) -> bool {
        self.state.responding
    }

    /// Take control of the session's capture stream
    pub fn attach(&mut self, mic: Arc<dyn AudioSource>) {
        mic.unmute();
        self.mic = Some(mic);
    }

    /// Apply a control event
    pub fn apply(&mut self, event: RealtimeEvent) -> TurnUpdate {
        let before = self.state;

        let speech_started = match event {
            RealtimeEvent::SpeechStarted => {
                self.state.listening = true;
                true
            },
            RealtimeEvent::SpeechStopped => {
                self.state.listening = false;
                false
            },
            RealtimeEvent::AssistantOutputStarted => {
                self.state.responding = true;
                if let Some(mic) = &self.mic {
                    mic.mute();
                }
                false
            },
            RealtimeEvent::AssistantOutputStopped | RealtimeEvent::ResponseComplete => {
                self.state.responding = false;
                if let Some(mic) = &self.mic {
                    mic.unmute();
                }
                false
            },
            RealtimeEvent::Unknown => false,
        };

        TurnUpdate {
            speech_started,
            changed: before != self.state,
        }
    }

    /// Return to idle, re-enable and release the microphone
    pub fn reset(&mut self) {
        self.state = TurnState::default();
        if let Some(mic) = self.mic.take() {
            mic.unmute();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct FakeMic {
        muted: AtomicBool,
    }

    impl AudioSource for FakeMic {
        fn mute(&self) {
            self.muted.store(true, Ordering::SeqCst);
        }

        fn unmute(&self) {
            self.muted.store(false, Ordering::SeqCst);
        }

        fn is_muted(&self) -> bool {
            self.muted.load(Ordering::SeqCst)
        }
    }

    #[test]
    fn test_listening_flags() {
        let mut tracker = TurnTracker::new();

        let update = tracker.apply(RealtimeEvent::SpeechStarted);
        assert!(update.speech_started);
        assert!(update.changed);
        assert!(tracker.state().listening);

        // Repeated start still notifies but changes nothing
        let update = tracker.apply(RealtimeEvent::SpeechStarted);
        assert!(update.speech_started);
        assert!(!update.changed);

        tracker.apply(RealtimeEvent::SpeechStopped);
        assert!(tracker.state().is_idle());
    }

    #[test]
    fn test_mic_muted_while_responding() {
        let mic = Arc::new(FakeMic::default());
        let mut tracker = TurnTracker::new();
        tracker.attach(mic.clone());

        tracker.apply(RealtimeEvent::AssistantOutputStarted);
        assert!(tracker.is_responding());
        assert!(mic.is_muted());

        tracker.apply(RealtimeEvent::AssistantOutputStopped);
        assert!(!tracker.is_responding());
        assert!(!mic.is_muted());

        tracker.apply(RealtimeEvent::AssistantOutputStarted);
        tracker.apply(RealtimeEvent::ResponseComplete);
        assert!(!mic.is_muted());
    }

    #[test]
    fn test_unknown_ignored() {
        let mut tracker = TurnTracker::new();
        assert_eq!(tracker.apply(RealtimeEvent::Unknown), TurnUpdate::default());
    }

    #[test]
    fn test_reset_restores_mic() {
        let mic = Arc::new(FakeMic::default());
        let mut tracker = TurnTracker::new();
        tracker.attach(mic.clone());
        tracker.apply(RealtimeEvent::SpeechStarted);
        tracker.apply(RealtimeEvent::AssistantOutputStarted);

        tracker.reset();
        assert!(tracker.state().is_idle());
        assert!(!mic.is_muted());

        // Detached: later events no longer touch the device
        tracker.apply(RealtimeEvent::AssistantOutputStarted);
        assert!(!mic.is_muted());
    }
}
