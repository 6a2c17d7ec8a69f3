//! Local microphone capture track
//!
//! The application feeds PCM16 frames from its capture device into a
//! [`CaptureTrack`]; the connection writer drains them into
//! `input_audio_buffer.append` messages. Muting disables the track, so frames
//! pushed while muted never leave the process.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::mpsc;

use voice_coach_core::{AudioConstraints, AudioSource};

/// Frames buffered between the capture device and the writer task
pub const FRAME_QUEUE_DEPTH: usize = 64;

/// Capture track of one connection
pub struct CaptureTrack {
    enabled: AtomicBool,
    constraints: AudioConstraints,
    frames: mpsc::Sender<Vec<i16>>,
    dropped: AtomicU64,
}

impl CaptureTrack {
    /// Create an enabled track and the receiver the writer drains
    pub fn new(constraints: AudioConstraints) -> (Self, mpsc::Receiver<Vec<i16>>) {
        let (frames, rx) = mpsc::channel(FRAME_QUEUE_DEPTH);
        let track = Self {
            enabled: AtomicBool::new(true),
            constraints,
            frames,
            dropped: AtomicU64::new(0),
        };
        (track, rx)
    }

    pub fn constraints(&self) -> AudioConstraints {
        self.constraints
    }

    /// Queue a captured frame
    ///
    /// Returns false when the frame was dropped (muted, queue full or closed).
    pub fn push_frame(&self, frame: Vec<i16>) -> bool {
        if !self.enabled.load(Ordering::Acquire) || frame.is_empty() {
            return false;
        }

        match self.frames.try_send(frame) {
            Ok(()) => true,
            Err(_) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                if dropped % 100 == 1 {
                    tracing::warn!(dropped, "Capture queue full or closed, dropping frames");
                }
                false
            },
        }
    }

    /// Frames dropped because the queue was full or closed
    pub fn dropped_frames(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl AudioSource for CaptureTrack {
    fn mute(&self) {
        if self.enabled.swap(false, Ordering::AcqRel) {
            tracing::trace!("Capture track disabled");
        }
    }

    fn unmute(&self) {
        if !self.enabled.swap(true, Ordering::AcqRel) {
            tracing::trace!("Capture track enabled");
        }
    }

    fn is_muted(&self) -> bool {
        !self.enabled.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for CaptureTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureTrack")
            .field("muted", &self.is_muted())
            .field("constraints", &self.constraints)
            .finish()
    }
}
