//! Transcript accumulation
//!
//! User side: only finals are emitted as messages, and nothing is finalized
//! while the assistant is responding. Assistant side: deltas are concatenated
//! until the final delta or a complete transcript arrives, then normalized and
//! de-duplicated against the previous emission.

use voice_coach_text_processing::normalize_transcript;

/// What to do with one user transcript event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserTranscriptOutcome {
    /// Cross-talk while the assistant responds; drop entirely
    Suppressed,
    /// Forward as a live caption only
    Live,
    /// Forward as a live caption, then emit this utterance and answer it
    Finalized(String),
}

/// Per-speaker transcript buffers
#[derive(Debug, Default)]
pub struct TranscriptAccumulator {
    user_interim: String,
    last_user: Option<String>,
    assistant_partial: String,
    last_assistant: Option<String>,
}

impl TranscriptAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle a user transcript fragment
    pub fn on_user_transcript(
        &mut self,
        text: &str,
        is_final: bool,
        responding: bool,
    ) -> UserTranscriptOutcome {
        if responding {
            tracing::trace!(is_final, "Dropping user transcript during assistant response");
            return UserTranscriptOutcome::Suppressed;
        }

        if !is_final {
            self.user_interim.clear();
            self.user_interim.push_str(text);
            return UserTranscriptOutcome::Live;
        }

        self.user_interim.clear();
        let normalized = normalize_transcript(text);
        if normalized.is_empty() {
            return UserTranscriptOutcome::Live;
        }

        self.last_user = Some(normalized.clone());
        UserTranscriptOutcome::Finalized(normalized)
    }

    /// Handle an assistant text fragment; returns the utterance to emit
    ///
    /// A final fragment is the last delta: it is appended before the buffer
    /// is flushed.
    pub fn on_assistant_text(&mut self, text: &str, is_final: bool) -> Option<String> {
        self.assistant_partial.push_str(text);
        if !is_final {
            return None;
        }

        let partial = std::mem::take(&mut self.assistant_partial);
        self.emit_assistant(normalize_transcript(&partial))
    }

    /// Handle the complete transcript of an assistant utterance
    ///
    /// Replaces the buffered deltas; an empty transcript flushes the buffer.
    pub fn on_assistant_transcript(&mut self, text: &str) -> Option<String> {
        let partial = std::mem::take(&mut self.assistant_partial);
        let full = normalize_transcript(text);
        if full.is_empty() {
            self.emit_assistant(normalize_transcript(&partial))
        } else {
            self.emit_assistant(full)
        }
    }

    fn emit_assistant(&mut self, normalized: String) -> Option<String> {
        if normalized.is_empty() || self.last_assistant.as_deref() == Some(normalized.as_str()) {
            return None;
        }

        self.last_assistant = Some(normalized.clone());
        Some(normalized)
    }

    /// Latest interim user caption not yet finalized
    pub fn user_interim(&self) -> &str {
        &self.user_interim
    }

    pub fn last_user(&self) -> Option<&str> {
        self.last_user.as_deref()
    }

    pub fn last_assistant(&self) -> Option<&str> {
        self.last_assistant.as_deref()
    }

    /// Forget everything, for a new session
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_final_normalized() {
        let mut acc = TranscriptAccumulator::new();

        assert_eq!(acc.on_user_transcript("I want", false, false), UserTranscriptOutcome::Live);
        assert_eq!(acc.user_interim(), "I want");

        assert_eq!(
            acc.on_user_transcript("  I want   a coffee ", true, false),
            UserTranscriptOutcome::Finalized("I want a coffee".to_string())
        );
        assert_eq!(acc.user_interim(), "");
        assert_eq!(acc.last_user(), Some("I want a coffee"));
    }

    #[test]
    fn test_user_cross_talk_suppressed() {
        let mut acc = TranscriptAccumulator::new();
        assert_eq!(acc.on_user_transcript("hello", true, true), UserTranscriptOutcome::Suppressed);
        assert_eq!(acc.on_user_transcript("hel", false, true), UserTranscriptOutcome::Suppressed);
        assert!(acc.last_user().is_none());
    }

    #[test]
    fn test_user_empty_final_dropped() {
        let mut acc = TranscriptAccumulator::new();
        assert_eq!(acc.on_user_transcript("   ", true, false), UserTranscriptOutcome::Live);
        assert_eq!(acc.on_user_transcript("\u{FFFD}\n", true, false), UserTranscriptOutcome::Live);
        assert!(acc.last_user().is_none());
    }

    #[test]
    fn test_assistant_final_carries_last_delta() {
        let mut acc = TranscriptAccumulator::new();
        assert_eq!(acc.on_assistant_text("Sure, ", false), None);
        assert_eq!(
            acc.on_assistant_text("what size would you like?", true),
            Some("Sure, what size would you like?".to_string())
        );
    }

    #[test]
    fn test_assistant_last_delta_repeating_prefix() {
        let mut acc = TranscriptAccumulator::new();
        assert_eq!(acc.on_assistant_text("Ha", false), None);
        assert_eq!(acc.on_assistant_text("Ha!", true), Some("HaHa!".to_string()));
    }

    #[test]
    fn test_assistant_transcript_replaces_deltas() {
        let mut acc = TranscriptAccumulator::new();
        assert_eq!(acc.on_assistant_text("Sure, ", false), None);
        assert_eq!(acc.on_assistant_text("what size would you like?", false), None);
        assert_eq!(
            acc.on_assistant_transcript("Sure, what size would you like?"),
            Some("Sure, what size would you like?".to_string())
        );

        assert_eq!(acc.on_assistant_text("Ha", false), None);
        assert_eq!(acc.on_assistant_transcript("Ha!"), Some("Ha!".to_string()));
    }

    #[test]
    fn test_assistant_empty_transcript_flushes_buffer() {
        let mut acc = TranscriptAccumulator::new();
        acc.on_assistant_text(" Large,  please ", false);
        assert_eq!(acc.on_assistant_transcript(""), Some("Large, please".to_string()));
        assert_eq!(acc.on_assistant_transcript(""), None);
    }

    #[test]
    fn test_assistant_final_fallback() {
        let mut acc = TranscriptAccumulator::new();
        assert_eq!(
            acc.on_assistant_text(" Hello there ", true),
            Some("Hello there".to_string())
        );
    }

    #[test]
    fn test_assistant_duplicate_suppressed() {
        let mut acc = TranscriptAccumulator::new();
        assert_eq!(
            acc.on_assistant_text("Nice to meet you.", true),
            Some("Nice to meet you.".to_string())
        );
        acc.on_assistant_text("Nice to ", false);
        acc.on_assistant_text("meet  you.", false);
        assert_eq!(acc.on_assistant_text("", true), None);

        // Buffer was reset even though nothing was emitted
        assert_eq!(acc.on_assistant_text("Bye!", true), Some("Bye!".to_string()));
    }

    #[test]
    fn test_assistant_empty_final() {
        let mut acc = TranscriptAccumulator::new();
        assert_eq!(acc.on_assistant_text("  ", true), None);
        assert!(acc.last_assistant().is_none());
    }

    #[test]
    fn test_reset() {
        let mut acc = TranscriptAccumulator::new();
        acc.on_assistant_text("Hi", true);
        acc.on_assistant_text("partial", false);
        acc.reset();
        assert!(acc.last_assistant().is_none());
        assert_eq!(acc.on_assistant_text("Hi", true), Some("Hi".to_string()));
    }
}
