//! Text processing for realtime transcripts
//!
//! Transcript fragments arrive from speech recognition with stray control
//! characters, decomposed accents and irregular spacing. Everything emitted to
//! the application layer goes through [`normalize_transcript`] first.
//!
//! # Example
//!
//! ```
//! use voice_coach_text_processing::normalize_transcript;
//!
//! assert_eq!(normalize_transcript("  I want   a\u{0}coffee "), "I want acoffee");
//! ```

pub mod normalize;

pub use normalize::{is_blank, normalize_optional, normalize_transcript};
