//! Centralized constants for the voice conversation core
//!
//! Single source of truth for default values used across the crates.

/// Service endpoints (defaults for local development)
pub mod endpoints {
    /// Backend route that issues short-lived realtime credentials
    pub const CREDENTIAL_DEFAULT: &str = "http://localhost:8080/api/realtime/session";

    /// Realtime WebSocket endpoint
    pub const REALTIME_WS_DEFAULT: &str = "wss://api.openai.com/v1/realtime";

    /// Credential request timeout (ms)
    pub const REQUEST_TIMEOUT_MS: u64 = 10_000;
}

/// Server VAD parameters sent with `session.update`
pub mod turn_detection {
    /// Speech probability threshold
    pub const VAD_THRESHOLD: f32 = 0.5;

    /// Audio kept ahead of detected speech (ms)
    pub const PREFIX_PADDING_MS: u32 = 300;

    /// Silence that marks the end of an utterance (ms)
    pub const SILENCE_DURATION_MS: u32 = 800;
}

/// Response trigger timing
pub mod response {
    /// Wait after a finalized user utterance before requesting a reply (ms)
    pub const DELAY_MS: u64 = 1200;

    /// Upper bound accepted by validation (ms)
    pub const MAX_DELAY_MS: u64 = 10_000;
}

/// Realtime audio format (PCM16 mono)
pub mod audio {
    pub const SAMPLE_RATE: u32 = 24_000;

    /// Capture frame length (ms)
    pub const FRAME_MS: u64 = 20;
}

/// Persona defaults
pub mod persona {
    pub const VOICE: &str = "alloy";

    pub const LANGUAGE: &str = "English";

    pub const LANGUAGE_CODE: &str = "en";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_within_bounds() {
        assert!(response::DELAY_MS <= response::MAX_DELAY_MS);
        assert!((0.0..=1.0).contains(&turn_detection::VAD_THRESHOLD));
    }
}
