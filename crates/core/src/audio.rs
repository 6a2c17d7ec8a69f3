//! Audio capture constraints

use serde::{Deserialize, Serialize};

/// Constraints requested from the local capture device when a session opens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioConstraints {
    /// Enable acoustic echo cancellation
    #[serde(default = "default_true")]
    pub echo_cancellation: bool,
    /// Enable noise suppression
    #[serde(default = "default_true")]
    pub noise_suppression: bool,
    /// Enable automatic gain control
    #[serde(default = "default_true")]
    pub auto_gain_control: bool,
    /// Number of capture channels (1 = mono)
    #[serde(default = "default_channel_count")]
    pub channel_count: u8,
}

fn default_true() -> bool {
    true
}

fn default_channel_count() -> u8 {
    1
}

impl Default for AudioConstraints {
    fn default() -> Self {
        Self {
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: true,
            channel_count: default_channel_count(),
        }
    }
}
