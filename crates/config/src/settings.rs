//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use voice_coach_core::AudioConstraints;

use crate::constants::{endpoints, persona, response, turn_detection};
use crate::{ConfigError, PersonaConfig};

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    #[default]
    Development,
    Staging,
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Runtime environment (development, staging, production)
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// Realtime service endpoints
    #[serde(default)]
    pub realtime: RealtimeConfig,

    /// Conversation session behavior
    #[serde(default)]
    pub session: SessionConfig,

    /// Persona used when a conversation starts
    #[serde(default)]
    pub persona: PersonaConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Realtime service endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Credential issuer URL
    #[serde(default = "default_credential_endpoint")]
    pub credential_endpoint: String,

    /// Realtime WebSocket base URL
    #[serde(default = "default_realtime_url")]
    pub realtime_url: String,

    /// Credential request timeout (ms)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_credential_endpoint() -> String {
    endpoints::CREDENTIAL_DEFAULT.to_string()
}

fn default_realtime_url() -> String {
    endpoints::REALTIME_WS_DEFAULT.to_string()
}

fn default_request_timeout_ms() -> u64 {
    endpoints::REQUEST_TIMEOUT_MS
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            credential_endpoint: default_credential_endpoint(),
            realtime_url: default_realtime_url(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// Conversation session behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Language code sent to the credential issuer
    #[serde(default = "default_language")]
    pub language: String,

    /// Delay between a finalized user utterance and the response request (ms)
    #[serde(default = "default_response_delay_ms")]
    pub response_delay_ms: u64,

    /// Server VAD parameters
    #[serde(default)]
    pub turn_detection: TurnDetectionSettings,

    /// Local capture constraints
    #[serde(default)]
    pub audio: AudioConstraints,
}

fn default_language() -> String {
    persona::LANGUAGE_CODE.to_string()
}

fn default_response_delay_ms() -> u64 {
    response::DELAY_MS
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            response_delay_ms: default_response_delay_ms(),
            turn_detection: TurnDetectionSettings::default(),
            audio: AudioConstraints::default(),
        }
    }
}

/// Server VAD parameters (response creation is always manual)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TurnDetectionSettings {
    #[serde(default = "default_threshold")]
    pub threshold: f32,

    #[serde(default = "default_prefix_padding_ms")]
    pub prefix_padding_ms: u32,

    #[serde(default = "default_silence_duration_ms")]
    pub silence_duration_ms: u32,
}

fn default_threshold() -> f32 {
    turn_detection::VAD_THRESHOLD
}

fn default_prefix_padding_ms() -> u32 {
    turn_detection::PREFIX_PADDING_MS
}

fn default_silence_duration_ms() -> u32 {
    turn_detection::SILENCE_DURATION_MS
}

impl Default for TurnDetectionSettings {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            prefix_padding_ms: default_prefix_padding_ms(),
            silence_duration_ms: default_silence_duration_ms(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

impl Settings {
    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_realtime()?;
        self.validate_session()?;
        self.validate_persona()?;
        Ok(())
    }

    fn validate_realtime(&self) -> Result<(), ConfigError> {
        let realtime = &self.realtime;

        if !(realtime.credential_endpoint.starts_with("http://")
            || realtime.credential_endpoint.starts_with("https://"))
        {
            return Err(ConfigError::InvalidValue {
                field: "realtime.credential_endpoint".to_string(),
                message: format!("Must be an http(s) URL, got '{}'", realtime.credential_endpoint),
            });
        }

        if !(realtime.realtime_url.starts_with("ws://")
            || realtime.realtime_url.starts_with("wss://"))
        {
            return Err(ConfigError::InvalidValue {
                field: "realtime.realtime_url".to_string(),
                message: format!("Must be a ws(s) URL, got '{}'", realtime.realtime_url),
            });
        }

        if realtime.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "realtime.request_timeout_ms".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    fn validate_session(&self) -> Result<(), ConfigError> {
        let session = &self.session;

        if session.response_delay_ms > response::MAX_DELAY_MS {
            return Err(ConfigError::InvalidValue {
                field: "session.response_delay_ms".to_string(),
                message: format!(
                    "Response delay too high (maximum {}ms), got {}",
                    response::MAX_DELAY_MS,
                    session.response_delay_ms
                ),
            });
        }

        if !(0.0..=1.0).contains(&session.turn_detection.threshold) {
            return Err(ConfigError::InvalidValue {
                field: "session.turn_detection.threshold".to_string(),
                message: format!(
                    "Must be between 0.0 and 1.0, got {}",
                    session.turn_detection.threshold
                ),
            });
        }

        if session.turn_detection.silence_duration_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "session.turn_detection.silence_duration_ms".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if !(1..=2).contains(&session.audio.channel_count) {
            return Err(ConfigError::InvalidValue {
                field: "session.audio.channel_count".to_string(),
                message: format!("Must be 1 or 2, got {}", session.audio.channel_count),
            });
        }

        if session.language.trim().is_empty() {
            return Err(ConfigError::MissingField("session.language".to_string()));
        }

        Ok(())
    }

    fn validate_persona(&self) -> Result<(), ConfigError> {
        if self.persona.name.trim().is_empty() {
            return Err(ConfigError::MissingField("persona.name".to_string()));
        }
        if self.persona.voice.trim().is_empty() {
            return Err(ConfigError::MissingField("persona.voice".to_string()));
        }
        Ok(())
    }
}

/// Load settings from `config/` in the working directory
///
/// Priority: env vars > config/{env} > config/default > defaults
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from(Path::new("config"), env)
}

/// Load settings from a specific configuration directory
pub fn load_settings_from(dir: &Path, env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    // Load default config
    let default_path = dir.join("default");
    builder = builder.add_source(File::with_name(&default_path.to_string_lossy()).required(false));

    // Load environment-specific config
    if let Some(env_name) = env {
        let env_path = dir.join(env_name);
        builder = builder.add_source(File::with_name(&env_path.to_string_lossy()).required(false));
    }

    // Load from environment variables
    builder = builder.add_source(
        Environment::with_prefix("VOICE_COACH")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    tracing::debug!(
        config_dir = %dir.display(),
        env = env.unwrap_or("default"),
        "Settings loaded"
    );

    Ok(settings)
}
