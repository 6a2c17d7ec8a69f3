//! Configuration management for the voice conversation core
//!
//! Supports loading configuration from:
//! - TOML/YAML files (`config/default`, `config/{env}`)
//! - Environment variables (VOICE_COACH_ prefix, `__` section separator)
//! - Runtime overrides

pub mod constants;
pub mod persona;
pub mod settings;

pub use persona::{Gender, PersonaConfig};
pub use settings::{
    load_settings, load_settings_from, ObservabilityConfig, RealtimeConfig, RuntimeEnvironment,
    SessionConfig, Settings, TurnDetectionSettings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
