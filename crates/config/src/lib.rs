//! Configuration management for the fraud honeypot
//!
//! Supports loading configuration from:
//! - YAML/TOML files under `config/` (`default`, then `{env}`)
//! - Environment variables (`HONEYPOT__` prefix, `__` section separator)

pub mod settings;

pub use settings::{
    load_settings, load_settings_from, AgentSettings, AuthConfig, EnrichmentConfig,
    ObservabilityConfig, RuntimeEnvironment, ServerConfig, SessionConfig, Settings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        match err {
            config::ConfigError::NotFound(key) => ConfigError::MissingField(key),
            other => ConfigError::ParseError(other.to_string()),
        }
    }
}
