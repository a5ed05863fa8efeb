//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use honeypot_core::EngagementPolicy;

use crate::ConfigError;

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
    /// Check if strict validation should be applied
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Session store limits
    #[serde(default)]
    pub session: SessionConfig,

    /// External enrichment (LLM extraction) configuration
    #[serde(default)]
    pub enrichment: EnrichmentConfig,

    /// Engagement scoring policy
    #[serde(default)]
    pub engagement: EngagementPolicy,

    /// Turn pipeline behaviour
    #[serde(default)]
    pub agent: AgentSettings,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    /// Validate all sections
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_session()?;
        self.validate_enrichment()?;
        self.validate_engagement()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        let server = &self.server;

        if server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        if server.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.timeout_seconds".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if server.auth.enabled && server.auth.api_key.as_deref().map_or(true, str::is_empty) {
            return Err(ConfigError::MissingField("server.auth.api_key".to_string()));
        }

        if self.environment.is_strict() && !server.auth.enabled {
            tracing::warn!(environment = ?self.environment, "API authentication is disabled outside development");
        }

        Ok(())
    }

    fn validate_session(&self) -> Result<(), ConfigError> {
        let session = &self.session;

        if session.max_sessions == 0 {
            return Err(ConfigError::InvalidValue {
                field: "session.max_sessions".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if session.idle_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "session.idle_timeout_secs".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if session.cleanup_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "session.cleanup_interval_secs".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    fn validate_enrichment(&self) -> Result<(), ConfigError> {
        let enrichment = &self.enrichment;
        if !enrichment.enabled {
            return Ok(());
        }

        if enrichment.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "enrichment.timeout_ms".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        // A turn must finish before the HTTP timeout answers 408 for it
        if enrichment.timeout_ms >= self.server.timeout_seconds.saturating_mul(1000) {
            return Err(ConfigError::InvalidValue {
                field: "enrichment.timeout_ms".to_string(),
                message: format!(
                    "Must be below server.timeout_seconds ({}s)",
                    self.server.timeout_seconds
                ),
            });
        }

        if enrichment.api_key.is_some() && enrichment.endpoint.trim().is_empty() {
            return Err(ConfigError::MissingField("enrichment.endpoint".to_string()));
        }

        if enrichment.api_key.is_none() {
            tracing::info!("Enrichment enabled but no API key configured, regex extraction only");
        }

        Ok(())
    }

    fn validate_engagement(&self) -> Result<(), ConfigError> {
        let policy = &self.engagement;

        for (field, value) in [
            ("engagement.per_turn_estimate_secs", policy.per_turn_estimate_secs),
            ("engagement.min_duration_secs", policy.min_duration_secs),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: format!("Must be a non-negative number, got {}", value),
                });
            }
        }

        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// CORS allowed origins
    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default)]
    pub auth: AuthConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_seconds: default_timeout(),
            cors_enabled: default_true(),
            cors_origins: Vec::new(),
            auth: AuthConfig::default(),
        }
    }
}

/// API key authentication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Accepted via `x-api-key` or `Authorization: Bearer`.
    /// Falls back to the `HONEYPOT_API_KEY` environment variable.
    #[serde(default = "default_api_key")]
    pub api_key: Option<String>,

    /// Paths that bypass authentication
    #[serde(default = "default_public_paths")]
    pub public_paths: Vec<String>,
}

fn default_api_key() -> Option<String> {
    std::env::var("HONEYPOT_API_KEY").ok().filter(|k| !k.is_empty())
}

fn default_public_paths() -> Vec<String> {
    vec![
        "/health".to_string(),
        "/ready".to_string(),
        "/metrics".to_string(),
    ]
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: default_api_key(),
            public_paths: default_public_paths(),
        }
    }
}

/// Session store limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Live sessions before the least recently active one is evicted
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Idle time after which a session expires
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// How often the cleanup task sweeps expired sessions
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_secs: u64,
}

fn default_max_sessions() -> usize {
    10_000
}

fn default_idle_timeout() -> u64 {
    3600
}

fn default_cleanup_interval() -> u64 {
    300
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_sessions: default_max_sessions(),
            idle_timeout_secs: default_idle_timeout(),
            cleanup_interval_secs: default_cleanup_interval(),
        }
    }
}

/// LLM enrichment configuration (OpenAI-compatible chat completions)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    /// Only takes effect when an API key is present
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_enrichment_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_enrichment_model")]
    pub model: String,

    /// Falls back to the `DEEPSEEK_API_KEY` environment variable
    #[serde(default = "default_enrichment_api_key")]
    pub api_key: Option<String>,

    /// Upper bound for a single enrichment call
    #[serde(default = "default_enrichment_timeout")]
    pub timeout_ms: u64,

    /// Texts of this many characters or fewer are not sent
    #[serde(default = "default_min_text_len")]
    pub min_text_len: usize,
}

fn default_enrichment_endpoint() -> String {
    "https://api.deepseek.com".to_string()
}

fn default_enrichment_model() -> String {
    std::env::var("DEEPSEEK_MODEL").unwrap_or_else(|_| "deepseek-chat".to_string())
}

fn default_enrichment_api_key() -> Option<String> {
    std::env::var("DEEPSEEK_API_KEY").ok().filter(|k| !k.is_empty())
}

fn default_enrichment_timeout() -> u64 {
    8000
}

fn default_min_text_len() -> usize {
    20
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            endpoint: default_enrichment_endpoint(),
            model: default_enrichment_model(),
            api_key: default_enrichment_api_key(),
            timeout_ms: default_enrichment_timeout(),
            min_text_len: default_min_text_len(),
        }
    }
}

impl EnrichmentConfig {
    /// Enabled and has credentials
    pub fn is_active(&self) -> bool {
        self.enabled && self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

/// Turn pipeline behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Every inbound conversation is treated as fraudulent
    #[serde(default = "default_true")]
    pub assume_fraud: bool,

    /// Turns beyond this reuse the last reply template pool
    #[serde(default = "default_max_template_turn")]
    pub max_template_turn: u32,

    /// Words that make a bare 10-11 digit run count as a bank account.
    /// Empty keeps the built-in list.
    #[serde(default)]
    pub banking_vocabulary: Vec<String>,
}

fn default_max_template_turn() -> u32 {
    10
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            assume_fraud: default_true(),
            max_template_turn: default_max_template_turn(),
            banking_vocabulary: Vec::new(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON log lines
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

/// Load settings from `config/` and the environment.
///
/// Priority: env vars > `config/{env}` > `config/default` > defaults
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from(Path::new("config"), env)
}

/// Load settings from a specific configuration directory
pub fn load_settings_from(dir: &Path, env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name(&dir.join("default").to_string_lossy()).required(false));

    if let Some(env_name) = env {
        builder = builder
            .add_source(File::with_name(&dir.join(env_name).to_string_lossy()).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("HONEYPOT")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}
