//! Configuration management for VERIFY
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default, config/{APP_ENV}, config/local)
//! - Default values
//!
//! The model API key additionally falls back to `GEMINI_API_KEY`.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable consulted when `model.api_key` is not configured
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// External model configuration
    #[serde(default)]
    pub model: ModelConfig,

    /// History endpoint configuration
    #[serde(default)]
    pub history: HistoryConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum accepted request body (uploads included), in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

/// Where analysis records live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// SQLite database file on disk
    File,
    /// Ephemeral SQLite database, lost on restart
    Memory,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_backend")]
    pub backend: StorageBackend,

    /// Database file path (file backend only)
    #[serde(default = "default_storage_path")]
    pub path: String,

    /// Maximum number of pooled connections (file backend only)
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelConfig {
    /// Model provider: gemini, mock
    #[serde(default = "default_model_provider")]
    pub provider: String,

    /// API key for the generative model
    pub api_key: Option<String>,

    /// API base URL (for custom endpoints)
    pub api_base: Option<String>,

    /// Model used for analysis requests
    #[serde(default = "default_model_name")]
    pub model: String,

    /// Model used for the chat assistant
    #[serde(default = "default_model_name")]
    pub chat_model: String,

    /// Request timeout in seconds; unset leaves the client default
    pub timeout_secs: Option<u64>,

    /// Substitute canned demo results when the model reports quota exhaustion
    #[serde(default = "default_demo_fallback")]
    pub demo_fallback: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HistoryConfig {
    /// Rows returned when the client does not ask for a limit
    #[serde(default = "default_history_limit")]
    pub default_limit: u64,

    /// Upper bound on the limit a client may ask for
    #[serde(default = "default_history_max_limit")]
    pub max_limit: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level or filter directive (debug, info, verify_gateway=debug, ...)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Prometheus metrics port (0 to disable)
    #[serde(default)]
    pub metrics_port: u16,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 5000 }
fn default_max_upload_bytes() -> usize { 50 * 1024 * 1024 }
fn default_storage_backend() -> StorageBackend { StorageBackend::File }
fn default_storage_path() -> String { "verify.db".to_string() }
fn default_max_connections() -> u32 { 5 }
fn default_model_provider() -> String { "gemini".to_string() }
fn default_model_name() -> String { crate::DEFAULT_MODEL.to_string() }
fn default_demo_fallback() -> bool { true }
fn default_history_limit() -> u64 { 20 }
fn default_history_max_limit() -> u64 { 50 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { false }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            path: default_storage_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl StorageConfig {
    /// Ephemeral storage, used by tests and the stateless deployment
    pub fn in_memory() -> Self {
        Self {
            backend: StorageBackend::Memory,
            ..Self::default()
        }
    }

    /// Connection URL understood by SeaORM
    pub fn url(&self) -> String {
        match self.backend {
            StorageBackend::File => format!("sqlite://{}?mode=rwc", self.path),
            StorageBackend::Memory => "sqlite::memory:".to_string(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: default_model_provider(),
            api_key: None,
            api_base: None,
            model: default_model_name(),
            chat_model: default_model_name(),
            timeout_secs: None,
            demo_fallback: default_demo_fallback(),
        }
    }
}

impl ModelConfig {
    /// Request timeout, if one is configured
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            default_limit: default_history_limit(),
            max_limit: default_history_max_limit(),
        }
    }
}

impl HistoryConfig {
    /// Resolve a client-requested limit into the allowed range
    pub fn clamp(&self, requested: Option<u64>) -> u64 {
        requested
            .unwrap_or(self.default_limit)
            .clamp(1, self.max_limit.max(1))
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_port: 0,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__SERVER__PORT=8081
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )

            .build()?;

        let mut config: AppConfig = config.try_deserialize()?;
        config.apply_api_key_fallback(std::env::var(API_KEY_ENV).ok());
        Ok(config)
    }

    /// Load from a specific file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        let mut config: AppConfig = config.try_deserialize()?;
        config.apply_api_key_fallback(std::env::var(API_KEY_ENV).ok());
        Ok(config)
    }

    fn apply_api_key_fallback(&mut self, env_key: Option<String>) {
        if self.model.api_key.as_deref().map_or(true, str::is_empty) {
            self.model.api_key = env_key.filter(|k| !k.is_empty());
        }
    }

    /// Address string the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            model: ModelConfig::default(),
            history: HistoryConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}
