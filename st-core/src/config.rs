//! Client configuration management.
//!
//! Handles loading, saving, and accessing the API credentials, endpoint,
//! transport selection, and logging preferences. Configuration is persisted
//! as TOML on disk.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{StError, StResult};
use crate::platform::Platform;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// API connection settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which transport strategy the client uses. Chosen once, at construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Full-featured HTTP client (TLS, multipart uploads).
    #[default]
    Http,
    /// Fallback over a raw byte stream. Plain http only, no uploads.
    Stream,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Http => f.write_str("http"),
            TransportKind::Stream => f.write_str("stream"),
        }
    }
}

/// API connection configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Public API key, sent with every request.
    #[serde(default)]
    pub api_key: String,

    /// Shared secret used for signing. Never transmitted.
    #[serde(default)]
    pub api_secret: String,

    /// Endpoint base (e.g., "https://api.sailthru.com").
    #[serde(default = "default_api_uri")]
    pub api_uri: String,

    /// Transport strategy.
    #[serde(default)]
    pub transport: TransportKind,

    /// Whole-request timeout in milliseconds.
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,

    /// Connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// User-Agent header value.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Extra HTTP headers as key-value pairs.
    #[serde(default)]
    pub custom_headers: HashMap<String, String>,
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("api_uri", &self.api_uri)
            .field("transport", &self.transport)
            .field("timeout_ms", &self.timeout_ms)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("user_agent", &self.user_agent)
            .field("custom_headers", &self.custom_headers)
            .finish()
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for log files. If empty, uses default location.
    #[serde(default)]
    pub directory: String,

    /// Enable JSON structured logging output.
    #[serde(default)]
    pub json_output: bool,
}

/// API key and secret, immutable for the lifetime of a client.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    api_key: String,
    api_secret: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn api_secret(&self) -> &str {
        &self.api_secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

impl From<&ApiConfig> for Credentials {
    fn from(config: &ApiConfig) -> Self {
        Credentials::new(config.api_key.clone(), config.api_secret.clone())
    }
}

// Default value functions for serde

fn default_api_uri() -> String {
    constants::DEFAULT_API_URI.to_string()
}

fn default_timeout() -> u64 {
    constants::DEFAULT_TIMEOUT_MS
}

fn default_connect_timeout() -> u64 {
    constants::DEFAULT_CONNECT_TIMEOUT_MS
}

fn default_user_agent() -> String {
    constants::DEFAULT_USER_AGENT.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_secret: String::new(),
            api_uri: default_api_uri(),
            transport: TransportKind::default(),
            timeout_ms: default_timeout(),
            connect_timeout_ms: default_connect_timeout(),
            user_agent: default_user_agent(),
            custom_headers: HashMap::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: String::new(),
            json_output: false,
        }
    }
}

impl ApiConfig {
    /// Config with credentials and endpoint set, everything else default.
    pub fn new(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        api_uri: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            api_uri: api_uri.into(),
            ..Self::default()
        }
    }

    /// Check that credentials and endpoint are present.
    pub fn validate(&self) -> StResult<()> {
        if self.api_key.is_empty() {
            return Err(StError::MissingConfig("api.api_key".into()));
        }
        if self.api_secret.is_empty() {
            return Err(StError::MissingConfig("api.api_secret".into()));
        }
        if Self::sanitize_api_uri(&self.api_uri).is_empty() {
            return Err(StError::MissingConfig("api.api_uri".into()));
        }
        Ok(())
    }

    /// Sanitize and normalize an endpoint base.
    ///
    /// Trims whitespace and quotes, defaults to https when no scheme is
    /// given, and strips trailing slashes so actions can be appended.
    pub fn sanitize_api_uri(uri: &str) -> String {
        let trimmed = uri.trim().trim_matches('"').trim();
        if trimmed.is_empty() {
            return String::new();
        }

        let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("https://{trimmed}")
        };

        with_scheme.trim_end_matches('/').to_string()
    }
}

impl LoggingConfig {
    /// Get the effective log directory, using the configured path or the default.
    pub fn effective_directory(&self) -> StResult<PathBuf> {
        if self.directory.is_empty() {
            Ok(Platform::data_dir()?.join("logs"))
        } else {
            Ok(PathBuf::from(&self.directory))
        }
    }
}

impl AppConfig {
    /// Load configuration from the default config file path.
    pub fn load_default() -> StResult<Self> {
        let path = Self::default_config_path()?;
        if path.exists() {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &Path) -> StResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a specific file path.
    pub fn save_to_file(&self, path: &Path) -> StResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| StError::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> StResult<PathBuf> {
        Ok(Platform::config_dir()?.join("config.toml"))
    }

    /// Check whether the API credentials are configured.
    pub fn is_api_configured(&self) -> bool {
        self.api.validate().is_ok()
    }
}
