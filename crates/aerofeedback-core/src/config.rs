//! Configuration management for `AeroFeedback` clients

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Retry configuration for the deletion-approval call
    #[serde(default)]
    pub retry: RetryConfig,

    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the REST backend
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout for ordinary requests in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Path of the health endpoint probed before retryable calls
    #[serde(default = "default_health_path")]
    pub health_path: String,

    /// Timeout for the health probe in seconds
    #[serde(default = "default_health_timeout")]
    pub health_timeout_secs: u64,
}

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base backoff delay in milliseconds (doubled after each failed attempt)
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Timeout for a single attempt in seconds
    #[serde(default = "default_attempt_timeout")]
    pub attempt_timeout_secs: u64,
}

/// Authentication configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// File holding the session token; the platform config dir when unset
    #[serde(default)]
    pub token_file: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json or pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

const fn default_request_timeout() -> u64 {
    30
}

fn default_health_path() -> String {
    "/api/health".to_string()
}

const fn default_health_timeout() -> u64 {
    5
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_base_delay_ms() -> u64 {
    1000
}

const fn default_attempt_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
            health_path: default_health_path(),
            health_timeout_secs: default_health_timeout(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            attempt_timeout_secs: default_attempt_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl ApiConfig {
    /// Get the ordinary request timeout as a Duration
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Get the health probe timeout as a Duration
    pub const fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout_secs)
    }
}

impl RetryConfig {
    /// Get the base backoff delay as a Duration
    pub const fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    /// Get the per-attempt timeout as a Duration
    pub const fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.attempt_timeout_secs)
    }
}

impl Config {
    /// Load configuration from `aerofeedback.toml` (optional) and the
    /// environment (`AEROFEEDBACK_API__BASE_URL`, ...).
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded, parsed or validated.
    pub fn load() -> crate::Result<Self> {
        Self::load_from(None)
    }

    /// Like [`Config::load`], reading an explicit file instead of the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, or the result cannot be
    /// parsed or validated.
    pub fn load_from(path: Option<&std::path::Path>) -> crate::Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("aerofeedback").required(false),
        };

        let config: Self = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("AEROFEEDBACK")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Check values that deserialize fine but cannot work.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the offending key.
    pub fn validate(&self) -> crate::Result<()> {
        let base_url = self.api.base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(crate::Error::configuration(format!(
                "api.base_url must be an http(s) URL, got '{base_url}'"
            )));
        }
        if !self.api.health_path.starts_with('/') {
            return Err(crate::Error::configuration(
                "api.health_path must start with '/'",
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(crate::Error::configuration(
                "retry.max_attempts must be at least 1",
            ));
        }
        if !matches!(self.logging.format.as_str(), "json" | "pretty") {
            return Err(crate::Error::configuration(format!(
                "logging.format must be 'json' or 'pretty', got '{}'",
                self.logging.format
            )));
        }
        Ok(())
    }
}
