//! Configuration loading.
//!
//! The relay reads the application's shared `~/.dayflow/config.json`
//! (override with `DAYFLOW_CONFIG`). Only the sections below are used;
//! other sections of the file are ignored.
//!
//! ```json
//! {
//!   "webhook": {
//!     "url": "https://hooks.example.com/dayflow",
//!     "headers": {"Authorization": "Bearer ..."},
//!     "sendJson": true,
//!     "sendMarkdown": true,
//!     "requestTimeoutSeconds": 30,
//!     "retryStrategy": {
//!       "initialDelaySeconds": 5,
//!       "maxDelaySeconds": 300,
//!       "multiplier": 2,
//!       "maxAttempts": 10
//!     }
//!   },
//!   "queue": {"directory": "~/.dayflow/queue", "flushIntervalSeconds": 300}
//! }
//! ```
//!
//! Everything except `webhook.url` has a default.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::delivery::RetryPolicy;
use crate::security::{is_valid_header_name, is_valid_header_value};

/// Environment variable naming an alternative config file.
pub const CONFIG_PATH_ENV: &str = "DAYFLOW_CONFIG";

const APP_DIR: &str = ".dayflow";
const CONFIG_FILE: &str = "config.json";
const QUEUE_DIR: &str = "queue";

const DEFAULT_INITIAL_DELAY_SECS: u64 = 5;
const DEFAULT_MAX_DELAY_SECS: u64 = 300;
const DEFAULT_MULTIPLIER: u32 = 2;
const DEFAULT_MAX_ATTEMPTS: u32 = 10;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_FLUSH_INTERVAL_SECS: u64 = 300;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid header name: {0:?}")]
    InvalidHeaderName(String),

    #[error("invalid value for header {key:?}")]
    InvalidHeaderValue { key: String },

    #[error("cannot determine home directory")]
    NoHomeDirectory,
}

/// Result type for configuration loading.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Relay configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub webhook: WebhookConfig,

    #[serde(default)]
    pub queue: QueueConfig,
}

/// Where and how to deliver results.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookConfig {
    pub url: String,

    #[serde(default)]
    pub retry_strategy: RetryStrategy,

    /// Deliver the accepted cards as a JSON array.
    #[serde(default = "default_true")]
    pub send_json: bool,

    /// Deliver a Markdown summary of the accepted cards.
    #[serde(default = "default_true")]
    pub send_markdown: bool,

    /// Extra request headers, e.g. `Authorization`.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_seconds: u64,
}

impl WebhookConfig {
    /// A config for `url` with every other field at its default.
    pub fn new(url: impl Into<String>) -> Self {
        WebhookConfig {
            url: url.into(),
            retry_strategy: RetryStrategy::default(),
            send_json: true,
            send_markdown: true,
            headers: BTreeMap::new(),
            request_timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    fn validate_headers(&self) -> Result<()> {
        for (key, value) in &self.headers {
            if !is_valid_header_name(key) {
                return Err(ConfigError::InvalidHeaderName(key.clone()));
            }
            if !is_valid_header_value(value) {
                return Err(ConfigError::InvalidHeaderValue { key: key.clone() });
            }
        }
        Ok(())
    }
}

/// Backoff settings as written in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetryStrategy {
    pub initial_delay_seconds: u64,
    pub max_delay_seconds: u64,
    pub multiplier: u32,
    pub max_attempts: u32,
}

impl Default for RetryStrategy {
    fn default() -> Self {
        RetryStrategy {
            initial_delay_seconds: DEFAULT_INITIAL_DELAY_SECS,
            max_delay_seconds: DEFAULT_MAX_DELAY_SECS,
            multiplier: DEFAULT_MULTIPLIER,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl From<&RetryStrategy> for RetryPolicy {
    fn from(strategy: &RetryStrategy) -> Self {
        RetryPolicy::new(
            Duration::from_secs(strategy.initial_delay_seconds),
            Duration::from_secs(strategy.max_delay_seconds),
            strategy.multiplier,
            strategy.max_attempts,
        )
    }
}

/// Where undelivered payloads wait, and how often they are retried.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueueConfig {
    /// Queue directory. A leading `~/` expands to the home directory.
    /// Defaults to `~/.dayflow/queue`.
    pub directory: Option<PathBuf>,

    pub flush_interval_seconds: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        QueueConfig {
            directory: None,
            flush_interval_seconds: DEFAULT_FLUSH_INTERVAL_SECS,
        }
    }
}

impl QueueConfig {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_seconds)
    }

    /// The queue directory with `~` expanded.
    pub fn resolve_directory(&self) -> Result<PathBuf> {
        match &self.directory {
            Some(dir) => expand_home(dir),
            None => Ok(app_dir()?.join(QUEUE_DIR)),
        }
    }
}

impl Config {
    /// Parses and validates configuration from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.webhook.validate_headers()?;
        Ok(config)
    }

    /// Loads and validates `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&json)?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Loads from `DAYFLOW_CONFIG`, falling back to `~/.dayflow/config.json`.
    pub fn load_default() -> Result<Self> {
        Self::load(&Self::default_path()?)
    }

    pub fn default_path() -> Result<PathBuf> {
        match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
            _ => Ok(app_dir()?.join(CONFIG_FILE)),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn app_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(APP_DIR))
        .ok_or(ConfigError::NoHomeDirectory)
}

fn expand_home(path: &Path) -> Result<PathBuf> {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .ok_or(ConfigError::NoHomeDirectory),
        Err(_) => Ok(path.to_path_buf()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn minimal_config_gets_defaults() {
        let config = Config::from_json_str(r#"{"webhook": {"url": "https://host/x"}}"#).unwrap();

        assert_eq!(config.webhook.url, "https://host/x");
        assert!(config.webhook.send_json);
        assert!(config.webhook.send_markdown);
        assert!(config.webhook.headers.is_empty());
        assert_eq!(config.webhook.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.webhook.retry_strategy, RetryStrategy::default());
        assert_eq!(config.queue, QueueConfig::default());
        assert_eq!(config.queue.flush_interval(), Duration::from_secs(300));
    }

    #[test]
    fn full_config_parses() {
        let json = r#"{
            "geminiApiKey": "ignored",
            "recording": {"enabled": true},
            "webhook": {
                "url": "https://host/x",
                "headers": {"Authorization": "Bearer abc"},
                "sendJson": false,
                "sendMarkdown": false,
                "requestTimeoutSeconds": 10,
                "retryStrategy": {"initialDelaySeconds": 1, "maxAttempts": 3}
            },
            "queue": {"directory": "/var/tmp/q", "flushIntervalSeconds": 60}
        }"#;
        let config = Config::from_json_str(json).unwrap();

        assert!(!config.webhook.send_json);
        assert!(!config.webhook.send_markdown);
        assert_eq!(config.webhook.headers["Authorization"], "Bearer abc");
        assert_eq!(
            config.webhook.retry_strategy,
            RetryStrategy {
                initial_delay_seconds: 1,
                max_delay_seconds: 300,
                multiplier: 2,
                max_attempts: 3,
            }
        );
        assert_eq!(
            config.queue.resolve_directory().unwrap(),
            PathBuf::from("/var/tmp/q")
        );
    }

    #[test]
    fn missing_url_is_a_parse_error() {
        let err = Config::from_json_str(r#"{"webhook": {}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn invalid_header_name_is_rejected() {
        let json = r#"{"webhook": {"url": "https://host/x", "headers": {"Bad Header": "v"}}}"#;
        let err = Config::from_json_str(json).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidHeaderName(ref name) if name == "Bad Header"));
    }

    #[test]
    fn invalid_header_value_is_rejected() {
        let json = r#"{"webhook": {"url": "https://host/x", "headers": {"X-Token": "a\r\nb"}}}"#;
        let err = Config::from_json_str(json).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidHeaderValue { ref key } if key == "X-Token"));
    }

    #[test]
    fn retry_strategy_converts_to_policy() {
        let policy = RetryPolicy::from(&RetryStrategy::default());
        assert_eq!(policy, RetryPolicy::DEFAULT);
    }

    #[test]
    fn load_reads_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"webhook": {"url": "https://host/x"}}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.webhook.url, "https://host/x");
    }

    #[test]
    fn load_missing_file_names_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("absent.json"));
    }

    #[test]
    fn tilde_expands_to_home() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        let queue = QueueConfig {
            directory: Some(PathBuf::from("~/custom/queue")),
            ..QueueConfig::default()
        };
        assert_eq!(queue.resolve_directory().unwrap(), home.join("custom/queue"));
    }
}
