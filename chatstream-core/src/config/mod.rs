//! Configuration management for chatstream
//!
//! This module provides environment-based configuration management with
//! support for defaults, TOML files and validation.

use serde::{Deserialize, Serialize};
use std::env;

mod error;

pub use error::ConfigError;

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Store layout and host-app flags
    pub sdk: SdkConfig,

    /// Per-chat engine behaviour
    pub chat: ChatConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// SDK-wide settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SdkConfig {
    /// First segment of every store path
    pub root_path: String,

    /// Second segment of every store path, separating environments
    pub sandbox: String,
}

/// Per-chat settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// How many stored sendables the live feed replays on connect. 0 means
    /// no limit.
    pub message_history_limit: usize,

    /// Only replay sendables newer than the local user's last sent one
    pub start_from_last_receipt: bool,

    /// Send delivery receipts from `mark_received` / `mark_read`
    pub delivery_receipts_enabled: bool,

    /// Per-channel buffer of the event hub
    pub event_capacity: usize,

    /// Publish unclassified sendable kinds on the error channel
    pub report_classification_gaps: bool,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON formatting
    pub json_format: bool,

    /// Include timestamps
    pub with_timestamp: bool,

    /// Include target module
    pub with_target: bool,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            root_path: "chatstream".to_string(),
            sandbox: "prod".to_string(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            message_history_limit: 100,
            start_from_last_receipt: true,
            delivery_receipts_enabled: true,
            event_capacity: 256,
            report_classification_gaps: false,
        }
    }
}

impl ChatConfig {
    /// Replay limit as the adapter expects it
    pub fn history_limit(&self) -> Option<usize> {
        (self.message_history_limit > 0).then_some(self.message_history_limit)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            with_timestamp: true,
            with_target: true,
        }
    }
}

fn parse_var<T>(name: &str, what: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::Env {
                var: name.to_string(),
                expected: what.to_string(),
                reason: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Environment variables follow the pattern: CHATSTREAM_<SECTION>_<KEY>
    /// Example: CHATSTREAM_CHAT_MESSAGE_HISTORY_LIMIT=50
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay `CHATSTREAM_*` variables onto this configuration
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        // SDK config
        if let Ok(root) = env::var("CHATSTREAM_SDK_ROOT_PATH") {
            self.sdk.root_path = root;
        }
        if let Ok(sandbox) = env::var("CHATSTREAM_SDK_SANDBOX") {
            self.sdk.sandbox = sandbox;
        }

        // Chat config
        if let Some(limit) = parse_var("CHATSTREAM_CHAT_MESSAGE_HISTORY_LIMIT", "history limit")? {
            self.chat.message_history_limit = limit;
        }
        if let Some(enabled) =
            parse_var("CHATSTREAM_CHAT_START_FROM_LAST_RECEIPT", "last receipt flag")?
        {
            self.chat.start_from_last_receipt = enabled;
        }
        if let Some(enabled) =
            parse_var("CHATSTREAM_CHAT_DELIVERY_RECEIPTS_ENABLED", "delivery receipts flag")?
        {
            self.chat.delivery_receipts_enabled = enabled;
        }
        if let Some(capacity) = parse_var("CHATSTREAM_CHAT_EVENT_CAPACITY", "event capacity")? {
            self.chat.event_capacity = capacity;
        }

        // Logging config
        if let Ok(level) = env::var("CHATSTREAM_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(json) = parse_var("CHATSTREAM_LOG_JSON", "JSON flag")? {
            self.logging.json_format = json;
        }

        Ok(())
    }

    /// Load configuration from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = toml::from_str(&contents)?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate SDK config
        if self.sdk.root_path.trim_matches('/').is_empty() {
            return Err(ConfigError::Invalid("root_path must not be empty".to_string()));
        }

        if self.sdk.sandbox.is_empty() || self.sdk.sandbox.contains('/') {
            return Err(ConfigError::Invalid(format!(
                "sandbox must be a single path segment: {:?}",
                self.sdk.sandbox
            )));
        }

        // Validate chat config
        if self.chat.event_capacity == 0 {
            return Err(ConfigError::Invalid(
                "event_capacity must be greater than 0".to_string(),
            ));
        }

        // Validate logging config
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level: {}",
                self.logging.level
            )));
        }

        Ok(())
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: impl AsRef<std::path::Path>) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;

        let path = path.as_ref();
        std::fs::write(path, contents).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(())
    }
}
