//! Errors raised while loading, checking or saving a chatstream configuration

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot write config file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot render config as TOML: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("{var} is not a valid {expected}: {reason}")]
    Env {
        var: String,
        expected: String,
        reason: String,
    },

    #[error("invalid chat configuration: {0}")]
    Invalid(String),
}
