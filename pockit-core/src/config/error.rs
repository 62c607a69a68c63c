//! Errors raised while loading, validating or saving a [`Config`](super::Config)

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write config file {}", path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed config file")]
    Parse(#[from] toml::de::Error),

    #[error("cannot encode config")]
    Serialize(#[from] toml::ser::Error),

    /// An environment override did not parse
    #[error("invalid value for {key}: {reason}")]
    InvalidOverride { key: &'static str, reason: String },

    #[error("invalid config: {0}")]
    Invalid(String),
}
