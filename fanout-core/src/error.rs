//! Error types for fanout-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while loading the fleet configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load, with the file path and serde_yaml line context.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The config parsed but holds a value the engine cannot run with.
    #[error("invalid config: {0}")]
    Invalid(String),
}
