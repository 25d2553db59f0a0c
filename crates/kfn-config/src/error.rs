//! Error types for cluster configuration loading.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors raised while loading cluster configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An environment variable is not valid base64.
    #[error("{variable} is not valid base64: {source}")]
    InvalidBase64 {
        /// Variable holding the value.
        variable: String,
        /// Decoder error.
        #[source]
        source: base64::DecodeError,
    },

    /// A value or document is not the expected JSON.
    #[error("invalid JSON in {origin}: {source}")]
    InvalidJson {
        /// Variable name or file the JSON came from.
        origin: String,
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },

    /// The configured default preemption mode is unknown.
    #[error("invalid default preemption mode '{value}', expected one of: allow, constrain, prevent, none")]
    InvalidPreemptionMode {
        /// The rejected value.
        value: String,
    },

    /// A configuration file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// Path of the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
