//! CLI error types.

use kfn_config::ConfigError;
use kfn_scheduling::SchedulingError;
use thiserror::Error;

/// Result type for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Error, Debug)]
pub enum CliError {
    /// Cluster configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The spec could not be enriched.
    #[error(transparent)]
    Scheduling(#[from] SchedulingError),

    /// The input document is not a valid resource spec.
    #[error("invalid input: {0}")]
    Input(#[source] serde_json::Error),

    /// Output could not be serialized.
    #[error("format error: {0}")]
    Format(#[source] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduling_error_is_transparent() {
        let err = CliError::from(SchedulingError::InvalidPreemptionMode {
            value: "often".into(),
        });
        assert_eq!(
            err.to_string(),
            "invalid preemption mode 'often', expected one of: allow, constrain, prevent, none"
        );
    }

    #[test]
    fn config_error_is_prefixed() {
        let err = CliError::from(ConfigError::InvalidPreemptionMode {
            value: "often".into(),
        });
        assert!(err.to_string().starts_with("configuration error: "));
    }

    #[test]
    fn cli_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = CliError::from(io_err);
        assert!(matches!(err, CliError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }
}
