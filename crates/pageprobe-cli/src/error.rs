//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Pageprobe library error
    #[error("{0}")]
    Probe(#[from] pageprobe::ProbeError),

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// The run finished but some scenarios failed
    #[error("{failed} of {total} scenarios failed")]
    ScenariosFailed {
        /// Failed scenarios
        failed: usize,
        /// Scenarios run
        total: usize,
    },

    /// Logging could not be installed
    #[error("Logging setup failed: {message}")]
    Logging {
        /// Error message
        message: String,
    },

    /// The binary was built without browser support
    #[error("Browser support not enabled. Rebuild with --features browser")]
    BrowserUnavailable,
}

impl CliError {
    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a logging setup error
    #[must_use]
    pub fn logging(message: impl Into<String>) -> Self {
        Self::Logging {
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument_error() {
        let err = CliError::invalid_argument("unknown suite");
        assert!(err.to_string().contains("Invalid argument"));
        assert!(err.to_string().contains("unknown suite"));
    }

    #[test]
    fn test_probe_error_passes_through() {
        let err: CliError = pageprobe::ProbeError::config("bad base_url").into();
        assert_eq!(err.to_string(), "Configuration error: bad base_url");
    }

    #[test]
    fn test_scenarios_failed_message() {
        let err = CliError::ScenariosFailed { failed: 2, total: 7 };
        assert_eq!(err.to_string(), "2 of 7 scenarios failed");
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let cli_err: CliError = io_err.into();
        assert!(cli_err.to_string().contains("I/O"));
    }
}
