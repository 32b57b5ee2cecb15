//! Result and error types for Pageprobe.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for Pageprobe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors that can occur while driving a page
#[derive(Debug, Error)]
pub enum ProbeError {
    /// A wait condition was never satisfied within its budget
    #[error("Timed out after {ms}ms waiting for {selector} to be {condition}")]
    Timeout {
        /// Selector (or description) that was waited on
        selector: String,
        /// Condition description
        condition: String,
        /// Timeout budget in milliseconds
        ms: u64,
    },

    /// The automation layer itself failed (disconnected, stale handle, protocol fault)
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Extracted text did not have the expected shape
    #[error("Could not parse {what} from {input:?}")]
    Parse {
        /// What was being parsed
        what: String,
        /// The offending input
        input: String,
    },

    /// An intent was invoked in a page state where it is not valid
    #[error("Precondition failed: {message}")]
    Precondition {
        /// Error message
        message: String,
    },

    /// A scenario check failed
    #[error("Assertion failed: {message}")]
    Assertion {
        /// Error message
        message: String,
    },

    /// Invalid or unreadable configuration
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

/// Coarse classification of a [`ProbeError`], reported next to failed scenarios
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Condition never satisfied
    Timeout,
    /// Automation layer malfunction
    Driver,
    /// Unexpected text shape
    Parse,
    /// Intent called in the wrong state
    Precondition,
    /// Scenario check failed
    Assertion,
    /// Configuration, fixture or filesystem problem
    Setup,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Timeout => "timeout",
            Self::Driver => "driver",
            Self::Parse => "parse",
            Self::Precondition => "precondition",
            Self::Assertion => "assertion",
            Self::Setup => "setup",
        };
        f.write_str(name)
    }
}

impl ProbeError {
    /// Create a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Create a parse error
    #[must_use]
    pub fn parse(what: impl Into<String>, input: impl Into<String>) -> Self {
        Self::Parse {
            what: what.into(),
            input: input.into(),
        }
    }

    /// Create a precondition error
    #[must_use]
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition {
            message: message.into(),
        }
    }

    /// Create an assertion error
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Classify this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Driver { .. } => ErrorKind::Driver,
            Self::Parse { .. } => ErrorKind::Parse,
            Self::Precondition { .. } => ErrorKind::Precondition,
            Self::Assertion { .. } => ErrorKind::Assertion,
            Self::Config { .. } | Self::Io(_) | Self::Json(_) | Self::Yaml(_) => ErrorKind::Setup,
        }
    }

    /// Whether a handle was used after its element went away
    #[must_use]
    pub fn is_stale_reference(&self) -> bool {
        matches!(self, Self::Driver { message } if message.starts_with("stale element reference"))
    }

    /// Whether this error came from a wait that ran out of time
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Fail the current scenario step with an assertion error unless `condition` holds
pub fn ensure(condition: bool, message: impl Into<String>) -> ProbeResult<()> {
    if condition {
        Ok(())
    } else {
        Err(ProbeError::assertion(message))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_names_selector_and_condition() {
        let err = ProbeError::Timeout {
            selector: "span.nav-link.disabled".to_string(),
            condition: "visible".to_string(),
            ms: 5000,
        };
        let msg = err.to_string();
        assert!(msg.contains("span.nav-link.disabled"));
        assert!(msg.contains("visible"));
        assert!(msg.contains("5000ms"));
    }

    #[test]
    fn test_kind_classification() {
        assert_eq!(ProbeError::driver("gone").kind(), ErrorKind::Driver);
        assert_eq!(ProbeError::parse("votes", "x").kind(), ErrorKind::Parse);
        assert_eq!(
            ProbeError::precondition("not ready").kind(),
            ErrorKind::Precondition
        );
        assert_eq!(ProbeError::assertion("nope").kind(), ErrorKind::Assertion);
        assert_eq!(ProbeError::config("bad").kind(), ErrorKind::Setup);
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert_eq!(ProbeError::from(io).kind(), ErrorKind::Setup);
    }

    #[test]
    fn test_is_timeout() {
        let err = ProbeError::Timeout {
            selector: "a".to_string(),
            condition: "present".to_string(),
            ms: 1,
        };
        assert!(err.is_timeout());
        assert!(!ProbeError::driver("x").is_timeout());
    }

    #[test]
    fn test_is_stale_reference() {
        assert!(ProbeError::driver("stale element reference: td[0]").is_stale_reference());
        assert!(!ProbeError::driver("no active session").is_stale_reference());
        assert!(!ProbeError::precondition("stale element reference").is_stale_reference());
    }

    #[test]
    fn test_ensure() {
        assert!(ensure(true, "fine").is_ok());
        let err = ensure(false, "votes did not increase").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Assertion);
        assert!(err.to_string().contains("votes did not increase"));
    }

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::Timeout.to_string(), "timeout");
        assert_eq!(ErrorKind::Precondition.to_string(), "precondition");
    }
}
