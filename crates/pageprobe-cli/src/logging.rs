//! Tracing subscriber setup

use crate::commands::LogFormat;
use crate::config::Verbosity;
use crate::error::{CliError, CliResult};
use tracing_subscriber::EnvFilter;

/// Filter from `RUST_LOG`, falling back to the verbosity's level
fn filter(verbosity: Verbosity) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity.log_filter()))
}

/// Install the global subscriber; logs go to stderr so reports on stdout
/// stay machine-readable
pub fn init(verbosity: Verbosity, format: LogFormat) -> CliResult<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter(verbosity))
        .with_writer(std::io::stderr)
        .with_target(false);
    let installed = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| CliError::logging(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_reports_error() {
        let _ = init(Verbosity::Normal, LogFormat::Text);
        let second = init(Verbosity::Debug, LogFormat::Json);
        assert!(matches!(second, Err(CliError::Logging { .. })));
    }
}
