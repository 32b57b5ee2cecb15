//! Pageprobe CLI library
//!
//! Command-line front end for running the Buggy Cars Rating suites.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
pub mod logging;
mod output;
mod runner;

pub use commands::{Cli, ColorArg, Commands, ConfigArgs, ConfigSource, ListArgs, LogFormat, RunArgs};
pub use config::{resolve_suite_config, CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{scenario_table, ProgressReporter};
pub use runner::{known_suites, plan, SuiteRunner};
