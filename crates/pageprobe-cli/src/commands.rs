//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Pageprobe: end-to-end suites for the Buggy Cars Rating site
#[derive(Parser, Debug)]
#[command(name = "pageprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Log line format
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run scenario suites against a real browser
    Run(RunArgs),

    /// List built-in scenarios
    List(ListArgs),

    /// Print the resolved configuration as YAML
    Config(ConfigArgs),
}

/// Settings shared by every command that reads the suite configuration
#[derive(Parser, Debug, Clone, Default)]
pub struct ConfigSource {
    /// Suite configuration file (YAML)
    #[arg(short, long, env = "PAGEPROBE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Application root, overrides the configuration file
    #[arg(long, env = "PAGEPROBE_BASE_URL")]
    pub base_url: Option<String>,

    /// Maximum concurrent browser sessions
    #[arg(short = 'j', long)]
    pub max_instances: Option<usize>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Configuration source and overrides
    #[command(flatten)]
    pub source: ConfigSource,

    /// Only run scenarios of this suite (auth, voting, comments, info)
    #[arg(short, long)]
    pub suite: Option<String>,

    /// Only run scenarios whose name contains this text
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Write the JSON report to this file
    #[arg(short, long)]
    pub report: Option<PathBuf>,
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Only list scenarios of this suite
    #[arg(short, long)]
    pub suite: Option<String>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Configuration source and overrides
    #[command(flatten)]
    pub source: ConfigSource,
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod parse_tests {
        use super::*;

        #[test]
        fn test_run_with_filters() {
            let cli = Cli::try_parse_from([
                "pageprobe",
                "run",
                "--suite",
                "voting",
                "--filter",
                "anonymous",
                "--report",
                "out/report.json",
            ])
            .unwrap();
            let Commands::Run(args) = cli.command else {
                panic!("expected Run command");
            };
            assert_eq!(args.suite.as_deref(), Some("voting"));
            assert_eq!(args.filter.as_deref(), Some("anonymous"));
            assert_eq!(args.report, Some(PathBuf::from("out/report.json")));
            assert!(!args.source.headed);
        }

        #[test]
        fn test_overrides() {
            let cli = Cli::try_parse_from([
                "pageprobe",
                "config",
                "--base-url",
                "https://staging.test",
                "-j",
                "2",
                "--headed",
            ])
            .unwrap();
            let Commands::Config(args) = cli.command else {
                panic!("expected Config command");
            };
            assert_eq!(args.source.base_url.as_deref(), Some("https://staging.test"));
            assert_eq!(args.source.max_instances, Some(2));
            assert!(args.source.headed);
        }

        #[test]
        fn test_global_flags_after_subcommand() {
            let cli =
                Cli::try_parse_from(["pageprobe", "list", "-vv", "--log-format", "json"]).unwrap();
            assert_eq!(cli.verbose, 2);
            assert_eq!(cli.log_format, LogFormat::Json);
            assert!(matches!(cli.command, Commands::List(_)));
        }

        #[test]
        fn test_unknown_log_format_rejected() {
            assert!(Cli::try_parse_from(["pageprobe", "--log-format", "xml", "list"]).is_err());
        }

        #[test]
        fn test_subcommand_required() {
            assert!(Cli::try_parse_from(["pageprobe"]).is_err());
        }
    }

    mod color_tests {
        use super::*;
        use crate::config::ColorChoice;

        #[test]
        fn test_color_arg_conversion() {
            assert_eq!(ColorChoice::from(ColorArg::Auto), ColorChoice::Auto);
            assert_eq!(ColorChoice::from(ColorArg::Always), ColorChoice::Always);
            assert_eq!(ColorChoice::from(ColorArg::Never), ColorChoice::Never);
        }
    }
}
