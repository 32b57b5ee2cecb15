//! Pageprobe CLI: run Buggy Cars Rating end-to-end suites
//!
//! ## Usage
//!
//! ```bash
//! pageprobe run                          # Every built-in scenario
//! pageprobe run --suite voting --headed  # One suite, visible browser
//! pageprobe list                         # Scenario names and suites
//! pageprobe config -c pageprobe.yaml     # Resolved configuration
//! ```

use clap::Parser;
use pageprobe::MockDriver;
use pageprobe_cli::{
    known_suites, logging, plan, resolve_suite_config, scenario_table, Cli, CliConfig, CliError,
    CliResult, ColorChoice, Commands, ConfigArgs, ListArgs, RunArgs, SuiteRunner, Verbosity,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    logging::init(config.verbosity, config.log_format)?;

    match cli.command {
        Commands::Run(args) => run_suite(config, &args),
        Commands::List(args) => run_list(&args),
        Commands::Config(args) => run_config(&args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let color: ColorChoice = cli.color.into();
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(color)
        .with_log_format(cli.log_format)
}

fn run_suite(config: CliConfig, args: &RunArgs) -> CliResult<()> {
    let mut runner = SuiteRunner::new(config);
    let report = runner.run(args)?;
    if report.all_passed() {
        Ok(())
    } else {
        Err(CliError::ScenariosFailed {
            failed: report.totals.failed,
            total: report.totals.total,
        })
    }
}

// Listing only needs names, so any driver type will do
fn run_list(args: &ListArgs) -> CliResult<()> {
    let scenarios = plan::<MockDriver>(args.suite.as_deref(), None)?;
    let rows: Vec<_> = scenarios.iter().map(|s| (s.suite(), s.name())).collect();
    print!("{}", scenario_table(&rows));
    let suites: Vec<_> = known_suites::<MockDriver>().into_iter().collect();
    tracing::debug!(suites = %suites.join(","), "listed scenarios");
    Ok(())
}

fn run_config(args: &ConfigArgs) -> CliResult<()> {
    let config = resolve_suite_config(&args.source)?;
    print!("{}", config.to_yaml()?);
    Ok(())
}
