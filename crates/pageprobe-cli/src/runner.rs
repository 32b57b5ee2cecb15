//! Suite runner: resolves configuration, picks scenarios, drives sessions

use crate::commands::RunArgs;
use crate::config::{resolve_suite_config, CliConfig};
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use pageprobe::{
    builtin_scenarios, select_scenarios, PageDriver, Scenario, ScenarioRunner, SessionFactory,
    SuiteConfig, SuiteReport,
};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;

/// Suites the built-in scenarios belong to, sorted
#[must_use]
pub fn known_suites<D: PageDriver + ?Sized>() -> BTreeSet<&'static str> {
    builtin_scenarios::<D>().iter().map(|s| s.suite()).collect()
}

/// Built-in scenarios narrowed by suite and name filter.
///
/// An unknown suite, or a selection that leaves nothing to run, is an
/// argument error.
pub fn plan<D: PageDriver + ?Sized>(
    suite: Option<&str>,
    filter: Option<&str>,
) -> CliResult<Vec<Box<dyn Scenario<D>>>> {
    if let Some(wanted) = suite {
        let suites = known_suites::<D>();
        if !suites.contains(wanted) {
            let known: Vec<_> = suites.into_iter().collect();
            return Err(CliError::invalid_argument(format!(
                "unknown suite {wanted:?}, expected one of {}",
                known.join(", ")
            )));
        }
    }
    let scenarios = select_scenarios(builtin_scenarios::<D>(), suite, filter);
    if scenarios.is_empty() {
        return Err(CliError::invalid_argument("no scenario matches the selection"));
    }
    Ok(scenarios)
}

/// Runs scenario suites and reports them on the console
#[derive(Debug)]
pub struct SuiteRunner {
    config: CliConfig,
    reporter: ProgressReporter,
}

impl SuiteRunner {
    /// Create a new suite runner
    #[must_use]
    pub fn new(config: CliConfig) -> Self {
        let reporter =
            ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
        Self { config, reporter }
    }

    /// Run the selected scenarios in real browser sessions
    #[cfg(feature = "browser")]
    pub fn run(&mut self, args: &RunArgs) -> CliResult<SuiteReport> {
        let suite = resolve_suite_config(&args.source)?;
        let scenarios = plan(args.suite.as_deref(), args.filter.as_deref())?;
        let factory = pageprobe::ChromiumSessionFactory::new(suite.browser.clone());
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.run_with(factory, suite, &scenarios, args.report.as_deref()))
    }

    /// Without browser support nothing can run
    #[cfg(not(feature = "browser"))]
    pub fn run(&mut self, args: &RunArgs) -> CliResult<SuiteReport> {
        let _ = resolve_suite_config(&args.source)?;
        let _ = plan::<pageprobe::MockDriver>(args.suite.as_deref(), args.filter.as_deref())?;
        Err(CliError::BrowserUnavailable)
    }

    /// Run `scenarios` over sessions from `factory`, print the outcome and
    /// write the JSON report when a path is given
    pub async fn run_with<F: SessionFactory>(
        &mut self,
        factory: F,
        suite: SuiteConfig,
        scenarios: &[Box<dyn Scenario<F::Driver>>],
        report_path: Option<&Path>,
    ) -> CliResult<SuiteReport> {
        let data = suite.load_test_data()?;
        let selectors = suite.load_selectors()?;
        self.reporter.info(&format!(
            "running {} scenarios against {} ({} sessions at most)",
            scenarios.len(),
            suite.base_url,
            suite.max_instances
        ));

        let runner = ScenarioRunner::new(factory, suite, data, selectors);
        self.reporter.start_spinner("running scenarios");
        let report = runner.run(scenarios).await;
        self.reporter.stop_spinner();
        self.reporter.report(&report);

        if let Some(path) = report_path {
            report.write_json(path)?;
            info!(path = %path.display(), "report written");
            if self.config.verbosity.is_verbose() {
                self.reporter.info(&format!("report written to {}", path.display()));
            }
        }
        Ok(report)
    }

    /// Get the reporter (for testing)
    #[must_use]
    pub const fn reporter(&self) -> &ProgressReporter {
        &self.reporter
    }
}
