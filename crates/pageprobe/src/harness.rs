//! Scenario harness: runs scenarios over isolated browser sessions.
//!
//! Every scenario gets its own session from a [`SessionFactory`] and fresh
//! page objects. At most `max_instances` sessions run at once. A failed
//! scenario leaves a screenshot behind, and teardown (logout, close) runs
//! whatever the outcome.

use crate::buggy::{Selectors, Site};
use crate::config::SuiteConfig;
use crate::driver::PageDriver;
use crate::fixture::TestData;
use crate::page_object::PageContext;
use crate::result::{ErrorKind, ProbeError, ProbeResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

/// One end-to-end scenario
#[async_trait]
pub trait Scenario<D: PageDriver + ?Sized>: Send + Sync {
    /// Unique scenario name
    fn name(&self) -> &'static str;

    /// Suite the scenario belongs to, e.g. "auth"
    fn suite(&self) -> &'static str;

    /// Drive the page objects and check the outcome
    async fn run(&self, ctx: &ScenarioContext<D>) -> ProbeResult<()>;
}

/// What a running scenario can reach
#[derive(Debug)]
pub struct ScenarioContext<D: PageDriver + ?Sized> {
    /// Fresh page objects over the scenario's own session
    pub pages: Site<D>,
    /// Accounts and known content
    pub data: Arc<TestData>,
    /// Suite settings
    pub config: Arc<SuiteConfig>,
    page: PageContext<D>,
}

impl<D: PageDriver + ?Sized> ScenarioContext<D> {
    /// Build page objects over `driver`
    #[must_use]
    pub fn new(
        driver: Arc<D>,
        selectors: &Selectors,
        data: Arc<TestData>,
        config: Arc<SuiteConfig>,
    ) -> Self {
        let page = PageContext::new(driver, config.wait_options(), config.base_url.as_str());
        Self {
            pages: Site::new(&page, selectors),
            data,
            config,
            page,
        }
    }

    /// The session's driver
    #[must_use]
    pub fn driver(&self) -> &Arc<D> {
        self.page.driver()
    }

    /// Raw wait, act and read capabilities for ad hoc checks
    #[must_use]
    pub const fn page(&self) -> &PageContext<D> {
        &self.page
    }

    /// Absolute URL for an application path
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        self.page.url(path)
    }
}

/// Opens one isolated browser session per scenario
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Driver type of the sessions
    type Driver: PageDriver + 'static;

    /// Open a new session
    async fn open(&self) -> ProbeResult<Arc<Self::Driver>>;
}

/// Result of running a single scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// Scenario name
    pub name: String,
    /// Suite name
    pub suite: String,
    /// Whether the scenario passed
    pub passed: bool,
    /// Classification of the failure
    pub error_kind: Option<ErrorKind>,
    /// Failure message
    pub message: Option<String>,
    /// Wall time including setup and teardown
    pub duration_ms: u64,
    /// Screenshot taken on failure
    pub screenshot: Option<PathBuf>,
}

impl ScenarioResult {
    /// Create a passing result
    #[must_use]
    pub fn pass(name: impl Into<String>, suite: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            suite: suite.into(),
            passed: true,
            error_kind: None,
            message: None,
            duration_ms: 0,
            screenshot: None,
        }
    }

    /// Create a failing result from the error that ended the scenario
    #[must_use]
    pub fn fail(name: impl Into<String>, suite: impl Into<String>, err: &ProbeError) -> Self {
        Self {
            name: name.into(),
            suite: suite.into(),
            passed: false,
            error_kind: Some(err.kind()),
            message: Some(err.to_string()),
            duration_ms: 0,
            screenshot: None,
        }
    }

    /// Set duration
    #[must_use]
    pub const fn with_duration_ms(mut self, ms: u64) -> Self {
        self.duration_ms = ms;
        self
    }

    /// Attach the failure screenshot
    #[must_use]
    pub fn with_screenshot(mut self, path: Option<PathBuf>) -> Self {
        self.screenshot = path;
        self
    }
}

/// Pass/fail counts of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    /// Scenarios run
    pub total: usize,
    /// Scenarios passed
    pub passed: usize,
    /// Scenarios failed
    pub failed: usize,
    /// Wall time of the whole run
    pub duration_ms: u64,
}

/// Results from running a set of scenarios
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Unique id of this run
    pub run_id: Uuid,
    /// Start of the run
    pub started_at: DateTime<Utc>,
    /// Application root the run targeted
    pub base_url: String,
    /// Per-scenario results, in the order the scenarios were given
    pub results: Vec<ScenarioResult>,
    /// Counts
    pub totals: Totals,
}

impl SuiteReport {
    /// Assemble a report and compute its totals
    #[must_use]
    pub fn new(
        started_at: DateTime<Utc>,
        base_url: impl Into<String>,
        results: Vec<ScenarioResult>,
        duration_ms: u64,
    ) -> Self {
        let passed = results.iter().filter(|r| r.passed).count();
        Self {
            run_id: Uuid::new_v4(),
            started_at,
            base_url: base_url.into(),
            totals: Totals {
                total: results.len(),
                passed,
                failed: results.len() - passed,
                duration_ms,
            },
            results,
        }
    }

    /// Check if all scenarios passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    /// Failed scenarios
    #[must_use]
    pub fn failures(&self) -> Vec<&ScenarioResult> {
        self.results.iter().filter(|r| !r.passed).collect()
    }

    /// Write the report as pretty JSON, creating parent directories
    pub fn write_json(&self, path: &Path) -> ProbeResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Keep scenarios of `suite` whose name contains `filter`
#[must_use]
pub fn select_scenarios<D: PageDriver + ?Sized>(
    scenarios: Vec<Box<dyn Scenario<D>>>,
    suite: Option<&str>,
    filter: Option<&str>,
) -> Vec<Box<dyn Scenario<D>>> {
    scenarios
        .into_iter()
        .filter(|s| suite.map_or(true, |wanted| s.suite() == wanted))
        .filter(|s| filter.map_or(true, |needle| s.name().contains(needle)))
        .collect()
}

/// Screenshot file name for a failed scenario
#[must_use]
pub fn failure_screenshot_name(scenario: &str, at: DateTime<Utc>) -> String {
    format!("FAILED_{scenario}_{}.png", at.format("%Y%m%dT%H%M%S%3fZ"))
}

/// Runs scenarios with bounded concurrency
pub struct ScenarioRunner<F: SessionFactory> {
    factory: F,
    config: Arc<SuiteConfig>,
    data: Arc<TestData>,
    selectors: Selectors,
}

impl<F: SessionFactory> std::fmt::Debug for ScenarioRunner<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioRunner")
            .field("base_url", &self.config.base_url)
            .field("max_instances", &self.config.max_instances)
            .finish_non_exhaustive()
    }
}

impl<F: SessionFactory> ScenarioRunner<F> {
    /// Create a runner
    #[must_use]
    pub fn new(factory: F, config: SuiteConfig, data: TestData, selectors: Selectors) -> Self {
        Self {
            factory,
            config: Arc::new(config),
            data: Arc::new(data),
            selectors,
        }
    }

    /// Suite settings
    #[must_use]
    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Run every scenario; results keep the input order
    pub async fn run(&self, scenarios: &[Box<dyn Scenario<F::Driver>>]) -> SuiteReport {
        let started_at = Utc::now();
        let start = Instant::now();
        let concurrency = self.config.max_instances.max(1);
        info!(
            scenarios = scenarios.len(),
            concurrency,
            base_url = %self.config.base_url,
            "suite started"
        );

        let mut indexed: Vec<(usize, ScenarioResult)> = stream::iter(scenarios.iter().enumerate())
            .map(|(i, scenario)| async move { (i, self.run_one(scenario.as_ref()).await) })
            .buffer_unordered(concurrency)
            .collect()
            .await;
        indexed.sort_by_key(|(i, _)| *i);
        let results = indexed.into_iter().map(|(_, r)| r).collect();

        let report = SuiteReport::new(started_at, self.config.base_url.as_str(), results, elapsed_ms(start));
        info!(
            passed = report.totals.passed,
            failed = report.totals.failed,
            duration_ms = report.totals.duration_ms,
            "suite finished"
        );
        report
    }

    /// Run one scenario in its own session
    pub async fn run_one(&self, scenario: &dyn Scenario<F::Driver>) -> ScenarioResult {
        let (name, suite) = (scenario.name(), scenario.suite());
        let start = Instant::now();
        info!(scenario = name, suite, "scenario started");

        let driver = match self.factory.open().await {
            Ok(driver) => driver,
            Err(err) => {
                error!(scenario = name, error = %err, "could not open session");
                return ScenarioResult::fail(name, suite, &err).with_duration_ms(elapsed_ms(start));
            }
        };
        let ctx = ScenarioContext::new(
            Arc::clone(&driver),
            &self.selectors,
            Arc::clone(&self.data),
            Arc::clone(&self.config),
        );

        let outcome = self.execute(scenario, &ctx).await;
        let result = match outcome {
            Ok(()) => {
                info!(scenario = name, "scenario passed");
                ScenarioResult::pass(name, suite)
            }
            Err(err) => {
                error!(scenario = name, kind = %err.kind(), error = %err, "scenario failed");
                let shot = self.capture_failure(driver.as_ref(), name).await;
                ScenarioResult::fail(name, suite, &err).with_screenshot(shot)
            }
        };
        teardown(&ctx).await;
        result.with_duration_ms(elapsed_ms(start))
    }

    async fn execute(
        &self,
        scenario: &dyn Scenario<F::Driver>,
        ctx: &ScenarioContext<F::Driver>,
    ) -> ProbeResult<()> {
        let body = async {
            ctx.driver().navigate(&ctx.url("/")).await?;
            scenario.run(ctx).await
        };
        tokio::time::timeout(self.config.scenario_timeout(), body)
            .await
            .unwrap_or_else(|_| {
                Err(ProbeError::Timeout {
                    selector: format!("scenario {}", scenario.name()),
                    condition: "finished".to_string(),
                    ms: self.config.scenario_timeout_ms,
                })
            })
    }

    async fn capture_failure(&self, driver: &F::Driver, scenario: &str) -> Option<PathBuf> {
        let path = self
            .config
            .screenshot_dir
            .join(failure_screenshot_name(scenario, Utc::now()));
        let saved = async {
            let shot = driver.screenshot().await?;
            tokio::fs::create_dir_all(&self.config.screenshot_dir).await?;
            tokio::fs::write(&path, &shot.data).await?;
            Ok::<_, ProbeError>(())
        };
        match saved.await {
            Ok(()) => {
                info!(scenario, path = %path.display(), "failure screenshot saved");
                Some(path)
            }
            Err(err) => {
                warn!(scenario, error = %err, "could not save failure screenshot");
                None
            }
        }
    }
}

/// Log out and close the session; faults are logged, never raised
async fn teardown<D: PageDriver + ?Sized>(ctx: &ScenarioContext<D>) {
    if let Err(err) = ctx.pages.login.logout().await {
        warn!(error = %err, "logout during teardown failed");
    }
    if let Err(err) = ctx.driver().close().await {
        warn!(error = %err, "closing session failed");
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
