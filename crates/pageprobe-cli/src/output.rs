//! Output formatting and progress reporting

use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use pageprobe::{ScenarioResult, SuiteReport};
use std::time::Duration;

/// Console reporter for suite runs
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    spinner: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stdout(),
            spinner: None,
            use_color,
            quiet,
        }
    }

    /// Show a spinner while the suite runs
    pub fn start_spinner(&mut self, message: &str) {
        if self.quiet || !self.term.is_term() {
            return;
        }
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(120));
        self.spinner = Some(spinner);
    }

    /// Remove the spinner
    pub fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = if self.use_color {
            style("✓").green().bold().to_string()
        } else {
            "PASS".to_string()
        };
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // failures print even in quiet mode
        let prefix = if self.use_color {
            style("✗").red().bold().to_string()
        } else {
            "FAIL".to_string()
        };
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = if self.use_color {
            style("ℹ").blue().bold().to_string()
        } else {
            "INFO".to_string()
        };
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }
        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };
        let _ = self.term.write_line("");
        let _ = self.term.write_line(&styled);
    }

    /// One line per scenario outcome
    pub fn scenario(&self, result: &ScenarioResult) {
        let label = format!("[{}] {} ({}ms)", result.suite, result.name, result.duration_ms);
        if result.passed {
            self.success(&label);
            return;
        }
        let kind = result
            .error_kind
            .map_or_else(|| "error".to_string(), |k| k.to_string());
        let message = result.message.as_deref().unwrap_or("no message");
        self.failure(&format!("{label}: {kind}: {message}"));
        if let Some(shot) = &result.screenshot {
            let _ = self
                .term
                .write_line(&format!("    screenshot: {}", shot.display()));
        }
    }

    /// Every scenario line followed by the summary
    pub fn report(&self, report: &SuiteReport) {
        self.header(&format!("Suite against {}", report.base_url));
        for result in &report.results {
            self.scenario(result);
        }
        self.summary(
            report.totals.passed,
            report.totals.failed,
            Duration::from_millis(report.totals.duration_ms),
        );
    }

    /// Print run summary
    pub fn summary(&self, passed: usize, failed: usize, duration: Duration) {
        if self.quiet && failed == 0 {
            return;
        }
        let _ = self.term.write_line("");
        let total = passed + failed;
        let duration_secs = duration.as_secs_f64();
        if self.use_color {
            let passed_style = Style::new().green().bold();
            let failed_style = Style::new().red().bold();
            let status = if failed > 0 {
                failed_style.apply_to("FAILED")
            } else {
                passed_style.apply_to("PASSED")
            };
            let _ = self.term.write_line(&format!(
                "{} {} scenarios in {:.2}s ({} passed, {} failed)",
                status,
                total,
                duration_secs,
                passed_style.apply_to(passed),
                if failed > 0 {
                    failed_style.apply_to(failed).to_string()
                } else {
                    failed.to_string()
                },
            ));
        } else {
            let status = if failed > 0 { "FAILED" } else { "PASSED" };
            let _ = self.term.write_line(&format!(
                "{status} {total} scenarios in {duration_secs:.2}s ({passed} passed, {failed} failed)"
            ));
        }
    }
}

/// Aligned `suite  name` listing
#[must_use]
pub fn scenario_table(rows: &[(&str, &str)]) -> String {
    let width = rows.iter().map(|(suite, _)| suite.len()).max().unwrap_or(0);
    rows.iter()
        .map(|(suite, name)| format!("{suite:<width$}  {name}\n"))
        .collect()
}
