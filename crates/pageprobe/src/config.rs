//! Suite configuration, loaded from YAML.
//!
//! ```yaml
//! base_url: https://buggy.justtestit.org
//! wait_timeout_ms: 30000
//! max_instances: 5
//! browser:
//!   headless: true
//! ```

use crate::buggy::Selectors;
use crate::fixture::TestData;
use crate::result::{ProbeError, ProbeResult};
use crate::wait::{WaitOptions, DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default application root
pub const DEFAULT_BASE_URL: &str = "https://buggy.justtestit.org";

/// Default budget for one whole scenario
pub const DEFAULT_SCENARIO_TIMEOUT_MS: u64 = 60_000;

/// Default number of concurrent browser sessions
pub const DEFAULT_MAX_INSTANCES: usize = 5;

/// Browser launch settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Run without a visible window
    pub headless: bool,
    /// Window width in pixels
    pub window_width: u32,
    /// Window height in pixels
    pub window_height: u32,
    /// Keep the chromium sandbox (disable inside containers)
    pub sandbox: bool,
    /// Chromium binary (None = auto-detect)
    pub chromium_path: Option<PathBuf>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            sandbox: true,
            chromium_path: None,
        }
    }
}

/// Everything a suite run needs besides the scenarios themselves
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Application root
    pub base_url: String,
    /// Default wait budget
    pub wait_timeout_ms: u64,
    /// Default polling interval
    pub poll_interval_ms: u64,
    /// Budget for one whole scenario
    pub scenario_timeout_ms: u64,
    /// Where failure screenshots go
    pub screenshot_dir: PathBuf,
    /// Concurrent browser sessions
    pub max_instances: usize,
    /// Test data JSON (None = built-in accounts)
    pub fixtures: Option<PathBuf>,
    /// Selector override JSON
    pub selectors: Option<PathBuf>,
    /// Browser launch settings
    pub browser: BrowserSettings,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            wait_timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            scenario_timeout_ms: DEFAULT_SCENARIO_TIMEOUT_MS,
            screenshot_dir: PathBuf::from("screenshots"),
            max_instances: DEFAULT_MAX_INSTANCES,
            fixtures: None,
            selectors: None,
            browser: BrowserSettings::default(),
        }
    }
}

impl SuiteConfig {
    /// Load from a YAML file; missing keys keep their defaults
    pub fn load(path: &Path) -> ProbeResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml(&raw)
    }

    /// Parse from YAML text
    pub fn from_yaml(raw: &str) -> ProbeResult<Self> {
        Ok(serde_yaml_ng::from_str(raw)?)
    }

    /// Render as YAML
    pub fn to_yaml(&self) -> ProbeResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Reject settings no run could succeed with
    pub fn validate(&self) -> ProbeResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ProbeError::config(format!(
                "base_url must be an http(s) URL, got {:?}",
                self.base_url
            )));
        }
        if self.wait_timeout_ms == 0 || self.scenario_timeout_ms == 0 {
            return Err(ProbeError::config("timeouts must be greater than zero"));
        }
        if self.poll_interval_ms == 0 {
            return Err(ProbeError::config("poll_interval_ms must be greater than zero"));
        }
        if self.poll_interval_ms > self.wait_timeout_ms {
            return Err(ProbeError::config(format!(
                "poll_interval_ms ({}) exceeds wait_timeout_ms ({})",
                self.poll_interval_ms, self.wait_timeout_ms
            )));
        }
        if self.max_instances == 0 {
            return Err(ProbeError::config("max_instances must be at least 1"));
        }
        Ok(())
    }

    /// Default wait options for page objects
    #[must_use]
    pub const fn wait_options(&self) -> WaitOptions {
        WaitOptions {
            timeout_ms: self.wait_timeout_ms,
            poll_interval_ms: self.poll_interval_ms,
        }
    }

    /// Budget for one scenario
    #[must_use]
    pub const fn scenario_timeout(&self) -> Duration {
        Duration::from_millis(self.scenario_timeout_ms)
    }

    /// Test data from [`SuiteConfig::fixtures`], or the built-in accounts
    pub fn load_test_data(&self) -> ProbeResult<TestData> {
        match &self.fixtures {
            Some(path) => TestData::load(path),
            None => Ok(TestData::default()),
        }
    }

    /// Selector maps with overrides from [`SuiteConfig::selectors`] applied
    pub fn load_selectors(&self) -> ProbeResult<Selectors> {
        match &self.selectors {
            Some(path) => Selectors::load(path),
            None => Ok(Selectors::default()),
        }
    }
}
