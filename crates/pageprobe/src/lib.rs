//! Pageprobe: page objects for flake-free browser end-to-end suites
//!
//! Every interaction goes through a wait: locators are re-resolved until the
//! required condition holds, actions only fire on elements that satisfied
//! their precondition, and rendered text is parsed into typed values instead
//! of being compared raw.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    PAGEPROBE Architecture                       │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Scenario   │    │ Page       │    │ Waiter     │            │
//! │   │ Harness    │───►│ Objects    │───►│ Actions    │            │
//! │   │            │    │            │    │ Extractor  │            │
//! │   └────────────┘    └────────────┘    └─────┬──────┘            │
//! │                                             ▼                   │
//! │                        ┌──────────────────────────────┐         │
//! │                        │ PageDriver (mock │ chromium) │         │
//! │                        └──────────────────────────────┘         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]

mod action;
/// Page objects and scenarios for the Buggy Cars Rating site
pub mod buggy;
/// CDP-backed driver and its script builders
pub mod browser;
mod config;
mod driver;
mod extract;
mod fixture;
mod harness;
mod locator;
mod mock_driver;
mod page_object;
mod result;
/// Polling waits
pub mod wait;

pub use action::Actions;
pub use buggy::{
    builtin_scenarios, CarInfo, CommentTableCheck, HomeCard, HomePage, LoginFormCheck,
    LoginOutcome, LoginPage, ModelPage, Selectors, Site, VoteOutcome, VoteState,
};
#[cfg(feature = "browser")]
pub use browser::{ChromiumDriver, ChromiumSessionFactory};
pub use config::{BrowserSettings, SuiteConfig, DEFAULT_BASE_URL};
pub use driver::{Cookie, ElementHandle, PageDriver, Screenshot, WindowHandle};
pub use extract::{parse_display_name, parse_vote_count, AuthState, CommentRecord, Extractor};
pub use fixture::{Credentials, ModelRef, TestData};
pub use harness::{
    failure_screenshot_name, select_scenarios, Scenario, ScenarioContext, ScenarioResult,
    ScenarioRunner, SessionFactory, SuiteReport, Totals,
};
pub use locator::{Locator, LocatorOptions, Selector};
pub use mock_driver::{MockDom, MockDriver, MockElement, Mutation};
pub use page_object::{PageContext, PageLifecycle, PageObject, PageState, UrlMatcher};
pub use result::{ensure, ErrorKind, ProbeError, ProbeResult};
pub use wait::{WaitCondition, WaitOptions, Waiter};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Everything a scenario author needs
pub mod prelude {
    pub use super::action::*;
    pub use super::buggy::*;
    pub use super::config::*;
    pub use super::driver::*;
    pub use super::extract::*;
    pub use super::fixture::*;
    pub use super::harness::*;
    pub use super::locator::*;
    pub use super::mock_driver::*;
    pub use super::page_object::*;
    pub use super::result::*;
    pub use super::wait::*;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod wiring_tests {
        use super::*;
        use std::sync::Arc;

        #[test]
        fn test_version() {
            assert!(!VERSION.is_empty());
        }

        #[tokio::test]
        async fn test_site_builds_over_mock_driver() {
            let driver = Arc::new(MockDriver::new());
            let config = SuiteConfig::default();
            let ctx = PageContext::new(driver, config.wait_options(), config.base_url.as_str());
            let site = Site::new(&ctx, &Selectors::default());
            assert_eq!(site.login.page_name(), "login");
            assert_eq!(site.home.page_name(), "home");
            assert_eq!(site.model.page_name(), "model");
            assert_eq!(site.model.state(), PageState::Unloaded);
        }
    }
}
