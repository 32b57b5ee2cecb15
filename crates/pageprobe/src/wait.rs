//! Wait mechanisms: the Locator/Waiter layer.
//!
//! Every wait polls the live page through a [`PageDriver`] until a condition
//! holds or its budget runs out. A wait never returns on an unmet condition:
//! it yields a handle (or value) or a [`ProbeError::Timeout`].
//!
//! Polling checks first, then sleeps `min(poll_interval, remaining)`, so the
//! final check lands exactly on the deadline. Driver faults abort the wait
//! immediately; stale handles seen mid-check count as "not yet".

use crate::driver::{ElementHandle, PageDriver};
use crate::locator::Locator;
use crate::page_object::UrlMatcher;
use crate::result::{ProbeError, ProbeResult};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for wait operations (30 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 30_000;

/// Default polling interval (100ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Expression evaluated by [`Waiter::wait_for_page_load`]
const READY_STATE_SCRIPT: &str = "document.readyState";

// =============================================================================
// WAIT CONDITION
// =============================================================================

/// Predicate an element must satisfy before a wait returns it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WaitCondition {
    /// Attached to the DOM
    Exists,
    /// Attached and rendered visibly
    Visible,
    /// Visible and enabled
    Clickable,
    /// Rendered text contains the expected substring
    TextContains(String),
}

impl fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exists => f.write_str("present"),
            Self::Visible => f.write_str("visible"),
            Self::Clickable => f.write_str("clickable"),
            Self::TextContains(text) => write!(f, "containing text {text:?}"),
        }
    }
}

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// These options with the locator's own overrides applied
    #[must_use]
    pub fn for_locator(&self, locator: &Locator) -> Self {
        let overrides = locator.options();
        Self {
            timeout_ms: overrides
                .timeout
                .map_or(self.timeout_ms, |t| t.as_millis() as u64),
            poll_interval_ms: overrides
                .poll_interval
                .map_or(self.poll_interval_ms, |p| p.as_millis() as u64),
        }
    }
}

// =============================================================================
// POLL LOOP
// =============================================================================

/// Poll `probe` until it yields a value or the budget in `options` runs out.
///
/// `what` and `condition` only feed logs and the timeout error.
pub async fn poll_until<T, F, Fut>(
    what: &str,
    condition: &str,
    options: &WaitOptions,
    mut probe: F,
) -> ProbeResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProbeResult<Option<T>>>,
{
    let start = Instant::now();
    let deadline = start + options.timeout();
    let poll = options.poll_interval();
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        match probe().await {
            Ok(Some(value)) => {
                debug!(
                    waiting_for = what,
                    condition,
                    attempts,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "wait satisfied"
                );
                return Ok(value);
            }
            Ok(None) => {}
            Err(err) if err.is_stale_reference() => {
                trace!(waiting_for = what, error = %err, "element went stale mid-check");
            }
            Err(err) => return Err(err),
        }

        let now = Instant::now();
        if now >= deadline {
            debug!(waiting_for = what, condition, attempts, "wait timed out");
            return Err(ProbeError::Timeout {
                selector: what.to_string(),
                condition: condition.to_string(),
                ms: options.timeout_ms,
            });
        }
        tokio::time::sleep(poll.min(deadline - now)).await;
    }
}

// =============================================================================
// WAITER
// =============================================================================

/// Locator/Waiter bound to one driver session
pub struct Waiter<D: PageDriver + ?Sized> {
    driver: Arc<D>,
    options: WaitOptions,
}

impl<D: PageDriver + ?Sized> Clone for Waiter<D> {
    fn clone(&self) -> Self {
        Self {
            driver: Arc::clone(&self.driver),
            options: self.options,
        }
    }
}

impl<D: PageDriver + ?Sized> fmt::Debug for Waiter<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Waiter")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<D: PageDriver + ?Sized> Waiter<D> {
    /// Create a waiter with default options
    #[must_use]
    pub fn new(driver: Arc<D>) -> Self {
        Self {
            driver,
            options: WaitOptions::default(),
        }
    }

    /// Replace the default options
    #[must_use]
    pub fn with_options(mut self, options: WaitOptions) -> Self {
        self.options = options;
        self
    }

    /// Driver this waiter polls
    #[must_use]
    pub const fn driver(&self) -> &Arc<D> {
        &self.driver
    }

    /// Default options
    #[must_use]
    pub const fn options(&self) -> &WaitOptions {
        &self.options
    }

    /// Single probe: the first element matching `locator` that satisfies `condition`
    pub async fn check(
        &self,
        locator: &Locator,
        condition: &WaitCondition,
    ) -> ProbeResult<Option<ElementHandle>> {
        for handle in self.driver.find_elements(locator.selector()).await? {
            let satisfied = match condition {
                WaitCondition::Exists => return Ok(Some(handle)),
                WaitCondition::Visible => self.driver.is_displayed(&handle).await?,
                WaitCondition::Clickable => {
                    self.driver.is_displayed(&handle).await?
                        && self.driver.is_enabled(&handle).await?
                }
                WaitCondition::TextContains(expected) => {
                    self.driver.text(&handle).await?.contains(expected.as_str())
                }
            };
            if satisfied {
                let displayed = !matches!(condition, WaitCondition::TextContains(_));
                return Ok(Some(if displayed {
                    handle.with_displayed(true)
                } else {
                    handle
                }));
            }
        }
        Ok(None)
    }

    /// Wait until `locator` satisfies `condition`, using default options
    pub async fn wait_for(
        &self,
        locator: &Locator,
        condition: WaitCondition,
    ) -> ProbeResult<ElementHandle> {
        let options = self.options.for_locator(locator);
        self.wait_for_with(locator, condition, &options).await
    }

    /// Wait until `locator` satisfies `condition`, with explicit options
    pub async fn wait_for_with(
        &self,
        locator: &Locator,
        condition: WaitCondition,
        options: &WaitOptions,
    ) -> ProbeResult<ElementHandle> {
        let name = locator.name();
        let condition_name = condition.to_string();
        let condition = &condition;
        poll_until(&name, &condition_name, options, move || async move {
            self.check(locator, condition).await
        })
        .await
    }

    /// Wait until any candidate is satisfied; earlier candidates win ties.
    ///
    /// Returns the index of the winning candidate and its handle.
    pub async fn wait_for_first(
        &self,
        candidates: &[(Locator, WaitCondition)],
    ) -> ProbeResult<(usize, ElementHandle)> {
        if candidates.is_empty() {
            return Err(ProbeError::precondition(
                "wait_for_first needs at least one candidate",
            ));
        }
        let what = candidates
            .iter()
            .map(|(loc, _)| loc.name())
            .collect::<Vec<_>>()
            .join(" or ");
        let conditions = candidates
            .iter()
            .map(|(_, c)| c.to_string())
            .collect::<Vec<_>>()
            .join(" / ");
        poll_until(&what, &conditions, &self.options, move || async move {
            for (idx, (locator, condition)) in candidates.iter().enumerate() {
                if let Some(handle) = self.check(locator, condition).await? {
                    return Ok(Some((idx, handle)));
                }
            }
            Ok::<_, ProbeError>(None)
        })
        .await
    }

    /// Wait until no element matching `locator` is displayed
    pub async fn wait_for_hidden(&self, locator: &Locator) -> ProbeResult<()> {
        let options = self.options.for_locator(locator);
        let name = locator.name();
        poll_until(&name, "hidden", &options, move || async move {
            for handle in self.driver.find_elements(locator.selector()).await? {
                if self.driver.is_displayed(&handle).await? {
                    return Ok(None);
                }
            }
            Ok::<_, ProbeError>(Some(()))
        })
        .await
    }

    /// Wait for an arbitrary derived state.
    ///
    /// `probe` returns `Ok(None)` while the state is not yet observable.
    pub async fn wait_until<T, F, Fut>(&self, what: &str, probe: F) -> ProbeResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ProbeResult<Option<T>>>,
    {
        poll_until(what, "determined", &self.options, probe).await
    }

    /// Wait until `document.readyState` is `complete`
    pub async fn wait_for_page_load(&self) -> ProbeResult<()> {
        poll_until("document", "loaded", &self.options, move || async move {
            let state = self.driver.execute(READY_STATE_SCRIPT).await?;
            Ok::<_, ProbeError>((state.as_str() == Some("complete")).then_some(()))
        })
        .await
    }

    /// Wait until the current URL's path matches `matcher`; returns the URL
    pub async fn wait_for_url(&self, matcher: &UrlMatcher) -> ProbeResult<String> {
        let what = format!("url {}", matcher.pattern());
        poll_until(&what, "matching", &self.options, move || async move {
            let url = self.driver.current_url().await?;
            Ok::<_, ProbeError>(matcher.matches_url(&url).then_some(url))
        })
        .await
    }
}
