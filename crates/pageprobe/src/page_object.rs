//! Page Object Model support.
//!
//! A page object is a struct holding a [`PageContext`] (waiter, action
//! executor and extractor over one session) plus its own locators, and
//! exposing intents instead of raw element operations. Composition replaces
//! inheritance: pages share capabilities by holding the same context type.
//!
//! Each page tracks a [`PageState`]. Intents call
//! [`PageObject::ensure_ready`], which re-runs the page's readiness wait
//! whenever the page is not ready for the driver's current generation.

use crate::action::Actions;
use crate::driver::PageDriver;
use crate::extract::Extractor;
use crate::result::ProbeResult;
use crate::wait::{WaitOptions, Waiter};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Lifecycle of a page object relative to the live browser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageState {
    /// Never loaded
    Unloaded,
    /// Readiness wait in progress
    Loading,
    /// Ready for intents at the current generation
    Ready,
    /// Was ready, but the browser navigated since
    Stale,
}

impl std::fmt::Display for PageState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Unloaded => "unloaded",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Stale => "stale",
        };
        f.write_str(name)
    }
}

/// Interior-mutable lifecycle record shared by a page object's intents
#[derive(Debug)]
pub struct PageLifecycle {
    inner: Mutex<(PageState, u64)>,
}

impl Default for PageLifecycle {
    fn default() -> Self {
        Self {
            inner: Mutex::new((PageState::Unloaded, 0)),
        }
    }
}

impl PageLifecycle {
    /// State as seen from driver generation `generation`
    #[must_use]
    pub fn state(&self, generation: u64) -> PageState {
        let (state, ready_at) = *self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        match state {
            PageState::Ready if ready_at != generation => PageState::Stale,
            other => other,
        }
    }

    /// Record a state transition
    pub fn set(&self, state: PageState, generation: u64) {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = (state, generation);
    }
}

/// Capabilities a page object composes: wait, act, read
pub struct PageContext<D: PageDriver + ?Sized> {
    /// Locator/Waiter
    pub waiter: Waiter<D>,
    /// Action executor
    pub actions: Actions<D>,
    /// State extractor
    pub extractor: Extractor<D>,
    base_url: String,
}

impl<D: PageDriver + ?Sized> Clone for PageContext<D> {
    fn clone(&self) -> Self {
        Self {
            waiter: self.waiter.clone(),
            actions: self.actions.clone(),
            extractor: self.extractor.clone(),
            base_url: self.base_url.clone(),
        }
    }
}

impl<D: PageDriver + ?Sized> std::fmt::Debug for PageContext<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageContext")
            .field("base_url", &self.base_url)
            .field("options", self.waiter.options())
            .finish_non_exhaustive()
    }
}

impl<D: PageDriver + ?Sized> PageContext<D> {
    /// Build the three capabilities over one session
    #[must_use]
    pub fn new(driver: Arc<D>, options: WaitOptions, base_url: impl Into<String>) -> Self {
        let waiter = Waiter::new(driver).with_options(options);
        Self {
            actions: Actions::new(waiter.clone()),
            extractor: Extractor::new(waiter.clone()),
            waiter,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// The session's driver
    #[must_use]
    pub fn driver(&self) -> &Arc<D> {
        self.waiter.driver()
    }

    /// Application root, without trailing slash
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an application path
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }
}

/// A logical screen of the application under test
#[async_trait]
pub trait PageObject<D: PageDriver + ?Sized>: Send + Sync {
    /// Page name for logs
    fn page_name(&self) -> &'static str;

    /// URL path pattern that identifies this page (e.g. `/model/:id`)
    fn url_pattern(&self) -> &str;

    /// Shared capabilities
    fn context(&self) -> &PageContext<D>;

    /// Lifecycle record
    fn lifecycle(&self) -> &PageLifecycle;

    /// Wait until the page's defining elements are usable
    async fn wait_ready(&self) -> ProbeResult<()>;

    /// Current lifecycle state
    fn state(&self) -> PageState {
        self.lifecycle()
            .state(self.context().driver().generation())
    }

    /// Run the readiness wait unless already ready at this generation
    async fn ensure_ready(&self) -> ProbeResult<()> {
        let generation = self.context().driver().generation();
        let lifecycle = self.lifecycle();
        if lifecycle.state(generation) == PageState::Ready {
            return Ok(());
        }
        debug!(page = self.page_name(), previous = %lifecycle.state(generation), "waiting for page");
        lifecycle.set(PageState::Loading, generation);
        match self.wait_ready().await {
            Ok(()) => {
                lifecycle.set(PageState::Ready, self.context().driver().generation());
                Ok(())
            }
            Err(err) => {
                lifecycle.set(PageState::Unloaded, generation);
                Err(err)
            }
        }
    }

    /// Whether the browser's current URL matches [`PageObject::url_pattern`]
    async fn is_current(&self) -> ProbeResult<bool> {
        let url = self.context().driver().current_url().await?;
        Ok(UrlMatcher::new(self.url_pattern()).matches_url(&url))
    }
}

/// URL pattern matcher for page objects
#[derive(Debug, Clone)]
pub struct UrlMatcher {
    pattern: String,
    segments: Vec<UrlSegment>,
}

#[derive(Debug, Clone)]
enum UrlSegment {
    Literal(String),
    Wildcard,
    Parameter(String),
}

impl UrlMatcher {
    /// Create a new URL matcher from a pattern
    ///
    /// Patterns support:
    /// - Literal segments: `/overall`
    /// - Wildcards: `/make/*`
    /// - Named parameters: `/model/:id`
    #[must_use]
    pub fn new(pattern: &str) -> Self {
        let segments = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| {
                if s == "*" {
                    UrlSegment::Wildcard
                } else if let Some(name) = s.strip_prefix(':') {
                    UrlSegment::Parameter(name.to_string())
                } else {
                    UrlSegment::Literal(s.to_string())
                }
            })
            .collect();

        Self {
            pattern: pattern.to_string(),
            segments,
        }
    }

    /// Check if a path matches the pattern
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        // wildcards and parameters each consume exactly one segment
        if path_segments.len() != self.segments.len() {
            return false;
        }

        self.segments
            .iter()
            .zip(&path_segments)
            .all(|(segment, actual)| match segment {
                UrlSegment::Literal(lit) => lit == actual,
                UrlSegment::Wildcard | UrlSegment::Parameter(_) => true,
            })
    }

    /// Check an absolute URL by its path, ignoring origin, query and fragment
    #[must_use]
    pub fn matches_url(&self, url: &str) -> bool {
        self.matches(path_of(url))
    }

    /// Extract named parameters from an absolute URL or path
    #[must_use]
    pub fn extract_params(&self, url: &str) -> HashMap<String, String> {
        let path_segments: Vec<&str> = path_of(url).split('/').filter(|s| !s.is_empty()).collect();

        self.segments
            .iter()
            .zip(&path_segments)
            .filter_map(|(segment, value)| match segment {
                UrlSegment::Parameter(name) => Some((name.clone(), (*value).to_string())),
                _ => None,
            })
            .collect()
    }

    /// Get the original pattern
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

/// Path component of an absolute URL (or the input itself when it is a path)
fn path_of(url: &str) -> &str {
    let without_origin = match url.split_once("://") {
        Some((_, rest)) => rest.find('/').map_or("/", |idx| &rest[idx..]),
        None => url,
    };
    let end = without_origin
        .find(|c| c == '?' || c == '#')
        .unwrap_or(without_origin.len());
    &without_origin[..end]
}
