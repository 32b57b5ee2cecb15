//! PageDriver - the browser capability seam.
//!
//! Everything above this module (waits, actions, extraction, page objects) is
//! written purely against [`PageDriver`]. Two implementations ship with the
//! crate:
//!
//! - [`MockDriver`](crate::MockDriver) - scripted in-memory DOM for unit tests
//! - `ChromiumDriver` - real browser over CDP (feature `browser`)
//!
//! Element handles are cheap descriptions (selector + index + scope) stamped
//! with the driver's navigation generation. A handle from an older generation
//! is stale and every driver must reject it with [`ProbeError::Driver`].

use crate::locator::Selector;
use crate::result::{ProbeError, ProbeResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Handle to one rendered element, valid until the next navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    /// Selector the element was resolved from
    pub selector: Selector,
    /// Position among the selector's matches, in document order
    pub index: usize,
    /// Parent element for scoped lookups
    pub scope: Option<Box<ElementHandle>>,
    /// Driver generation at resolution time
    pub generation: u64,
    /// Visibility observed by the wait that produced this handle
    pub displayed: Option<bool>,
}

impl ElementHandle {
    /// Create a top-level handle
    #[must_use]
    pub fn new(selector: Selector, index: usize, generation: u64) -> Self {
        Self {
            selector,
            index,
            scope: None,
            generation,
            displayed: None,
        }
    }

    /// Create a handle scoped under `parent`
    #[must_use]
    pub fn scoped(parent: &Self, selector: Selector, index: usize) -> Self {
        Self {
            selector,
            index,
            scope: Some(Box::new(parent.clone())),
            generation: parent.generation,
            displayed: None,
        }
    }

    /// Record the visibility last observed for this element
    #[must_use]
    pub const fn with_displayed(mut self, displayed: bool) -> Self {
        self.displayed = Some(displayed);
        self
    }

    /// Human readable path, e.g. `table >> tbody tr[2] >> td[0]`
    #[must_use]
    pub fn describe(&self) -> String {
        let own = format!("{}[{}]", self.selector, self.index);
        match &self.scope {
            Some(parent) => format!("{} >> {own}", parent.describe()),
            None => own,
        }
    }

    /// Fail with a driver error unless the handle belongs to `generation`
    pub fn ensure_fresh(&self, generation: u64) -> ProbeResult<()> {
        if self.generation == generation {
            Ok(())
        } else {
            Err(ProbeError::driver(format!(
                "stale element reference: {} was resolved before the last navigation",
                self.describe()
            )))
        }
    }
}

/// Screenshot data with metadata
#[derive(Debug, Clone)]
pub struct Screenshot {
    /// Raw PNG data
    pub data: Vec<u8>,
    /// Timestamp when screenshot was taken
    pub timestamp: std::time::SystemTime,
}

impl Screenshot {
    /// Create a new screenshot
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            timestamp: std::time::SystemTime::now(),
        }
    }

    /// Get the size in bytes
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Check if screenshot has data
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.data.is_empty()
    }
}

/// A browser cookie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    /// Cookie name
    pub name: String,
    /// Cookie value
    pub value: String,
    /// Cookie domain, if scoped
    pub domain: Option<String>,
    /// Cookie path, if scoped
    pub path: Option<String>,
}

impl Cookie {
    /// Create a session cookie for the current page
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: None,
        }
    }
}

/// Opaque identifier of a browser window or tab
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowHandle(pub String);

impl std::fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Abstract driver trait for browser automation
///
/// "Not found" is never an error at this level: lookups return empty
/// vectors. Errors mean the automation layer itself failed.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate to URL; bumps the generation
    async fn navigate(&self, url: &str) -> ProbeResult<()>;

    /// Get current URL
    async fn current_url(&self) -> ProbeResult<String>;

    /// Get the document title
    async fn title(&self) -> ProbeResult<String>;

    /// Go back in history; bumps the generation
    async fn back(&self) -> ProbeResult<()>;

    /// Reload page; bumps the generation
    async fn refresh(&self) -> ProbeResult<()>;

    /// Current navigation generation
    fn generation(&self) -> u64;

    /// Query all elements matching `selector`, in document order
    async fn find_elements(&self, selector: &Selector) -> ProbeResult<Vec<ElementHandle>>;

    /// Query elements matching `selector` inside `parent`
    async fn find_children(
        &self,
        parent: &ElementHandle,
        selector: &Selector,
    ) -> ProbeResult<Vec<ElementHandle>>;

    /// Whether the element still exists and is rendered visibly
    async fn is_displayed(&self, element: &ElementHandle) -> ProbeResult<bool>;

    /// Whether the element accepts interaction (not disabled)
    async fn is_enabled(&self, element: &ElementHandle) -> ProbeResult<bool>;

    /// Rendered text of the element
    async fn text(&self, element: &ElementHandle) -> ProbeResult<String>;

    /// Attribute (or form value for `value`) of the element
    async fn attribute(&self, element: &ElementHandle, name: &str)
        -> ProbeResult<Option<String>>;

    /// Click element
    async fn click(&self, element: &ElementHandle) -> ProbeResult<()>;

    /// Clear a form field
    async fn clear_value(&self, element: &ElementHandle) -> ProbeResult<()>;

    /// Type text into a form field, appending to its current value
    async fn set_value(&self, element: &ElementHandle, text: &str) -> ProbeResult<()>;

    /// Scroll the element into the viewport
    async fn scroll_into_view(&self, element: &ElementHandle) -> ProbeResult<()>;

    /// Execute JavaScript in page context
    async fn execute(&self, script: &str) -> ProbeResult<serde_json::Value>;

    /// Cookies visible to the current page
    async fn cookies(&self) -> ProbeResult<Vec<Cookie>>;

    /// Set a cookie
    async fn set_cookie(&self, cookie: Cookie) -> ProbeResult<()>;

    /// Delete all cookies
    async fn delete_cookies(&self) -> ProbeResult<()>;

    /// Handles of all open windows
    async fn window_handles(&self) -> ProbeResult<Vec<WindowHandle>>;

    /// Handle of the window commands currently go to
    async fn current_window(&self) -> ProbeResult<WindowHandle>;

    /// Direct subsequent commands to another window; bumps the generation
    async fn switch_to_window(&self, handle: &WindowHandle) -> ProbeResult<()>;

    /// Take screenshot
    async fn screenshot(&self) -> ProbeResult<Screenshot>;

    /// End the session
    async fn close(&self) -> ProbeResult<()>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod element_handle_tests {
        use super::*;

        #[test]
        fn test_element_handle_creation() {
            let elem = ElementHandle::new(Selector::css("button"), 0, 3);
            assert_eq!(elem.index, 0);
            assert_eq!(elem.generation, 3);
            assert!(elem.scope.is_none());
        }

        #[test]
        fn test_scoped_handle_inherits_generation() {
            let row = ElementHandle::new(Selector::css("tbody tr"), 2, 7);
            let cell = ElementHandle::scoped(&row, Selector::css("td"), 1);
            assert_eq!(cell.generation, 7);
            assert_eq!(cell.describe(), "tbody tr[2] >> td[1]");
        }

        #[test]
        fn test_stale_handle_rejected() {
            let elem = ElementHandle::new(Selector::css("a"), 0, 1);
            assert!(elem.ensure_fresh(1).is_ok());
            let err = elem.ensure_fresh(2).unwrap_err();
            assert!(err.to_string().contains("stale element reference"));
        }
    }

    mod screenshot_tests {
        use super::*;

        #[test]
        fn test_screenshot_size_and_validity() {
            let shot = Screenshot::new(vec![0x89, 0x50, 0x4E, 0x47]);
            assert_eq!(shot.size_bytes(), 4);
            assert!(shot.is_valid());
            assert!(!Screenshot::new(vec![]).is_valid());
        }
    }

    #[test]
    fn test_cookie_new_is_unscoped() {
        let cookie = Cookie::new("token", "abc");
        assert_eq!(cookie.name, "token");
        assert!(cookie.domain.is_none());
        assert!(cookie.path.is_none());
    }

    #[test]
    fn test_window_handle_display() {
        assert_eq!(WindowHandle("main".to_string()).to_string(), "main");
    }
}
