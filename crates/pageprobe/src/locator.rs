//! Locator abstraction for element selection.
//!
//! A [`Locator`] is a logical, re-resolvable description of an element: it is
//! never bound to a live node. Resolution happens on every wait, so a locator
//! survives navigations that invalidate the [`ElementHandle`]s it produced.
//!
//! [`ElementHandle`]: crate::driver::ElementHandle

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selector {
    /// CSS selector (e.g., "button.primary")
    Css(String),
    /// XPath selector
    XPath(String),
    /// Test ID selector (data-testid attribute)
    TestId(String),
    /// CSS selector filtered by rendered text content
    CssWithText {
        /// Base CSS selector
        css: String,
        /// Text the element must contain
        text: String,
    },
    /// Elements matching `child` inside any element matching `parent`
    Descendant(Box<Selector>, Box<Selector>),
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create an XPath selector
    #[must_use]
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }

    /// Create a test ID selector
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::TestId(id.into())
    }

    /// Create a CSS selector that also requires the element text to contain `text`
    #[must_use]
    pub fn css_with_text(css: impl Into<String>, text: impl Into<String>) -> Self {
        Self::CssWithText {
            css: css.into(),
            text: text.into(),
        }
    }

    /// Scope `child` under this selector
    #[must_use]
    pub fn descendant(self, child: Self) -> Self {
        Self::Descendant(Box::new(self), Box::new(child))
    }

    /// JavaScript expression evaluating to an array of matching nodes under `scope`.
    ///
    /// `scope` is a JS expression for a node (`document` at the top level).
    #[must_use]
    pub fn to_js_all(&self, scope: &str) -> String {
        match self {
            Self::Css(css) => format!("Array.from({scope}.querySelectorAll({}))", js_str(css)),
            Self::XPath(expr) => format!(
                "(() => {{ const r = document.evaluate({}, {scope}, null, \
                 XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); \
                 return Array.from({{ length: r.snapshotLength }}, (_, i) => r.snapshotItem(i)); }})()",
                js_str(expr)
            ),
            Self::TestId(id) => format!(
                "Array.from({scope}.querySelectorAll({}))",
                js_str(&format!("[data-testid=\"{id}\"]"))
            ),
            Self::CssWithText { css, text } => format!(
                "Array.from({scope}.querySelectorAll({})).filter(el => \
                 (el.innerText || el.textContent || '').includes({}))",
                js_str(css),
                js_str(text)
            ),
            Self::Descendant(parent, child) => format!(
                "{}.flatMap(parent => {})",
                parent.to_js_all(scope),
                child.to_js_all("parent")
            ),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(css) => f.write_str(css),
            Self::XPath(expr) => write!(f, "xpath={expr}"),
            Self::TestId(id) => write!(f, "[data-testid=\"{id}\"]"),
            Self::CssWithText { css, text } => write!(f, "{css}:has-text({text:?})"),
            Self::Descendant(parent, child) => write!(f, "{parent} >> {child}"),
        }
    }
}

/// Quote a string as a JavaScript literal
pub(crate) fn js_str(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

/// Per-locator overrides for wait behaviour
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocatorOptions {
    /// Timeout override for waits on this locator
    pub timeout: Option<Duration>,
    /// Polling interval override for waits on this locator
    pub poll_interval: Option<Duration>,
}

/// A named, re-resolvable reference to an element on the current page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    selector: Selector,
    name: Option<String>,
    options: LocatorOptions,
}

impl Locator {
    /// Create a new locator with a CSS selector
    #[must_use]
    pub fn new(selector: impl Into<String>) -> Self {
        Self::from_selector(Selector::Css(selector.into()))
    }

    /// Create a locator from a selector
    #[must_use]
    pub fn from_selector(selector: Selector) -> Self {
        Self {
            selector,
            name: None,
            options: LocatorOptions::default(),
        }
    }

    /// Give the locator a human-readable name for logs and errors
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Filter by text content
    ///
    /// CSS selectors become [`Selector::CssWithText`]; other selectors are
    /// scoped to descendants carrying the text.
    #[must_use]
    pub fn with_text(self, text: impl Into<String>) -> Self {
        let selector = match self.selector {
            Selector::Css(css) => Selector::CssWithText {
                css,
                text: text.into(),
            },
            other => other.descendant(Selector::css_with_text("*", text)),
        };
        Self { selector, ..self }
    }

    /// Locator for elements matching `child` inside this locator's elements
    #[must_use]
    pub fn child(&self, child: Selector) -> Self {
        Self {
            selector: self.selector.clone().descendant(child),
            name: self.name.as_ref().map(|n| format!("{n} child")),
            options: self.options.clone(),
        }
    }

    /// Set a custom timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    /// Set a custom polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.options.poll_interval = Some(interval);
        self
    }

    /// Get the selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Get the options
    #[must_use]
    pub const fn options(&self) -> &LocatorOptions {
        &self.options
    }

    /// Name used in logs: the explicit name, or the selector itself
    #[must_use]
    pub fn name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.selector.to_string())
    }
}

impl From<Selector> for Locator {
    fn from(selector: Selector) -> Self {
        Self::from_selector(selector)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name} ({})", self.selector),
            None => write!(f, "{}", self.selector),
        }
    }
}
