//! Action executor: user actions gated on wait conditions.
//!
//! Every action first waits for the condition it needs (clickable for
//! clicks, visible for typing) and re-raises wait failures unchanged.

use crate::driver::PageDriver;
use crate::locator::{Locator, Selector};
use crate::result::ProbeResult;
use crate::wait::{WaitCondition, Waiter};
use tracing::debug;

/// Performs clicks, typing and form edits through a [`Waiter`]
pub struct Actions<D: PageDriver + ?Sized> {
    waiter: Waiter<D>,
}

impl<D: PageDriver + ?Sized> Clone for Actions<D> {
    fn clone(&self) -> Self {
        Self {
            waiter: self.waiter.clone(),
        }
    }
}

impl<D: PageDriver + ?Sized> std::fmt::Debug for Actions<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Actions")
            .field("waiter", &self.waiter)
            .finish()
    }
}

impl<D: PageDriver + ?Sized> Actions<D> {
    /// Create an executor sharing `waiter`'s driver and options
    #[must_use]
    pub fn new(waiter: Waiter<D>) -> Self {
        Self { waiter }
    }

    /// Click once the element is clickable
    pub async fn click(&self, locator: &Locator) -> ProbeResult<()> {
        let handle = self.waiter.wait_for(locator, WaitCondition::Clickable).await?;
        debug!(locator = %locator.name(), "click");
        self.waiter.driver().click(&handle).await
    }

    /// Replace the field's content with `text`.
    ///
    /// The field is cleared first, so typing the same text twice leaves it
    /// holding `text` once.
    pub async fn type_text(&self, locator: &Locator, text: &str) -> ProbeResult<()> {
        let handle = self.waiter.wait_for(locator, WaitCondition::Visible).await?;
        debug!(locator = %locator.name(), chars = text.chars().count(), "type");
        let driver = self.waiter.driver();
        driver.clear_value(&handle).await?;
        driver.set_value(&handle, text).await
    }

    /// Empty a form field
    pub async fn clear(&self, locator: &Locator) -> ProbeResult<()> {
        let handle = self.waiter.wait_for(locator, WaitCondition::Visible).await?;
        debug!(locator = %locator.name(), "clear");
        self.waiter.driver().clear_value(&handle).await
    }

    /// Scroll the element into the viewport
    pub async fn scroll_into_view(&self, locator: &Locator) -> ProbeResult<()> {
        let handle = self.waiter.wait_for(locator, WaitCondition::Exists).await?;
        debug!(locator = %locator.name(), "scroll into view");
        self.waiter.driver().scroll_into_view(&handle).await
    }

    /// Choose the `<option>` with `value` inside a select element
    pub async fn select_option(&self, locator: &Locator, value: &str) -> ProbeResult<()> {
        let _ = self.waiter.wait_for(locator, WaitCondition::Clickable).await?;
        let option = locator.child(Selector::css(format!("option[value={value:?}]")));
        let handle = self.waiter.wait_for(&option, WaitCondition::Exists).await?;
        debug!(locator = %locator.name(), value, "select option");
        self.waiter.driver().click(&handle).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock_driver::{MockDriver, MockElement};
    use crate::result::ErrorKind;
    use crate::wait::WaitOptions;
    use std::sync::Arc;
    use std::time::Duration;

    const URL: &str = "https://cars.test/form";

    async fn actions(elements: Vec<MockElement>) -> (Arc<MockDriver>, Actions<MockDriver>) {
        let driver = Arc::new(MockDriver::new().with_page(URL, "Form", elements));
        driver.navigate(URL).await.unwrap();
        let waiter = Waiter::new(Arc::clone(&driver))
            .with_options(WaitOptions::new().with_timeout(500).with_poll_interval(50));
        (driver, Actions::new(waiter))
    }

    async fn value_of(driver: &MockDriver, css: &str) -> String {
        driver
            .dom()
            .await
            .value_of(&Selector::css(css))
            .unwrap_or_default()
    }

    mod typing_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_type_text_replaces_existing_value() {
            let (driver, actions) = actions(vec![MockElement::new("input").value("stale")]).await;
            let input = Locator::new("input");
            actions.type_text(&input, "testmail@gmail.com").await.unwrap();
            assert_eq!(value_of(&driver, "input").await, "testmail@gmail.com");
            actions.type_text(&input, "testmail@gmail.com").await.unwrap();
            assert_eq!(value_of(&driver, "input").await, "testmail@gmail.com");
        }

        #[tokio::test(start_paused = true)]
        async fn test_clear_twice_is_idempotent() {
            let (driver, actions) = actions(vec![MockElement::new("textarea").value("draft")]).await;
            let field = Locator::new("textarea");
            actions.clear(&field).await.unwrap();
            assert_eq!(value_of(&driver, "textarea").await, "");
            actions.clear(&field).await.unwrap();
            assert_eq!(value_of(&driver, "textarea").await, "");
        }

        #[tokio::test(start_paused = true)]
        async fn test_type_into_hidden_field_times_out() {
            let (_driver, actions) = actions(vec![MockElement::new("input").hidden()]).await;
            let err = actions
                .type_text(&Locator::new("input"), "x")
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Timeout);
        }
    }

    mod click_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_click_waits_until_enabled() {
            let (driver, actions) = actions(vec![MockElement::new("button").disabled()]).await;
            driver
                .schedule(Duration::from_millis(120), |dom| {
                    if let Some(b) = dom.first_mut(&Selector::css("button")) {
                        b.enabled = true;
                    }
                })
                .await;
            actions.click(&Locator::new("button")).await.unwrap();
            assert!(driver.was_called("click:button[0]").await);
        }

        #[tokio::test(start_paused = true)]
        async fn test_click_missing_element_is_timeout_not_driver_error() {
            let (_driver, actions) = actions(vec![]).await;
            let err = actions.click(&Locator::new("#vote")).await.unwrap_err();
            assert!(err.is_timeout());
        }

        #[tokio::test(start_paused = true)]
        async fn test_scroll_and_select() {
            let (driver, actions) = actions(vec![MockElement::new("select")
                .child(MockElement::new("option[value=\"a\"]"))
                .child(MockElement::new("option[value=\"b\"]"))])
            .await;
            let select = Locator::new("select");
            actions.scroll_into_view(&select).await.unwrap();
            actions.select_option(&select, "b").await.unwrap();
            assert!(driver.was_called("scroll:select[0]").await);
            assert!(driver
                .was_called("click:select >> option[value=\"b\"][0]")
                .await);
        }
    }
}
