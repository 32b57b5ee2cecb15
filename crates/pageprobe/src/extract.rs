//! State extractor: rendered text turned into typed values.
//!
//! Parsers reject malformed input with [`ProbeError::Parse`] instead of
//! falling back to defaults. The only tolerated partial failure is a
//! malformed comment row, which is skipped with a warning.

use crate::driver::PageDriver;
use crate::locator::{Locator, Selector};
use crate::result::{ProbeError, ProbeResult};
use crate::wait::{WaitCondition, Waiter};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Prefix of the navbar greeting shown to a logged-in user
pub const GREETING_PREFIX: &str = "Hi,";

/// Cells a comment row needs: date, author, text
const COMMENT_CELLS: usize = 3;

/// One rendered row of the comments table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    /// Date column as rendered
    pub date: String,
    /// Author column
    pub author: String,
    /// Comment text
    pub text: String,
}

/// Authentication state derived from the live page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    /// The logged-in marker is visible
    Authenticated,
    /// No logged-in marker
    Anonymous,
}

impl AuthState {
    /// Whether this is [`AuthState::Authenticated`]
    #[must_use]
    pub const fn is_authenticated(self) -> bool {
        matches!(self, Self::Authenticated)
    }
}

/// Parse the first run of ASCII digits, e.g. `"Votes: 42"` -> `42`
pub fn parse_vote_count(text: &str) -> ProbeResult<u64> {
    let digits = Regex::new("[0-9]+").map_err(|e| ProbeError::parse("vote count", e.to_string()))?;
    let run = digits
        .find(text)
        .ok_or_else(|| ProbeError::parse("vote count", text))?;
    run.as_str()
        .parse::<u64>()
        .map_err(|_| ProbeError::parse("vote count", text))
}

/// Parse the user name out of a greeting such as `"Hi, test"`
pub fn parse_display_name(greeting: &str) -> ProbeResult<String> {
    let name = greeting
        .trim()
        .strip_prefix(GREETING_PREFIX)
        .map(str::trim)
        .ok_or_else(|| ProbeError::parse("display name", greeting))?;
    if name.is_empty() {
        return Err(ProbeError::parse("display name", greeting));
    }
    Ok(name.to_string())
}

/// Reads rendered state through a [`Waiter`]
pub struct Extractor<D: PageDriver + ?Sized> {
    waiter: Waiter<D>,
}

impl<D: PageDriver + ?Sized> Clone for Extractor<D> {
    fn clone(&self) -> Self {
        Self {
            waiter: self.waiter.clone(),
        }
    }
}

impl<D: PageDriver + ?Sized> std::fmt::Debug for Extractor<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("waiter", &self.waiter)
            .finish()
    }
}

impl<D: PageDriver + ?Sized> Extractor<D> {
    /// Create an extractor sharing `waiter`'s driver and options
    #[must_use]
    pub fn new(waiter: Waiter<D>) -> Self {
        Self { waiter }
    }

    /// Rendered text of the first visible match
    pub async fn text(&self, locator: &Locator) -> ProbeResult<String> {
        let handle = self.waiter.wait_for(locator, WaitCondition::Visible).await?;
        self.waiter.driver().text(&handle).await
    }

    /// Attribute of the first present match
    pub async fn attribute(&self, locator: &Locator, name: &str) -> ProbeResult<Option<String>> {
        let handle = self.waiter.wait_for(locator, WaitCondition::Exists).await?;
        self.waiter.driver().attribute(&handle, name).await
    }

    /// Whether anything matches right now
    pub async fn exists(&self, locator: &Locator) -> ProbeResult<bool> {
        Ok(self.waiter.check(locator, &WaitCondition::Exists).await?.is_some())
    }

    /// Whether any match is displayed right now
    pub async fn is_visible(&self, locator: &Locator) -> ProbeResult<bool> {
        Ok(self.waiter.check(locator, &WaitCondition::Visible).await?.is_some())
    }

    /// Vote count shown by the element, see [`parse_vote_count`]
    pub async fn vote_count(&self, locator: &Locator) -> ProbeResult<u64> {
        let text = self.text(locator).await?;
        let count = parse_vote_count(&text)?;
        debug!(locator = %locator.name(), count, "vote count");
        Ok(count)
    }

    /// Comment rows of `table`, in document order.
    ///
    /// Rows with fewer than three cells are skipped with a warning; the rest
    /// of the table is still read.
    pub async fn comment_records(
        &self,
        table: &Locator,
        row: &Selector,
        cell: &Selector,
    ) -> ProbeResult<Vec<CommentRecord>> {
        let driver = self.waiter.driver();
        let table_handle = self.waiter.wait_for(table, WaitCondition::Exists).await?;
        let rows = driver.find_children(&table_handle, row).await?;

        let mut records = Vec::with_capacity(rows.len());
        for (idx, row_handle) in rows.iter().enumerate() {
            let cells = driver.find_children(row_handle, cell).await?;
            if cells.len() < COMMENT_CELLS {
                warn!(
                    table = %table.name(),
                    row = idx + 1,
                    cells = cells.len(),
                    "skipping comment row with too few cells"
                );
                continue;
            }
            records.push(CommentRecord {
                date: driver.text(&cells[0]).await?.trim().to_string(),
                author: driver.text(&cells[1]).await?.trim().to_string(),
                text: driver.text(&cells[2]).await?.trim().to_string(),
            });
        }
        debug!(table = %table.name(), rows = rows.len(), records = records.len(), "comments read");
        Ok(records)
    }

    /// Immediate check of the logged-in marker.
    ///
    /// Right after a login action this races the page; use
    /// [`Extractor::wait_authenticated`] before asserting.
    pub async fn auth_state(&self, marker: &Locator) -> ProbeResult<AuthState> {
        Ok(if self.is_visible(marker).await? {
            AuthState::Authenticated
        } else {
            AuthState::Anonymous
        })
    }

    /// Wait for the logged-in marker, then report [`AuthState::Authenticated`]
    pub async fn wait_authenticated(&self, marker: &Locator) -> ProbeResult<AuthState> {
        let _ = self.waiter.wait_for(marker, WaitCondition::Visible).await?;
        Ok(AuthState::Authenticated)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock_driver::{MockDriver, MockElement};
    use crate::result::ErrorKind;
    use crate::wait::WaitOptions;
    use proptest::prelude::*;
    use std::sync::Arc;

    const URL: &str = "https://cars.test/model/1";

    async fn extractor(elements: Vec<MockElement>) -> Extractor<MockDriver> {
        let driver = Arc::new(MockDriver::new().with_page(URL, "Model", elements));
        driver.navigate(URL).await.unwrap();
        Extractor::new(
            Waiter::new(driver).with_options(WaitOptions::new().with_timeout(300).with_poll_interval(50)),
        )
    }

    fn row(cells: &[&str]) -> MockElement {
        cells.iter().fold(MockElement::new("tbody tr"), |row, text| {
            row.child(MockElement::new("td").text(*text))
        })
    }

    mod parser_tests {
        use super::*;

        #[test]
        fn test_vote_count_from_label() {
            assert_eq!(parse_vote_count("Votes: 42").unwrap(), 42);
            assert_eq!(parse_vote_count("1234 votes").unwrap(), 1234);
            assert_eq!(parse_vote_count("Votes: 7 (rank 3)").unwrap(), 7);
        }

        #[test]
        fn test_vote_count_without_digits_is_parse_error() {
            let err = parse_vote_count("no digits here").unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Parse);
            assert!(parse_vote_count("").is_err());
        }

        #[test]
        fn test_vote_count_overflow_is_parse_error() {
            let err = parse_vote_count("Votes: 99999999999999999999999").unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Parse);
        }

        #[test]
        fn test_display_name() {
            assert_eq!(parse_display_name("Hi, test").unwrap(), "test");
            assert_eq!(parse_display_name("  Hi,   Ana Maria ").unwrap(), "Ana Maria");
            assert!(parse_display_name("Hello, test").is_err());
            assert!(parse_display_name("Hi, ").is_err());
        }

        proptest! {
            #[test]
            fn prop_vote_count_finds_embedded_number(
                prefix in "[a-zA-Z :]{0,12}",
                n in any::<u64>(),
                suffix in "[a-zA-Z ]{0,12}",
            ) {
                let text = format!("{prefix}{n}{suffix}");
                prop_assert_eq!(parse_vote_count(&text).unwrap(), n);
            }

            #[test]
            fn prop_digitless_text_never_parses(text in "[^0-9]{0,40}") {
                prop_assert!(parse_vote_count(&text).is_err());
            }

            #[test]
            fn prop_display_name_roundtrips(name in "[a-zA-Z][a-zA-Z0-9_]{0,15}") {
                let greeting = format!("Hi, {name}");
                prop_assert_eq!(parse_display_name(&greeting).unwrap(), name);
            }
        }
    }

    mod comment_tests {
        use super::*;
        use std::io;
        use std::sync::Mutex;

        /// Log sink shared between a test and its subscriber
        #[derive(Clone, Default)]
        struct LogBuffer(Arc<Mutex<Vec<u8>>>);

        impl LogBuffer {
            fn contents(&self) -> String {
                String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
            }
        }

        impl io::Write for LogBuffer {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        #[tokio::test(start_paused = true)]
        async fn test_short_row_is_skipped() {
            let logs = LogBuffer::default();
            let sink = logs.clone();
            let subscriber = tracing_subscriber::fmt()
                .with_writer(move || sink.clone())
                .with_max_level(tracing::Level::WARN)
                .with_ansi(false)
                .finish();
            let _guard = tracing::subscriber::set_default(subscriber);

            let table = MockElement::new("table.table").child(
                MockElement::new("tbody")
                    .child(row(&["01/02/2026", "ana", "Great car"]))
                    .child(row(&["02/02/2026", "luis"]))
                    .child(row(&["03/02/2026", "test", " Needs better brakes "])),
            );
            let extractor = extractor(vec![table]).await;
            let records = extractor
                .comment_records(
                    &Locator::new("table.table"),
                    &Selector::css("tbody tr"),
                    &Selector::css("td"),
                )
                .await
                .unwrap();
            assert_eq!(records.len(), 2);
            assert_eq!(records[0].author, "ana");
            assert_eq!(records[1].text, "Needs better brakes");

            let logged = logs.contents();
            let warnings: Vec<_> = logged.lines().filter(|l| l.contains("WARN")).collect();
            assert_eq!(warnings.len(), 1, "{logged}");
            assert!(warnings[0].contains("skipping comment row with too few cells"));
            assert!(warnings[0].contains("row=2"));
            assert!(warnings[0].contains("cells=2"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_missing_table_is_timeout() {
            let extractor = extractor(vec![]).await;
            let err = extractor
                .comment_records(
                    &Locator::new("table.table"),
                    &Selector::css("tbody tr"),
                    &Selector::css("td"),
                )
                .await
                .unwrap_err();
            assert!(err.is_timeout());
        }
    }

    mod probe_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_vote_count_from_page() {
            let extractor = extractor(vec![MockElement::new("h4").text("Votes: 42")]).await;
            assert_eq!(extractor.vote_count(&Locator::new("h4")).await.unwrap(), 42);
        }

        #[tokio::test(start_paused = true)]
        async fn test_broken_vote_label_is_parse_error() {
            let extractor = extractor(vec![MockElement::new("h4").text("Votes: n/a")]).await;
            let err = extractor.vote_count(&Locator::new("h4")).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Parse);
        }

        #[tokio::test(start_paused = true)]
        async fn test_exists_and_visible_are_immediate() {
            let extractor = extractor(vec![MockElement::new(".hint").hidden()]).await;
            assert!(extractor.exists(&Locator::new(".hint")).await.unwrap());
            assert!(!extractor.is_visible(&Locator::new(".hint")).await.unwrap());
            assert!(!extractor.exists(&Locator::new(".absent")).await.unwrap());
        }

        #[tokio::test(start_paused = true)]
        async fn test_attribute() {
            let extractor =
                extractor(vec![MockElement::new("img").attr("src", "/img/car.png")]).await;
            assert_eq!(
                extractor
                    .attribute(&Locator::new("img"), "src")
                    .await
                    .unwrap()
                    .as_deref(),
                Some("/img/car.png")
            );
        }

        #[tokio::test(start_paused = true)]
        async fn test_auth_state() {
            let extractor = extractor(vec![MockElement::new("span.nav-link").text("Hi, test")]).await;
            let marker = Locator::new("span.nav-link");
            assert_eq!(
                extractor.auth_state(&marker).await.unwrap(),
                AuthState::Authenticated
            );
            assert_eq!(
                extractor.auth_state(&Locator::new(".nope")).await.unwrap(),
                AuthState::Anonymous
            );
            assert!(extractor
                .wait_authenticated(&marker)
                .await
                .unwrap()
                .is_authenticated());
        }
    }
}
