//! Browser control over the Chrome `DevTools` Protocol.
//!
//! With the `browser` feature, [`ChromiumDriver`] implements [`PageDriver`]
//! on top of chromiumoxide. Element handles are re-resolved on every call
//! through the JS expressions built here, so nothing on the page side holds
//! a node reference across calls.
//!
//! The script builders are always compiled; they are plain string
//! generation and are unit tested without a browser.

use crate::driver::ElementHandle;
use crate::locator::js_str;
use crate::result::ProbeError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// Key a script returns when its element is no longer attached
pub const DETACHED_KEY: &str = "__detached";

/// Script body: visibility of `el`
pub const DISPLAYED_BODY: &str = "const s = getComputedStyle(el); const r = el.getBoundingClientRect(); \
     return s.display !== 'none' && s.visibility !== 'hidden' && (r.width > 0 || r.height > 0);";

/// Script body: enabled state of `el`
pub const ENABLED_BODY: &str = "return !el.disabled;";

/// Script body: rendered text of `el`
pub const TEXT_BODY: &str = "return el.innerText ?? el.textContent ?? '';";

/// Script body: empty a form field and notify listeners
pub const CLEAR_BODY: &str =
    "el.value = ''; el.dispatchEvent(new Event('input', { bubbles: true })); return true;";

/// Script body: focus `el` with the caret at the end
pub const FOCUS_BODY: &str = "el.focus(); \
     if (typeof el.setSelectionRange === 'function') { try { const n = el.value.length; el.setSelectionRange(n, n); } catch (_) {} } \
     return true;";

/// Script body: scroll `el` to the viewport centre
pub const SCROLL_BODY: &str = "el.scrollIntoView({ block: 'center', inline: 'center' }); return true;";

/// Script body: prepare a click. Options are selected in place; other
/// elements are scrolled into view and their centre point is returned.
pub const CLICK_BODY: &str = "if (el.tagName === 'OPTION') { el.selected = true; \
     const s = el.closest('select'); if (s) s.dispatchEvent(new Event('change', { bubbles: true })); \
     return { option: true }; } \
     el.scrollIntoView({ block: 'center', inline: 'center' }); \
     const r = el.getBoundingClientRect(); const st = getComputedStyle(el); \
     const shown = st.display !== 'none' && st.visibility !== 'hidden' && (r.width > 0 || r.height > 0); \
     return { option: false, interactable: shown && !el.disabled, x: r.left + r.width / 2, y: r.top + r.height / 2 };";

/// JS expression evaluating to the element behind `handle`, or `null`
#[must_use]
pub fn element_expr(handle: &ElementHandle) -> String {
    match &handle.scope {
        None => format!("({}[{}] ?? null)", handle.selector.to_js_all("document"), handle.index),
        Some(parent) => format!(
            "(() => {{ const p = {}; return p ? ({}[{}] ?? null) : null; }})()",
            element_expr(parent),
            handle.selector.to_js_all("p"),
            handle.index
        ),
    }
}

/// Script running `body` against the element behind `handle` bound as `el`.
///
/// Evaluates to `{ "__detached": true }` when the element is gone.
#[must_use]
pub fn element_script(handle: &ElementHandle, body: &str) -> String {
    format!(
        "(() => {{ const el = {}; if (!el) return {{ {DETACHED_KEY}: true }}; {body} }})()",
        element_expr(handle)
    )
}

/// Script body returning attribute `name` (form value for `value`)
#[must_use]
pub fn attribute_body(name: &str) -> String {
    if name == "value" {
        "return el.value === undefined ? null : String(el.value);".to_string()
    } else {
        format!("return el.getAttribute({});", js_str(name))
    }
}

/// Script counting matches of `selector` under `parent` (document when `None`).
///
/// Evaluates to `null` when the parent is gone.
#[must_use]
pub fn count_script(selector: &crate::locator::Selector, parent: Option<&ElementHandle>) -> String {
    match parent {
        None => format!("{}.length", selector.to_js_all("document")),
        Some(parent) => format!(
            "(() => {{ const p = {}; return p ? {}.length : null; }})()",
            element_expr(parent),
            selector.to_js_all("p")
        ),
    }
}

/// Whether a script result is the detached marker
#[must_use]
pub fn is_detached(value: &serde_json::Value) -> bool {
    value
        .get(DETACHED_KEY)
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false)
}

/// Error for an element that vanished from the page
#[must_use]
pub fn detached_error(handle: &ElementHandle) -> ProbeError {
    ProbeError::driver(format!(
        "stale element reference: {} is no longer attached",
        handle.describe()
    ))
}

/// Navigation generation derived from the identity of the main-frame document.
///
/// A document is identified by its frame, its loader and its URL without
/// fragment. Every observation that changes that identity moves the
/// generation forward; repeated reports of the same document do not, so
/// commit events and explicit frame-tree reads can both feed the tracker.
#[derive(Debug, Default)]
pub struct DocumentTracker {
    generation: AtomicU64,
    document: Mutex<Option<DocumentId>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct DocumentId {
    frame: String,
    loader: String,
    url: String,
}

fn without_fragment(url: &str) -> &str {
    url.split_once('#').map_or(url, |(head, _)| head)
}

impl DocumentTracker {
    /// Tracker that has seen no document yet
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current generation
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// A main-frame document was committed; returns whether the generation moved
    pub fn committed(&self, frame: &str, loader: &str, url: &str) -> bool {
        let next = DocumentId {
            frame: frame.to_string(),
            loader: loader.to_string(),
            url: without_fragment(url).to_string(),
        };
        self.replace(next)
    }

    /// The document at `frame` changed its URL in place (history API).
    ///
    /// Reports for a frame other than the current main frame are ignored.
    pub fn moved_within(&self, frame: &str, url: &str) -> bool {
        let current = self
            .document
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match current {
            Some(doc) if doc.frame == frame => self.replace(DocumentId {
                url: without_fragment(url).to_string(),
                ..doc
            }),
            _ => false,
        }
    }

    fn replace(&self, next: DocumentId) -> bool {
        let mut document = self.document.lock().unwrap_or_else(PoisonError::into_inner);
        if document.as_ref() == Some(&next) {
            return false;
        }
        *document = Some(next);
        let _ = self.generation.fetch_add(1, Ordering::SeqCst);
        true
    }
}

#[cfg(feature = "browser")]
pub use cdp::{ChromiumDriver, ChromiumSessionFactory};

#[cfg(feature = "browser")]
mod cdp {
    use super::*;
    use crate::config::BrowserSettings;
    use crate::driver::{Cookie, PageDriver, Screenshot, WindowHandle};
    use crate::harness::SessionFactory;
    use crate::locator::Selector;
    use crate::result::ProbeResult;
    use async_trait::async_trait;
    use base64::Engine;
    use chromiumoxide::browser::{Browser, BrowserConfig};
    use chromiumoxide::cdp::browser_protocol::input::InsertTextParams;
    use chromiumoxide::cdp::browser_protocol::network::{ClearBrowserCookiesParams, CookieParam};
    use chromiumoxide::cdp::browser_protocol::page::{
        CaptureScreenshotFormat, CaptureScreenshotParams, EventFrameNavigated,
        EventNavigatedWithinDocument, GetFrameTreeParams,
    };
    use chromiumoxide::layout::Point;
    use chromiumoxide::page::Page;
    use futures::StreamExt;
    use serde_json::Value;
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use tokio::task::JoinHandle;
    use tracing::{debug, info};

    fn cdp_err(err: impl std::fmt::Display) -> ProbeError {
        ProbeError::driver(err.to_string())
    }

    /// Browser session with a real CDP connection
    pub struct ChromiumDriver {
        browser: Mutex<Browser>,
        page: Mutex<Page>,
        handler: JoinHandle<()>,
        watcher: Mutex<JoinHandle<()>>,
        documents: Arc<DocumentTracker>,
    }

    enum PageEvent {
        Committed(Arc<EventFrameNavigated>),
        Within(Arc<EventNavigatedWithinDocument>),
    }

    /// Follow main-frame navigations of `page`, including those started by
    /// clicks and scripts, into `documents`
    async fn watch_navigations(
        page: &Page,
        documents: Arc<DocumentTracker>,
    ) -> ProbeResult<JoinHandle<()>> {
        let committed = page
            .event_listener::<EventFrameNavigated>()
            .await
            .map_err(cdp_err)?
            .map(PageEvent::Committed);
        let within = page
            .event_listener::<EventNavigatedWithinDocument>()
            .await
            .map_err(cdp_err)?
            .map(PageEvent::Within);
        let mut events = Box::pin(futures::stream::select(committed, within));
        Ok(tokio::spawn(async move {
            while let Some(event) = events.next().await {
                let moved = match &event {
                    PageEvent::Committed(nav) if nav.frame.parent_id.is_none() => documents
                        .committed(
                            nav.frame.id.inner(),
                            nav.frame.loader_id.inner(),
                            &nav.frame.url,
                        ),
                    PageEvent::Committed(_) => false,
                    PageEvent::Within(nav) => documents.moved_within(nav.frame_id.inner(), &nav.url),
                };
                if moved {
                    debug!(generation = documents.generation(), "page navigated");
                }
            }
        }))
    }

    impl std::fmt::Debug for ChromiumDriver {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("ChromiumDriver")
                .field("generation", &self.documents.generation())
                .finish_non_exhaustive()
        }
    }

    impl ChromiumDriver {
        /// Launch chromium and open a blank page
        pub async fn launch(settings: &BrowserSettings) -> ProbeResult<Self> {
            let mut builder = BrowserConfig::builder()
                .window_size(settings.window_width, settings.window_height);
            if !settings.headless {
                builder = builder.with_head();
            }
            if !settings.sandbox {
                builder = builder.no_sandbox();
            }
            if let Some(path) = &settings.chromium_path {
                builder = builder.chrome_executable(path);
            }
            let config = builder.build().map_err(ProbeError::driver)?;

            let (browser, mut handler) = Browser::launch(config).await.map_err(cdp_err)?;
            let handler = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });
            let page = browser.new_page("about:blank").await.map_err(cdp_err)?;
            let documents = Arc::new(DocumentTracker::new());
            let watcher = watch_navigations(&page, Arc::clone(&documents)).await?;
            info!(headless = settings.headless, "chromium session opened");

            let driver = Self {
                browser: Mutex::new(browser),
                page: Mutex::new(page),
                handler,
                watcher: Mutex::new(watcher),
                documents,
            };
            let _ = driver.sync_document().await?;
            Ok(driver)
        }

        async fn page(&self) -> Page {
            self.page.lock().await.clone()
        }

        /// Read the main frame and feed it to the tracker, so a navigation
        /// whose event has not been delivered yet still moves the generation
        async fn sync_document(&self) -> ProbeResult<u64> {
            let tree = self
                .page()
                .await
                .execute(GetFrameTreeParams::default())
                .await
                .map_err(cdp_err)?;
            let frame = &tree.frame_tree.frame;
            let _ = self
                .documents
                .committed(frame.id.inner(), frame.loader_id.inner(), &frame.url);
            Ok(self.documents.generation())
        }

        async fn eval(&self, script: String) -> ProbeResult<Value> {
            let result = self.page().await.evaluate(script).await.map_err(cdp_err)?;
            Ok(result.value().cloned().unwrap_or(Value::Null))
        }

        /// Run `body` against the element; detached elements are stale
        async fn on_element(&self, element: &ElementHandle, body: &str) -> ProbeResult<Value> {
            element.ensure_fresh(self.sync_document().await?)?;
            let value = self.eval(element_script(element, body)).await?;
            if is_detached(&value) {
                return Err(detached_error(element));
            }
            Ok(value)
        }

        async fn count(
            &self,
            selector: &Selector,
            parent: Option<&ElementHandle>,
        ) -> ProbeResult<Option<usize>> {
            let value = self.eval(count_script(selector, parent)).await?;
            Ok(value.as_u64().map(|n| n as usize))
        }
    }

    #[async_trait]
    impl PageDriver for ChromiumDriver {
        async fn navigate(&self, url: &str) -> ProbeResult<()> {
            debug!(url, "navigate");
            let _ = self.page().await.goto(url).await.map_err(cdp_err)?;
            let _ = self.sync_document().await?;
            Ok(())
        }

        async fn current_url(&self) -> ProbeResult<String> {
            Ok(self
                .page()
                .await
                .url()
                .await
                .map_err(cdp_err)?
                .unwrap_or_default())
        }

        async fn title(&self) -> ProbeResult<String> {
            Ok(self
                .page()
                .await
                .get_title()
                .await
                .map_err(cdp_err)?
                .unwrap_or_default())
        }

        async fn back(&self) -> ProbeResult<()> {
            let _ = self.eval("window.history.back()".to_string()).await?;
            let _ = self.sync_document().await?;
            Ok(())
        }

        async fn refresh(&self) -> ProbeResult<()> {
            let _ = self.page().await.reload().await.map_err(cdp_err)?;
            let _ = self.sync_document().await?;
            Ok(())
        }

        fn generation(&self) -> u64 {
            self.documents.generation()
        }

        async fn find_elements(&self, selector: &Selector) -> ProbeResult<Vec<ElementHandle>> {
            let generation = self.sync_document().await?;
            let count = self.count(selector, None).await?.unwrap_or(0);
            Ok((0..count)
                .map(|i| ElementHandle::new(selector.clone(), i, generation))
                .collect())
        }

        async fn find_children(
            &self,
            parent: &ElementHandle,
            selector: &Selector,
        ) -> ProbeResult<Vec<ElementHandle>> {
            parent.ensure_fresh(self.sync_document().await?)?;
            let count = self
                .count(selector, Some(parent))
                .await?
                .ok_or_else(|| detached_error(parent))?;
            Ok((0..count)
                .map(|i| ElementHandle::scoped(parent, selector.clone(), i))
                .collect())
        }

        async fn is_displayed(&self, element: &ElementHandle) -> ProbeResult<bool> {
            element.ensure_fresh(self.sync_document().await?)?;
            let value = self.eval(element_script(element, DISPLAYED_BODY)).await?;
            Ok(value.as_bool().unwrap_or(false))
        }

        async fn is_enabled(&self, element: &ElementHandle) -> ProbeResult<bool> {
            Ok(self
                .on_element(element, ENABLED_BODY)
                .await?
                .as_bool()
                .unwrap_or(false))
        }

        async fn text(&self, element: &ElementHandle) -> ProbeResult<String> {
            Ok(self
                .on_element(element, TEXT_BODY)
                .await?
                .as_str()
                .unwrap_or_default()
                .to_string())
        }

        async fn attribute(
            &self,
            element: &ElementHandle,
            name: &str,
        ) -> ProbeResult<Option<String>> {
            let value = self.on_element(element, &attribute_body(name)).await?;
            Ok(value.as_str().map(str::to_string))
        }

        async fn click(&self, element: &ElementHandle) -> ProbeResult<()> {
            let target = self.on_element(element, CLICK_BODY).await?;
            if target.get("option").and_then(Value::as_bool) == Some(true) {
                return Ok(());
            }
            if target.get("interactable").and_then(Value::as_bool) != Some(true) {
                return Err(ProbeError::driver(format!(
                    "element not interactable: {}",
                    element.describe()
                )));
            }
            let coord = |key: &str| {
                target
                    .get(key)
                    .and_then(Value::as_f64)
                    .ok_or_else(|| ProbeError::driver(format!("no click point for {}", element.describe())))
            };
            let point = Point::new(coord("x")?, coord("y")?);
            let _ = self.page().await.click(point).await.map_err(cdp_err)?;
            Ok(())
        }

        async fn clear_value(&self, element: &ElementHandle) -> ProbeResult<()> {
            let _ = self.on_element(element, CLEAR_BODY).await?;
            Ok(())
        }

        async fn set_value(&self, element: &ElementHandle, text: &str) -> ProbeResult<()> {
            let _ = self.on_element(element, FOCUS_BODY).await?;
            let _ = self
                .page()
                .await
                .execute(InsertTextParams::new(text))
                .await
                .map_err(cdp_err)?;
            Ok(())
        }

        async fn scroll_into_view(&self, element: &ElementHandle) -> ProbeResult<()> {
            let _ = self.on_element(element, SCROLL_BODY).await?;
            Ok(())
        }

        async fn execute(&self, script: &str) -> ProbeResult<Value> {
            self.eval(script.to_string()).await
        }

        async fn cookies(&self) -> ProbeResult<Vec<Cookie>> {
            let cookies = self.page().await.get_cookies().await.map_err(cdp_err)?;
            Ok(cookies
                .into_iter()
                .map(|c| Cookie {
                    name: c.name,
                    value: c.value,
                    domain: Some(c.domain),
                    path: Some(c.path),
                })
                .collect())
        }

        async fn set_cookie(&self, cookie: Cookie) -> ProbeResult<()> {
            let mut param = CookieParam::new(cookie.name, cookie.value);
            param.domain = cookie.domain;
            param.path = cookie.path;
            let _ = self.page().await.set_cookie(param).await.map_err(cdp_err)?;
            Ok(())
        }

        async fn delete_cookies(&self) -> ProbeResult<()> {
            let _ = self
                .page()
                .await
                .execute(ClearBrowserCookiesParams::default())
                .await
                .map_err(cdp_err)?;
            Ok(())
        }

        async fn window_handles(&self) -> ProbeResult<Vec<WindowHandle>> {
            let pages = self.browser.lock().await.pages().await.map_err(cdp_err)?;
            Ok(pages
                .iter()
                .map(|p| WindowHandle(p.target_id().inner().clone()))
                .collect())
        }

        async fn current_window(&self) -> ProbeResult<WindowHandle> {
            Ok(WindowHandle(self.page().await.target_id().inner().clone()))
        }

        async fn switch_to_window(&self, handle: &WindowHandle) -> ProbeResult<()> {
            let pages = self.browser.lock().await.pages().await.map_err(cdp_err)?;
            let page = pages
                .into_iter()
                .find(|p| p.target_id().inner() == &handle.0)
                .ok_or_else(|| ProbeError::driver(format!("no such window: {handle}")))?;
            let _ = page.bring_to_front().await.map_err(cdp_err)?;
            let watcher = watch_navigations(&page, Arc::clone(&self.documents)).await?;
            *self.page.lock().await = page;
            let previous = std::mem::replace(&mut *self.watcher.lock().await, watcher);
            previous.abort();
            let _ = self.sync_document().await?;
            Ok(())
        }

        async fn screenshot(&self) -> ProbeResult<Screenshot> {
            let params = CaptureScreenshotParams::builder()
                .format(CaptureScreenshotFormat::Png)
                .build();
            let shot = self.page().await.execute(params).await.map_err(cdp_err)?;
            let data = base64::engine::general_purpose::STANDARD
                .decode(&shot.data)
                .map_err(cdp_err)?;
            Ok(Screenshot::new(data))
        }

        async fn close(&self) -> ProbeResult<()> {
            self.watcher.lock().await.abort();
            let closed = self.browser.lock().await.close().await.map_err(cdp_err);
            self.handler.abort();
            let _ = closed?;
            info!("chromium session closed");
            Ok(())
        }
    }

    /// Launches one chromium per scenario
    #[derive(Debug, Clone)]
    pub struct ChromiumSessionFactory {
        settings: BrowserSettings,
    }

    impl ChromiumSessionFactory {
        /// Create a factory launching with `settings`
        #[must_use]
        pub const fn new(settings: BrowserSettings) -> Self {
            Self { settings }
        }
    }

    #[async_trait]
    impl SessionFactory for ChromiumSessionFactory {
        type Driver = ChromiumDriver;

        async fn open(&self) -> ProbeResult<Arc<ChromiumDriver>> {
            Ok(Arc::new(ChromiumDriver::launch(&self.settings).await?))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::locator::Selector;
    use serde_json::json;

    fn row_cell() -> ElementHandle {
        let table = ElementHandle::new(Selector::css("table.table"), 0, 1);
        let row = ElementHandle::scoped(&table, Selector::css("tbody tr"), 2);
        ElementHandle::scoped(&row, Selector::css("td"), 1)
    }

    mod script_tests {
        use super::*;

        #[test]
        fn test_top_level_expr_indexes_matches() {
            let handle = ElementHandle::new(Selector::css("button"), 3, 0);
            assert_eq!(
                element_expr(&handle),
                r#"(Array.from(document.querySelectorAll("button"))[3] ?? null)"#
            );
        }

        #[test]
        fn test_scoped_expr_nests_parents() {
            let expr = element_expr(&row_cell());
            assert!(expr.contains(r#"document.querySelectorAll("table.table"))[0]"#));
            assert!(expr.contains(r#"p.querySelectorAll("tbody tr"))[2]"#));
            assert!(expr.contains(r#"p.querySelectorAll("td"))[1]"#));
            assert_eq!(expr.matches("const p =").count(), 2);
        }

        #[test]
        fn test_element_script_guards_detached() {
            let script = element_script(&row_cell(), TEXT_BODY);
            assert!(script.contains("if (!el) return { __detached: true };"));
            assert!(script.ends_with("return el.innerText ?? el.textContent ?? ''; })()"));
        }

        #[test]
        fn test_attribute_body_quotes_name() {
            assert!(attribute_body("value").contains("el.value"));
            assert_eq!(
                attribute_body(r#"data-"x""#),
                r#"return el.getAttribute("data-\"x\"");"#
            );
        }

        #[test]
        fn test_count_script() {
            assert_eq!(
                count_script(&Selector::css("tr"), None),
                r#"Array.from(document.querySelectorAll("tr")).length"#
            );
            let scoped = count_script(&Selector::css("td"), Some(&row_cell()));
            assert!(scoped.contains("return p ?"));
            assert!(scoped.ends_with(".length : null; })()"));
        }
    }

    mod detached_tests {
        use super::*;

        #[test]
        fn test_detached_marker() {
            assert!(is_detached(&json!({ "__detached": true })));
            assert!(!is_detached(&json!({ "option": true })));
            assert!(!is_detached(&json!("text")));
            assert!(!is_detached(&serde_json::Value::Null));
        }

        #[test]
        fn test_detached_error_is_stale() {
            let err = detached_error(&row_cell());
            assert!(err.is_stale_reference());
            assert!(err.to_string().contains("td[1]"));
        }
    }

    mod tracker_tests {
        use super::*;
        use crate::page_object::{PageLifecycle, PageState};

        const HOME: &str = "https://buggy.test/";
        const MODEL: &str = "https://buggy.test/model/ckl2phsabijs71623vk0";

        #[test]
        fn test_first_document_starts_generation() {
            let tracker = DocumentTracker::new();
            assert_eq!(tracker.generation(), 0);
            assert!(tracker.committed("F1", "L1", "about:blank"));
            assert_eq!(tracker.generation(), 1);
        }

        #[test]
        fn test_same_document_reported_twice_moves_once() {
            let tracker = DocumentTracker::new();
            assert!(tracker.committed("F1", "L1", HOME));
            assert!(!tracker.committed("F1", "L1", HOME));
            assert!(!tracker.committed("F1", "L1", "https://buggy.test/#top"));
            assert_eq!(tracker.generation(), 1);
        }

        #[test]
        fn test_new_loader_moves_generation() {
            let tracker = DocumentTracker::new();
            tracker.committed("F1", "L1", HOME);
            assert!(tracker.committed("F1", "L2", HOME));
            assert_eq!(tracker.generation(), 2);
        }

        #[test]
        fn test_in_place_route_change_moves_generation() {
            let tracker = DocumentTracker::new();
            tracker.committed("F1", "L1", HOME);
            assert!(tracker.moved_within("F1", MODEL));
            assert_eq!(tracker.generation(), 2);
            assert!(!tracker.committed("F1", "L1", MODEL));
            assert!(!tracker.moved_within("F1", "https://buggy.test/model/ckl2phsabijs71623vk0#c"));
            assert_eq!(tracker.generation(), 2);
        }

        #[test]
        fn test_other_frame_route_change_ignored() {
            let tracker = DocumentTracker::new();
            assert!(!tracker.moved_within("F1", MODEL));
            tracker.committed("F1", "L1", HOME);
            assert!(!tracker.moved_within("IFRAME", MODEL));
            assert_eq!(tracker.generation(), 1);
        }

        #[test]
        fn test_link_navigation_stales_handles_and_pages() {
            let tracker = DocumentTracker::new();
            tracker.committed("F1", "L1", HOME);
            let ready_at = tracker.generation();
            let card = ElementHandle::new(Selector::css("div.card"), 0, ready_at);
            let home = PageLifecycle::default();
            home.set(PageState::Ready, ready_at);

            tracker.moved_within("F1", MODEL);

            let err = card.ensure_fresh(tracker.generation()).unwrap_err();
            assert!(err.is_stale_reference());
            assert_eq!(home.state(tracker.generation()), PageState::Stale);
        }
    }
}
