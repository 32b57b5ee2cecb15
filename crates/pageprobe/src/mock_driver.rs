//! Scripted in-memory driver for unit testing page objects.
//!
//! The mock keeps a tree of [`MockElement`]s per registered URL. Elements are
//! matched by the exact [`Selector`] they were registered under (plus the
//! text filter of [`Selector::CssWithText`]), at any depth, in document order.
//!
//! Asynchronous UI is simulated with delayed mutations: a click can schedule
//! changes that land after a delay measured on `tokio::time`, so tests under
//! `#[tokio::test(start_paused = true)]` observe exactly the races a real
//! browser would produce, deterministically.

use crate::driver::{Cookie, ElementHandle, PageDriver, Screenshot, WindowHandle};
use crate::locator::Selector;
use crate::result::{ProbeError, ProbeResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// PNG signature returned as the default mock screenshot
const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// A DOM mutation applied by a scheduled reaction
pub type Mutation = Arc<dyn Fn(&mut MockDom) + Send + Sync>;

/// One node of the mock DOM
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockElement {
    /// Selector this node answers to
    pub key: Selector,
    /// Rendered text
    pub text: String,
    /// Form value
    pub value: String,
    /// Rendered visibly
    pub displayed: bool,
    /// Accepts interaction
    pub enabled: bool,
    /// Attributes
    pub attributes: HashMap<String, String>,
    /// Child nodes
    pub children: Vec<MockElement>,
}

impl MockElement {
    /// Visible, enabled element matched by a CSS selector
    #[must_use]
    pub fn new(css: impl Into<String>) -> Self {
        Self::keyed(Selector::css(css))
    }

    /// Visible, enabled element matched by an arbitrary selector
    #[must_use]
    pub fn keyed(key: Selector) -> Self {
        Self {
            key,
            text: String::new(),
            value: String::new(),
            displayed: true,
            enabled: true,
            attributes: HashMap::new(),
            children: Vec::new(),
        }
    }

    /// Set rendered text
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set form value
    #[must_use]
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Render the element invisibly
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    /// Disable the element
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Set an attribute
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.attributes.insert(name.into(), value.into());
        self
    }

    /// Append a child
    #[must_use]
    pub fn child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    fn matches(&self, selector: &Selector) -> bool {
        if self.key == *selector {
            return true;
        }
        match selector {
            Selector::CssWithText { css, text } => {
                matches!(&self.key, Selector::Css(own) if own == css) && self.text.contains(text)
            }
            _ => false,
        }
    }
}

/// Path of child indexes from the root list to a node
type NodePath = Vec<usize>;

/// Mutable view of a mock page, handed to scheduled mutations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockDom {
    roots: Vec<MockElement>,
}

impl MockDom {
    /// Create a DOM from top-level elements
    #[must_use]
    pub fn new(roots: Vec<MockElement>) -> Self {
        Self { roots }
    }

    /// Append a top-level element
    pub fn insert(&mut self, element: MockElement) {
        self.roots.push(element);
    }

    /// Append a child to the first element matching `parent`
    pub fn append_child(&mut self, parent: &Selector, child: MockElement) {
        if let Some(node) = self.first_mut(parent) {
            node.children.push(child);
        }
    }

    /// Remove every element matching `selector`
    pub fn remove(&mut self, selector: &Selector) {
        fn prune(nodes: &mut Vec<MockElement>, selector: &Selector) {
            nodes.retain(|n| !n.matches(selector));
            for node in nodes {
                prune(&mut node.children, selector);
            }
        }
        prune(&mut self.roots, selector);
    }

    /// Show every element matching `selector`
    pub fn show(&mut self, selector: &Selector) {
        self.for_each_mut(selector, |n| n.displayed = true);
    }

    /// Hide every element matching `selector`
    pub fn hide(&mut self, selector: &Selector) {
        self.for_each_mut(selector, |n| n.displayed = false);
    }

    /// Replace the text of every element matching `selector`
    pub fn set_text(&mut self, selector: &Selector, text: &str) {
        self.for_each_mut(selector, |n| n.text = text.to_string());
    }

    /// Form value of the first element matching `selector`
    #[must_use]
    pub fn value_of(&self, selector: &Selector) -> Option<String> {
        let path = self.matches(selector).into_iter().next()?;
        self.node(&path).map(|n| n.value.clone())
    }

    /// Text of the first element matching `selector`
    #[must_use]
    pub fn text_of(&self, selector: &Selector) -> Option<String> {
        let path = self.matches(selector).into_iter().next()?;
        self.node(&path).map(|n| n.text.clone())
    }

    /// First element matching `selector`
    pub fn first_mut(&mut self, selector: &Selector) -> Option<&mut MockElement> {
        let path = self.matches(selector).into_iter().next()?;
        self.node_mut(&path)
    }

    fn for_each_mut(&mut self, selector: &Selector, f: impl Fn(&mut MockElement)) {
        for path in self.matches(selector) {
            if let Some(node) = self.node_mut(&path) {
                f(node);
            }
        }
    }

    fn node(&self, path: &[usize]) -> Option<&MockElement> {
        let (first, rest) = path.split_first()?;
        let mut node = self.roots.get(*first)?;
        for idx in rest {
            node = node.children.get(*idx)?;
        }
        Some(node)
    }

    fn node_mut(&mut self, path: &[usize]) -> Option<&mut MockElement> {
        let (first, rest) = path.split_first()?;
        let mut node = self.roots.get_mut(*first)?;
        for idx in rest {
            node = node.children.get_mut(*idx)?;
        }
        Some(node)
    }

    /// All paths matching `selector` from the root, in document order
    fn matches(&self, selector: &Selector) -> Vec<NodePath> {
        matches_under(&self.roots, &[], selector)
    }

    /// Paths matching `selector` strictly inside the node at `parent`
    fn matches_within(&self, parent: &[usize], selector: &Selector) -> Vec<NodePath> {
        self.node(parent)
            .map(|node| matches_under(&node.children, parent, selector))
            .unwrap_or_default()
    }

    fn resolve(&self, handle: &ElementHandle) -> Option<NodePath> {
        let candidates = match &handle.scope {
            Some(parent) => {
                let parent_path = self.resolve(parent)?;
                self.matches_within(&parent_path, &handle.selector)
            }
            None => self.matches(&handle.selector),
        };
        candidates.into_iter().nth(handle.index)
    }
}

fn matches_under(nodes: &[MockElement], prefix: &[usize], selector: &Selector) -> Vec<NodePath> {
    if let Selector::Descendant(parent, child) = selector {
        let mut out: Vec<NodePath> = Vec::new();
        for parent_path in matches_under(nodes, prefix, parent) {
            let Some(node) = node_at(nodes, prefix, &parent_path) else {
                continue;
            };
            for path in matches_under(&node.children, &parent_path, child) {
                if !out.contains(&path) {
                    out.push(path);
                }
            }
        }
        return out;
    }

    let mut out = Vec::new();
    for (i, node) in nodes.iter().enumerate() {
        let mut path = prefix.to_vec();
        path.push(i);
        if node.matches(selector) {
            out.push(path.clone());
        }
        out.extend(matches_under(&node.children, &path, selector));
    }
    out
}

/// Node at an absolute `path`, given the node list that lives at `prefix`
fn node_at<'a>(nodes: &'a [MockElement], prefix: &[usize], path: &[usize]) -> Option<&'a MockElement> {
    let rest = path.strip_prefix(prefix)?;
    let (first, tail) = rest.split_first()?;
    let mut node = nodes.get(*first)?;
    for idx in tail {
        node = node.children.get(*idx)?;
    }
    Some(node)
}

/// A page the mock can navigate to
#[derive(Debug, Clone, Default)]
struct MockPage {
    title: String,
    dom: MockDom,
}

enum Effect {
    /// Change the current DOM
    Mutate(Mutation),
    /// Follow a link
    Navigate(String),
}

struct Reaction {
    trigger: Selector,
    delay: Duration,
    effect: Effect,
}

struct Pending {
    due: Instant,
    seq: u64,
    mutation: Mutation,
}

struct MockState {
    pages: HashMap<String, MockPage>,
    dom: MockDom,
    url: String,
    title: String,
    history: Vec<String>,
    reactions: Vec<Reaction>,
    pending: Vec<Pending>,
    load_hooks: Vec<Mutation>,
    next_seq: u64,
    cookies: Vec<Cookie>,
    windows: Vec<WindowHandle>,
    current_window: usize,
    script_results: HashMap<String, serde_json::Value>,
    screenshot: Vec<u8>,
    calls: Vec<String>,
    connected: bool,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            pages: HashMap::new(),
            dom: MockDom::default(),
            url: "about:blank".to_string(),
            title: String::new(),
            history: Vec::new(),
            reactions: Vec::new(),
            pending: Vec::new(),
            load_hooks: Vec::new(),
            next_seq: 0,
            cookies: Vec::new(),
            windows: vec![WindowHandle("window-0".to_string())],
            current_window: 0,
            script_results: HashMap::new(),
            screenshot: PNG_SIGNATURE.to_vec(),
            calls: Vec::new(),
            connected: true,
        }
    }
}

impl MockState {
    fn schedule(&mut self, delay: Duration, mutation: Mutation) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Pending {
            due: Instant::now() + delay,
            seq,
            mutation,
        });
    }

    fn apply_due(&mut self) {
        let now = Instant::now();
        let (mut due, rest): (Vec<Pending>, Vec<Pending>) =
            self.pending.drain(..).partition(|p| p.due <= now);
        self.pending = rest;
        due.sort_by_key(|p| (p.due, p.seq));
        for p in due {
            (p.mutation)(&mut self.dom);
        }
    }

    fn load(&mut self, url: &str) {
        let page = self.pages.get(url).cloned().unwrap_or_default();
        self.dom = page.dom;
        for hook in &self.load_hooks {
            hook(&mut self.dom);
        }
        self.title = page.title;
        self.url = url.to_string();
        self.pending.clear();
    }

    fn resolve(&self, handle: &ElementHandle) -> ProbeResult<&MockElement> {
        self.dom
            .resolve(handle)
            .and_then(|path| self.dom.node(&path))
            .ok_or_else(|| {
                ProbeError::driver(format!(
                    "stale element reference: {} is no longer attached",
                    handle.describe()
                ))
            })
    }

    fn resolve_mut(&mut self, handle: &ElementHandle) -> ProbeResult<&mut MockElement> {
        let path = self.dom.resolve(handle).ok_or_else(|| {
            ProbeError::driver(format!(
                "stale element reference: {} is no longer attached",
                handle.describe()
            ))
        })?;
        self.dom
            .node_mut(&path)
            .ok_or_else(|| ProbeError::driver("mock DOM path vanished"))
    }
}

/// Mock driver for unit testing
pub struct MockDriver {
    state: Mutex<MockState>,
    generation: AtomicU64,
}

impl std::fmt::Debug for MockDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockDriver")
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDriver {
    /// Create new mock driver on `about:blank`
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
            generation: AtomicU64::new(0),
        }
    }

    /// Register a page served at `url`
    #[must_use]
    pub fn with_page(
        mut self,
        url: impl Into<String>,
        title: impl Into<String>,
        elements: Vec<MockElement>,
    ) -> Self {
        let _ = self.state.get_mut().pages.insert(
            url.into(),
            MockPage {
                title: title.into(),
                dom: MockDom::new(elements),
            },
        );
        self
    }

    /// Apply `mutation` to the DOM `delay` after any click on `trigger`
    #[must_use]
    pub fn on_click<F>(mut self, trigger: Selector, delay: Duration, mutation: F) -> Self
    where
        F: Fn(&mut MockDom) + Send + Sync + 'static,
    {
        self.state.get_mut().reactions.push(Reaction {
            trigger,
            delay,
            effect: Effect::Mutate(Arc::new(mutation)),
        });
        self
    }

    /// Run `hook` on every freshly loaded page, e.g. to render server-side
    /// session state into the markup
    #[must_use]
    pub fn on_load<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut MockDom) + Send + Sync + 'static,
    {
        self.state.get_mut().load_hooks.push(Arc::new(hook));
        self
    }

    /// Clicking `trigger` loads `url`
    #[must_use]
    pub fn with_link(mut self, trigger: Selector, url: impl Into<String>) -> Self {
        self.state.get_mut().reactions.push(Reaction {
            trigger,
            delay: Duration::ZERO,
            effect: Effect::Navigate(url.into()),
        });
        self
    }

    /// Fix the result returned by `execute` for an exact script
    #[must_use]
    pub fn with_script_result(mut self, script: impl Into<String>, value: serde_json::Value) -> Self {
        let _ = self
            .state
            .get_mut()
            .script_results
            .insert(script.into(), value);
        self
    }

    /// Apply `mutation` to the current DOM after `delay`
    pub async fn schedule<F>(&self, delay: Duration, mutation: F)
    where
        F: Fn(&mut MockDom) + Send + Sync + 'static,
    {
        self.state.lock().await.schedule(delay, Arc::new(mutation));
    }

    /// Mutate the current DOM immediately
    pub async fn mutate<F>(&self, mutation: F)
    where
        F: FnOnce(&mut MockDom),
    {
        mutation(&mut self.state.lock().await.dom);
    }

    /// Snapshot of the current DOM
    pub async fn dom(&self) -> MockDom {
        let mut state = self.state.lock().await;
        state.apply_due();
        state.dom.clone()
    }

    /// Open an extra window and return its handle
    pub async fn open_window(&self) -> WindowHandle {
        let mut state = self.state.lock().await;
        let handle = WindowHandle(format!("window-{}", state.windows.len()));
        state.windows.push(handle.clone());
        handle
    }

    /// Simulate a lost session: every later call fails with a driver error
    pub async fn disconnect(&self) {
        self.state.lock().await.connected = false;
    }

    /// Recorded calls, e.g. `navigate:https://…` or `click:button[0]`
    pub async fn calls(&self) -> Vec<String> {
        self.state.lock().await.calls.clone()
    }

    /// Check if a call starting with `prefix` was recorded
    pub async fn was_called(&self, prefix: &str) -> bool {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .any(|c| c.starts_with(prefix))
    }

    /// Lock state, record the call, fail when disconnected, apply due mutations
    async fn enter(&self, call: String) -> ProbeResult<tokio::sync::MutexGuard<'_, MockState>> {
        let mut state = self.state.lock().await;
        state.calls.push(call);
        if !state.connected {
            return Err(ProbeError::driver("no active session"));
        }
        state.apply_due();
        Ok(state)
    }

    fn bump_generation(&self) {
        let _ = self.generation.fetch_add(1, Ordering::SeqCst);
    }

    fn check_fresh(&self, handle: &ElementHandle) -> ProbeResult<()> {
        handle.ensure_fresh(self.generation())
    }

    fn handles(&self, selector: &Selector, count: usize, parent: Option<&ElementHandle>) -> Vec<ElementHandle> {
        (0..count)
            .map(|i| match parent {
                Some(p) => ElementHandle::scoped(p, selector.clone(), i),
                None => ElementHandle::new(selector.clone(), i, self.generation()),
            })
            .collect()
    }
}

#[async_trait]
impl PageDriver for MockDriver {
    async fn navigate(&self, url: &str) -> ProbeResult<()> {
        let mut state = self.enter(format!("navigate:{url}")).await?;
        let previous = state.url.clone();
        state.history.push(previous);
        state.load(url);
        self.bump_generation();
        Ok(())
    }

    async fn current_url(&self) -> ProbeResult<String> {
        let state = self.enter("current_url".to_string()).await?;
        Ok(state.url.clone())
    }

    async fn title(&self) -> ProbeResult<String> {
        let state = self.enter("title".to_string()).await?;
        Ok(state.title.clone())
    }

    async fn back(&self) -> ProbeResult<()> {
        let mut state = self.enter("back".to_string()).await?;
        if let Some(url) = state.history.pop() {
            state.load(&url);
        }
        self.bump_generation();
        Ok(())
    }

    async fn refresh(&self) -> ProbeResult<()> {
        let mut state = self.enter("refresh".to_string()).await?;
        let url = state.url.clone();
        state.load(&url);
        self.bump_generation();
        Ok(())
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    async fn find_elements(&self, selector: &Selector) -> ProbeResult<Vec<ElementHandle>> {
        let state = self.enter(format!("find:{selector}")).await?;
        let count = state.dom.matches(selector).len();
        Ok(self.handles(selector, count, None))
    }

    async fn find_children(
        &self,
        parent: &ElementHandle,
        selector: &Selector,
    ) -> ProbeResult<Vec<ElementHandle>> {
        self.check_fresh(parent)?;
        let state = self
            .enter(format!("find_children:{} >> {selector}", parent.describe()))
            .await?;
        let parent_path = state.dom.resolve(parent).ok_or_else(|| {
            ProbeError::driver(format!(
                "stale element reference: {} is no longer attached",
                parent.describe()
            ))
        })?;
        let count = state.dom.matches_within(&parent_path, selector).len();
        Ok(self.handles(selector, count, Some(parent)))
    }

    async fn is_displayed(&self, element: &ElementHandle) -> ProbeResult<bool> {
        self.check_fresh(element)?;
        let state = self
            .enter(format!("is_displayed:{}", element.describe()))
            .await?;
        Ok(state.resolve(element).map(|n| n.displayed).unwrap_or(false))
    }

    async fn is_enabled(&self, element: &ElementHandle) -> ProbeResult<bool> {
        self.check_fresh(element)?;
        let state = self
            .enter(format!("is_enabled:{}", element.describe()))
            .await?;
        Ok(state.resolve(element)?.enabled)
    }

    async fn text(&self, element: &ElementHandle) -> ProbeResult<String> {
        self.check_fresh(element)?;
        let state = self.enter(format!("text:{}", element.describe())).await?;
        let node = state.resolve(element)?;
        Ok(if node.displayed {
            node.text.clone()
        } else {
            String::new()
        })
    }

    async fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> ProbeResult<Option<String>> {
        self.check_fresh(element)?;
        let state = self
            .enter(format!("attribute:{}@{name}", element.describe()))
            .await?;
        let node = state.resolve(element)?;
        if name == "value" {
            return Ok(Some(node.value.clone()));
        }
        Ok(node.attributes.get(name).cloned())
    }

    async fn click(&self, element: &ElementHandle) -> ProbeResult<()> {
        self.check_fresh(element)?;
        let mut state = self.enter(format!("click:{}", element.describe())).await?;
        let node = state.resolve(element)?;
        if !node.displayed || !node.enabled {
            return Err(ProbeError::driver(format!(
                "element not interactable: {}",
                element.describe()
            )));
        }
        let mut mutations: Vec<(Duration, Mutation)> = Vec::new();
        let mut target = None;
        for reaction in state
            .reactions
            .iter()
            .filter(|r| r.trigger == element.selector || node.matches(&r.trigger))
        {
            match &reaction.effect {
                Effect::Mutate(mutation) => mutations.push((reaction.delay, Arc::clone(mutation))),
                Effect::Navigate(url) => target = Some(url.clone()),
            }
        }
        for (delay, mutation) in mutations {
            state.schedule(delay, mutation);
        }
        if let Some(url) = target {
            let previous = state.url.clone();
            state.history.push(previous);
            state.load(&url);
            self.bump_generation();
        }
        Ok(())
    }

    async fn clear_value(&self, element: &ElementHandle) -> ProbeResult<()> {
        self.check_fresh(element)?;
        let mut state = self.enter(format!("clear:{}", element.describe())).await?;
        state.resolve_mut(element)?.value.clear();
        Ok(())
    }

    async fn set_value(&self, element: &ElementHandle, text: &str) -> ProbeResult<()> {
        self.check_fresh(element)?;
        let mut state = self
            .enter(format!("set_value:{}={text}", element.describe()))
            .await?;
        let node = state.resolve_mut(element)?;
        if !node.enabled {
            return Err(ProbeError::driver(format!(
                "element not interactable: {}",
                element.describe()
            )));
        }
        node.value.push_str(text);
        Ok(())
    }

    async fn scroll_into_view(&self, element: &ElementHandle) -> ProbeResult<()> {
        self.check_fresh(element)?;
        let state = self.enter(format!("scroll:{}", element.describe())).await?;
        let _ = state.resolve(element)?;
        Ok(())
    }

    async fn execute(&self, script: &str) -> ProbeResult<serde_json::Value> {
        let state = self.enter(format!("execute:{script}")).await?;
        if let Some(value) = state.script_results.get(script) {
            return Ok(value.clone());
        }
        if script.contains("document.readyState") {
            return Ok(serde_json::Value::String("complete".to_string()));
        }
        Ok(serde_json::Value::Null)
    }

    async fn cookies(&self) -> ProbeResult<Vec<Cookie>> {
        let state = self.enter("cookies".to_string()).await?;
        Ok(state.cookies.clone())
    }

    async fn set_cookie(&self, cookie: Cookie) -> ProbeResult<()> {
        let mut state = self.enter(format!("set_cookie:{}", cookie.name)).await?;
        state.cookies.retain(|c| c.name != cookie.name);
        state.cookies.push(cookie);
        Ok(())
    }

    async fn delete_cookies(&self) -> ProbeResult<()> {
        let mut state = self.enter("delete_cookies".to_string()).await?;
        state.cookies.clear();
        Ok(())
    }

    async fn window_handles(&self) -> ProbeResult<Vec<WindowHandle>> {
        let state = self.enter("window_handles".to_string()).await?;
        Ok(state.windows.clone())
    }

    async fn current_window(&self) -> ProbeResult<WindowHandle> {
        let state = self.enter("current_window".to_string()).await?;
        state
            .windows
            .get(state.current_window)
            .cloned()
            .ok_or_else(|| ProbeError::driver("no current window"))
    }

    async fn switch_to_window(&self, handle: &WindowHandle) -> ProbeResult<()> {
        let mut state = self.enter(format!("switch_to_window:{handle}")).await?;
        let idx = state
            .windows
            .iter()
            .position(|w| w == handle)
            .ok_or_else(|| ProbeError::driver(format!("no such window: {handle}")))?;
        state.current_window = idx;
        self.bump_generation();
        Ok(())
    }

    async fn screenshot(&self) -> ProbeResult<Screenshot> {
        let state = self.enter("screenshot".to_string()).await?;
        Ok(Screenshot::new(state.screenshot.clone()))
    }

    async fn close(&self) -> ProbeResult<()> {
        let mut state = self.enter("close".to_string()).await?;
        state.connected = false;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const URL: &str = "https://cars.test/model/1";

    fn comment_table() -> MockElement {
        MockElement::new("table.table").child(
            MockElement::new("tbody").child(
                MockElement::new("tr")
                    .child(MockElement::new("td").text("01 Jan 2026"))
                    .child(MockElement::new("td").text("ana")),
            ),
        )
    }

    fn driver() -> MockDriver {
        MockDriver::new().with_page(
            URL,
            "Buggy Cars Rating",
            vec![
                MockElement::new("h4").text("Votes: 12"),
                MockElement::new("button.vote").text("Vote!"),
                MockElement::new("p.card-text").text("Thank you").hidden(),
                comment_table(),
            ],
        )
    }

    mod dom_tests {
        use super::*;

        #[test]
        fn test_matches_at_any_depth_in_document_order() {
            let dom = MockDom::new(vec![
                MockElement::new("td").text("a"),
                MockElement::new("tr").child(MockElement::new("td").text("b")),
            ]);
            assert_eq!(dom.matches(&Selector::css("td")), vec![vec![0], vec![1, 0]]);
        }

        #[test]
        fn test_css_with_text_matches_css_key() {
            let dom = MockDom::new(vec![
                MockElement::new("p").text("Hello"),
                MockElement::new("p").text("You need to be logged in to vote."),
            ]);
            let sel = Selector::css_with_text("p", "logged in");
            assert_eq!(dom.matches(&sel), vec![vec![1]]);
        }

        #[test]
        fn test_descendant_matching() {
            let dom = MockDom::new(vec![comment_table(), MockElement::new("td").text("outside")]);
            let sel = Selector::css("table.table").descendant(Selector::css("td"));
            assert_eq!(dom.matches(&sel).len(), 2);
        }

        #[test]
        fn test_mutations() {
            let mut dom = MockDom::new(vec![MockElement::new("span").text("old").hidden()]);
            let span = Selector::css("span");
            dom.show(&span);
            dom.set_text(&span, "new");
            assert_eq!(dom.text_of(&span).as_deref(), Some("new"));
            dom.remove(&span);
            assert!(dom.text_of(&span).is_none());
        }
    }

    mod driver_tests {
        use super::*;

        #[tokio::test]
        async fn test_navigate_loads_registered_page() {
            let driver = driver();
            driver.navigate(URL).await.unwrap();
            assert_eq!(driver.current_url().await.unwrap(), URL);
            assert_eq!(driver.title().await.unwrap(), "Buggy Cars Rating");
            assert_eq!(driver.generation(), 1);
            assert!(driver.was_called("navigate").await);
        }

        #[tokio::test]
        async fn test_find_children_scopes_to_parent() {
            let driver = driver();
            driver.navigate(URL).await.unwrap();
            let tables = driver
                .find_elements(&Selector::css("table.table"))
                .await
                .unwrap();
            let cells = driver
                .find_children(&tables[0], &Selector::css("td"))
                .await
                .unwrap();
            assert_eq!(cells.len(), 2);
            assert_eq!(driver.text(&cells[1]).await.unwrap(), "ana");
        }

        #[tokio::test]
        async fn test_hidden_element_has_no_text() {
            let driver = driver();
            driver.navigate(URL).await.unwrap();
            let p = driver
                .find_elements(&Selector::css("p.card-text"))
                .await
                .unwrap();
            assert!(!driver.is_displayed(&p[0]).await.unwrap());
            assert_eq!(driver.text(&p[0]).await.unwrap(), "");
        }

        #[tokio::test]
        async fn test_handles_go_stale_after_navigation() {
            let driver = driver();
            driver.navigate(URL).await.unwrap();
            let h4 = driver.find_elements(&Selector::css("h4")).await.unwrap();
            driver.refresh().await.unwrap();
            let err = driver.text(&h4[0]).await.unwrap_err();
            assert!(err.to_string().contains("stale"));
        }

        #[tokio::test]
        async fn test_set_value_appends_and_clear_empties() {
            let driver = MockDriver::new().with_page(URL, "", vec![MockElement::new("input")]);
            driver.navigate(URL).await.unwrap();
            let input = driver.find_elements(&Selector::css("input")).await.unwrap();
            driver.set_value(&input[0], "ab").await.unwrap();
            driver.set_value(&input[0], "c").await.unwrap();
            assert_eq!(
                driver.attribute(&input[0], "value").await.unwrap().as_deref(),
                Some("abc")
            );
            driver.clear_value(&input[0]).await.unwrap();
            assert_eq!(
                driver.attribute(&input[0], "value").await.unwrap().as_deref(),
                Some("")
            );
        }

        #[tokio::test(start_paused = true)]
        async fn test_click_reaction_lands_after_delay() {
            let driver = driver().on_click(
                Selector::css("button.vote"),
                Duration::from_millis(500),
                |dom| dom.show(&Selector::css("p.card-text")),
            );
            driver.navigate(URL).await.unwrap();
            let button = driver
                .find_elements(&Selector::css("button.vote"))
                .await
                .unwrap();
            driver.click(&button[0]).await.unwrap();

            let p = driver
                .find_elements(&Selector::css("p.card-text"))
                .await
                .unwrap();
            assert!(!driver.is_displayed(&p[0]).await.unwrap());

            tokio::time::sleep(Duration::from_millis(500)).await;
            assert!(driver.is_displayed(&p[0]).await.unwrap());
        }

        #[tokio::test]
        async fn test_load_hook_runs_on_every_page() {
            let driver = driver()
                .with_page("https://cars.test/", "Home", vec![MockElement::new("h4").text("home")])
                .on_load(|dom| dom.set_text(&Selector::css("h4"), "rendered"));
            driver.navigate(URL).await.unwrap();
            assert_eq!(
                driver.dom().await.text_of(&Selector::css("h4")).as_deref(),
                Some("rendered")
            );
            driver.navigate("https://cars.test/").await.unwrap();
            driver.refresh().await.unwrap();
            assert_eq!(
                driver.dom().await.text_of(&Selector::css("h4")).as_deref(),
                Some("rendered")
            );
        }

        #[tokio::test]
        async fn test_link_click_navigates() {
            let driver = driver()
                .with_page("https://cars.test/", "Home", vec![MockElement::new("a.home")])
                .with_link(Selector::css("a.home"), URL);
            driver.navigate("https://cars.test/").await.unwrap();
            let link = driver.find_elements(&Selector::css("a.home")).await.unwrap();
            driver.click(&link[0]).await.unwrap();

            assert_eq!(driver.current_url().await.unwrap(), URL);
            assert_eq!(driver.generation(), 2);
            assert!(driver.is_displayed(&link[0]).await.is_err());
        }

        #[tokio::test]
        async fn test_click_on_hidden_element_fails() {
            let driver = driver();
            driver.navigate(URL).await.unwrap();
            let p = driver
                .find_elements(&Selector::css("p.card-text"))
                .await
                .unwrap();
            assert!(driver.click(&p[0]).await.is_err());
        }

        #[tokio::test]
        async fn test_disconnect_fails_every_call() {
            let driver = driver();
            driver.disconnect().await;
            let err = driver.navigate(URL).await.unwrap_err();
            assert_eq!(err.kind(), crate::result::ErrorKind::Driver);
        }

        #[tokio::test]
        async fn test_cookies_and_windows() {
            let driver = MockDriver::new();
            driver.set_cookie(Cookie::new("token", "1")).await.unwrap();
            driver.set_cookie(Cookie::new("token", "2")).await.unwrap();
            let cookies = driver.cookies().await.unwrap();
            assert_eq!(cookies.len(), 1);
            assert_eq!(cookies[0].value, "2");
            driver.delete_cookies().await.unwrap();
            assert!(driver.cookies().await.unwrap().is_empty());

            let second = driver.open_window().await;
            assert_eq!(driver.window_handles().await.unwrap().len(), 2);
            driver.switch_to_window(&second).await.unwrap();
            assert_eq!(driver.current_window().await.unwrap(), second);
            assert!(driver
                .switch_to_window(&WindowHandle("nope".to_string()))
                .await
                .is_err());
        }

        #[tokio::test]
        async fn test_execute_ready_state_and_screenshot() {
            let driver = MockDriver::new()
                .with_script_result("return 1", serde_json::json!(1));
            assert_eq!(
                driver.execute("document.readyState").await.unwrap(),
                serde_json::json!("complete")
            );
            assert_eq!(driver.execute("return 1").await.unwrap(), serde_json::json!(1));
            assert!(driver.screenshot().await.unwrap().is_valid());
        }
    }
}
