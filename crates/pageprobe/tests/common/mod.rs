//! In-memory rendition of the Buggy Cars Rating site on top of MockDriver.
//!
//! Server-side state (session, votes, comments) lives in [`SiteState`] and
//! is rendered into every freshly loaded page and after every reaction.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use pageprobe::prelude::*;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const BASE: &str = "https://buggy.test";
pub const LOGIN_DELAY: Duration = Duration::from_millis(400);
pub const LOGOUT_DELAY: Duration = Duration::from_millis(100);
pub const VOTE_DELAY: Duration = Duration::from_millis(300);

pub fn home_url() -> String {
    format!("{BASE}/")
}

pub fn model_url() -> String {
    format!("{BASE}{}", TestData::default().popular_model.path())
}

#[derive(Debug, Clone)]
pub struct SiteState {
    pub logged_in: bool,
    pub voted: bool,
    pub votes: u64,
    pub comments: Vec<CommentRecord>,
}

impl Default for SiteState {
    fn default() -> Self {
        Self {
            logged_in: false,
            voted: false,
            votes: 42,
            comments: vec![CommentRecord {
                date: "01/10/2026".into(),
                author: "ana".into(),
                text: "Loud but fun".into(),
            }],
        }
    }
}

pub struct FakeSite {
    pub driver: Arc<MockDriver>,
    pub state: Arc<Mutex<SiteState>>,
}

fn navbar(sel: &LoginSelectors) -> Vec<MockElement> {
    vec![
        MockElement::keyed(sel.logo.clone()).text("Buggy Rating"),
        MockElement::keyed(sel.form.clone()),
        MockElement::keyed(sel.login_field.clone()),
        MockElement::keyed(sel.password_field.clone()),
        MockElement::keyed(sel.submit_button.clone()).text("Login"),
        MockElement::keyed(sel.register_link.clone()).text("Register"),
        MockElement::keyed(sel.greeting.clone()).text("Hi, test").hidden(),
        MockElement::keyed(sel.profile_link.clone()).text("Profile").hidden(),
        MockElement::keyed(sel.logout_link.clone()).text("Logout").hidden(),
        MockElement::keyed(sel.error_message.clone())
            .text("Invalid username/password")
            .hidden(),
    ]
}

fn card(heading: &str, link: &Selector, label: &str, votes: &str) -> MockElement {
    MockElement::new("div.card")
        .child(MockElement::new("h2").text(heading))
        .child(MockElement::keyed(link.clone()).text(label))
        .child(MockElement::new("small").text(votes))
}

fn home_page(sel: &Selectors) -> Vec<MockElement> {
    let mut elements = navbar(&sel.login);
    elements.push(card("Popular Make", &sel.home.popular_make_link, "Lamborghini", "(4211 votes)"));
    elements.push(card("Popular Model", &sel.home.popular_model_link, "Diablo", "(42 votes)"));
    elements.push(
        MockElement::new("div.card")
            .child(MockElement::new("h2").text("Overall Rating"))
            .child(MockElement::keyed(sel.home.overall_link.clone()).text("List of all registered models")),
    );
    elements
}

fn model_page(sel: &Selectors) -> Vec<MockElement> {
    let m = &sel.model;
    let mut elements = navbar(&sel.login);
    elements.extend([
        MockElement::keyed(m.title.clone()).text("Diablo"),
        MockElement::keyed(m.image.clone()),
        MockElement::keyed(m.description.clone()).text("A mid-engine sports car."),
        MockElement::new("h4").text("Specification"),
        MockElement::new("h4").text("Votes: 0"),
        MockElement::new("button").text("Vote!").hidden(),
        MockElement::new("p.card-text").text("Thank you for your vote!").hidden(),
        MockElement::new("p.card-text").text("You need to be logged in to vote."),
        MockElement::keyed(m.comment_field.clone()).hidden(),
        MockElement::keyed(m.comment_table.clone())
            .child(MockElement::new("th").text("Date"))
            .child(MockElement::new("th").text("Author"))
            .child(MockElement::new("th").text("Comment")),
    ]);
    elements
}

fn set_shown(dom: &mut MockDom, selector: &Selector, shown: bool) {
    if shown {
        dom.show(selector);
    } else {
        dom.hide(selector);
    }
}

/// Bring the page markup in line with the server state
pub fn render(dom: &mut MockDom, sel: &Selectors, state: &SiteState) {
    let l = &sel.login;
    for anonymous in [&l.form, &l.login_field, &l.password_field, &l.submit_button, &l.register_link] {
        set_shown(dom, anonymous, !state.logged_in);
    }
    for member in [&l.greeting, &l.profile_link, &l.logout_link] {
        set_shown(dom, member, state.logged_in);
    }
    if state.logged_in {
        dom.hide(&l.error_message);
    }

    let m = &sel.model;
    if dom.text_of(&m.votes).is_none() {
        return;
    }
    dom.set_text(&m.votes, &format!("Votes: {}", state.votes));
    let can_vote = state.logged_in && !state.voted;
    set_shown(dom, &m.vote_button, can_vote);
    set_shown(dom, &m.comment_field, can_vote);
    set_shown(dom, &m.thank_you, state.logged_in && state.voted);
    set_shown(dom, &m.login_required, !state.logged_in);

    dom.remove(&m.comment_row);
    for c in &state.comments {
        dom.append_child(
            &m.comment_table,
            MockElement::keyed(m.comment_row.clone())
                .child(MockElement::keyed(m.comment_cell.clone()).text(&c.date))
                .child(MockElement::keyed(m.comment_cell.clone()).text(&c.author))
                .child(MockElement::keyed(m.comment_cell.clone()).text(&c.text)),
        );
    }
}

impl Default for FakeSite {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeSite {
    pub fn new() -> Self {
        let sel = Selectors::default();
        let data = TestData::default();
        let state = Arc::new(Mutex::new(SiteState::default()));

        let login = {
            let (sel, state, valid) = (sel.clone(), Arc::clone(&state), data.valid.clone());
            move |dom: &mut MockDom| {
                let mut st = state.lock().unwrap();
                let email = dom.value_of(&sel.login.login_field).unwrap_or_default();
                let password = dom.value_of(&sel.login.password_field).unwrap_or_default();
                if email == valid.email && password == valid.password {
                    st.logged_in = true;
                } else {
                    dom.show(&sel.login.error_message);
                }
                render(dom, &sel, &st);
            }
        };
        let logout = {
            let (sel, state) = (sel.clone(), Arc::clone(&state));
            move |dom: &mut MockDom| {
                let mut st = state.lock().unwrap();
                st.logged_in = false;
                render(dom, &sel, &st);
            }
        };
        let vote = {
            let (sel, state) = (sel.clone(), Arc::clone(&state));
            move |dom: &mut MockDom| {
                let mut st = state.lock().unwrap();
                if st.logged_in && !st.voted {
                    let comment = dom.value_of(&sel.model.comment_field).unwrap_or_default();
                    if !comment.trim().is_empty() {
                        st.comments.push(CommentRecord {
                            date: "19/10/2026".into(),
                            author: "test".into(),
                            text: comment.trim().to_string(),
                        });
                    }
                    st.voted = true;
                    st.votes += 1;
                }
                render(dom, &sel, &st);
            }
        };
        let on_load = {
            let (sel, state) = (sel.clone(), Arc::clone(&state));
            move |dom: &mut MockDom| render(dom, &sel, &state.lock().unwrap())
        };

        let driver = MockDriver::new()
            .with_page(home_url(), "Buggy Cars Rating", home_page(&sel))
            .with_page(model_url(), "Buggy Cars Rating", model_page(&sel))
            .with_link(sel.home.popular_model_link.clone(), model_url())
            .with_link(sel.login.logo.clone(), home_url())
            .on_click(sel.login.submit_button.clone(), LOGIN_DELAY, login)
            .on_click(sel.login.logout_link.clone(), LOGOUT_DELAY, logout)
            .on_click(sel.model.vote_button.clone(), VOTE_DELAY, vote)
            .on_load(on_load);

        Self {
            driver: Arc::new(driver),
            state,
        }
    }

    /// Page objects over this site's session
    pub fn site(&self, timeout_ms: u64) -> Site<MockDriver> {
        let ctx = PageContext::new(
            Arc::clone(&self.driver),
            WaitOptions::new().with_timeout(timeout_ms).with_poll_interval(100),
            BASE,
        );
        Site::new(&ctx, &Selectors::default())
    }

    pub fn context(&self, timeout_ms: u64) -> PageContext<MockDriver> {
        PageContext::new(
            Arc::clone(&self.driver),
            WaitOptions::new().with_timeout(timeout_ms).with_poll_interval(100),
            BASE,
        )
    }
}

/// One fresh fake site per session
#[derive(Debug, Default, Clone, Copy)]
pub struct FakeSiteFactory;

#[async_trait::async_trait]
impl SessionFactory for FakeSiteFactory {
    type Driver = MockDriver;

    async fn open(&self) -> ProbeResult<Arc<MockDriver>> {
        Ok(FakeSite::new().driver)
    }
}
