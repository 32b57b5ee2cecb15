//! Selector maps for the Buggy Cars Rating markup.
//!
//! Defaults match the live site. A JSON file can override any subset:
//!
//! ```json
//! { "login": { "submit_button": { "css": "button#login" } } }
//! ```

use crate::locator::{Locator, Selector};
use crate::result::ProbeResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Navbar login form and session markers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginSelectors {
    /// Login (email) input
    pub login_field: Selector,
    /// Password input
    pub password_field: Selector,
    /// Login submit button
    pub submit_button: Selector,
    /// "Register" link next to the form
    pub register_link: Selector,
    /// The inline login form
    pub form: Selector,
    /// "Hi, <name>" greeting shown once logged in
    pub greeting: Selector,
    /// Profile link shown once logged in
    pub profile_link: Selector,
    /// Logout link
    pub logout_link: Selector,
    /// Error shown after a rejected login
    pub error_message: Selector,
    /// Navbar brand linking home
    pub logo: Selector,
}

impl Default for LoginSelectors {
    fn default() -> Self {
        Self {
            login_field: Selector::css(r#"input[name="login"]"#),
            password_field: Selector::css(r#"input[name="password"]"#),
            submit_button: Selector::css(r#"button.btn.btn-success[type="submit"]"#),
            register_link: Selector::css(r#"a.btn.btn-success-outline[href="/register"]"#),
            form: Selector::css("form.form-inline"),
            greeting: Selector::css("span.nav-link.disabled"),
            profile_link: Selector::css(r#"a.nav-link[href="/profile"]"#),
            logout_link: Selector::css(r#"a.nav-link[href="javascript:void(0)"]"#),
            error_message: Selector::css(".alert-danger, .error-message, .invalid-feedback"),
            logo: Selector::css(r#"a.navbar-brand[href="/"]"#),
        }
    }
}

/// Landing page cards and links
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HomeSelectors {
    /// Navbar brand linking home
    pub logo: Selector,
    /// One of the landing cards
    pub card: Selector,
    /// Card heading, inside a card
    pub card_heading: Selector,
    /// Vote tally, inside a card
    pub card_votes: Selector,
    /// Link to the popular make
    pub popular_make_link: Selector,
    /// Link to the popular model
    pub popular_model_link: Selector,
    /// Link to the overall rating
    pub overall_link: Selector,
}

impl Default for HomeSelectors {
    fn default() -> Self {
        Self {
            logo: Selector::css(r#"a.navbar-brand[href="/"]"#),
            card: Selector::css("div.card"),
            card_heading: Selector::css("h2"),
            card_votes: Selector::css_with_text("small", "votes"),
            popular_make_link: Selector::css(r#"a[href="/make/ckl2phsabijs71623vk0"]"#),
            popular_model_link: Selector::css(
                r#"a[href="/model/ckl2phsabijs71623vk0|ckl2phsabijs71623vqg"]"#,
            ),
            overall_link: Selector::css(r#"a[href="/overall"]"#),
        }
    }
}

/// Model detail page: car information, voting and comments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSelectors {
    /// Model name heading
    pub title: Selector,
    /// Car picture
    pub image: Selector,
    /// Description block
    pub description: Selector,
    /// Specification heading
    pub specification: Selector,
    /// "Votes: N" label
    pub votes: Selector,
    /// Vote button, shown only to logged-in users who have not voted
    pub vote_button: Selector,
    /// Shown after the user has voted
    pub thank_you: Selector,
    /// Shown to anonymous users instead of the vote button
    pub login_required: Selector,
    /// Comment textarea
    pub comment_field: Selector,
    /// Button that submits the comment (the vote form's button)
    pub comment_submit: Selector,
    /// Comments table
    pub comment_table: Selector,
    /// Comment row, inside the table
    pub comment_row: Selector,
    /// Comment cell, inside a row
    pub comment_cell: Selector,
    /// "Date" column header
    pub date_header: Selector,
    /// "Author" column header
    pub author_header: Selector,
    /// "Comment" column header
    pub comment_header: Selector,
}

impl Default for ModelSelectors {
    fn default() -> Self {
        Self {
            title: Selector::css("h1, h2, .model-title"),
            image: Selector::css("img.img-thumbnail, .car-image img"),
            description: Selector::css(".description, .car-description"),
            specification: Selector::css_with_text("h4", "Specification"),
            votes: Selector::css_with_text("h4", "Votes"),
            vote_button: Selector::css_with_text("button", "Vote"),
            thank_you: Selector::css_with_text("p.card-text", "Thank you for your vote!"),
            login_required: Selector::css_with_text(
                "p.card-text",
                "You need to be logged in to vote.",
            ),
            comment_field: Selector::css(r#"textarea[name="comment"], .comment-input"#),
            comment_submit: Selector::css_with_text("button", "Vote"),
            comment_table: Selector::css("table.table"),
            comment_row: Selector::css("tbody tr"),
            comment_cell: Selector::css("td"),
            date_header: Selector::css_with_text("th", "Date"),
            author_header: Selector::css_with_text("th", "Author"),
            comment_header: Selector::css_with_text("th", "Comment"),
        }
    }
}

/// All selector maps
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    /// Login form and session markers
    pub login: LoginSelectors,
    /// Landing page
    pub home: HomeSelectors,
    /// Model detail page
    pub model: ModelSelectors,
}

impl Selectors {
    /// Load overrides from a JSON file; missing entries keep their defaults
    pub fn load(path: &Path) -> ProbeResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Named locator for a selector map entry
pub(crate) fn locate(selector: &Selector, name: &str) -> Locator {
    Locator::from_selector(selector.clone()).named(name)
}
