//! Page objects for the Buggy Cars Rating application.
//!
//! Three screens are modelled: the navbar login form (present on every
//! page), the landing page and the model detail page. [`Site`] builds all
//! three over one session.

pub mod home;
pub mod login;
pub mod model;
pub mod scenarios;
pub mod selectors;

pub use home::{HomeCard, HomePage};
pub use login::{LoginFormCheck, LoginOutcome, LoginPage};
pub use model::{CarInfo, CommentTableCheck, ModelPage, VoteOutcome, VoteState};
pub use scenarios::builtin_scenarios;
pub use selectors::{HomeSelectors, LoginSelectors, ModelSelectors, Selectors};

use crate::driver::PageDriver;
use crate::page_object::PageContext;

/// The application's page objects over one session
#[derive(Debug)]
pub struct Site<D: PageDriver + ?Sized> {
    /// Navbar login form
    pub login: LoginPage<D>,
    /// Landing page
    pub home: HomePage<D>,
    /// Model detail page
    pub model: ModelPage<D>,
}

impl<D: PageDriver + ?Sized> Site<D> {
    /// Build every page object from one context
    #[must_use]
    pub fn new(ctx: &PageContext<D>, selectors: &Selectors) -> Self {
        Self {
            login: LoginPage::new(ctx.clone(), &selectors.login),
            home: HomePage::new(ctx.clone(), &selectors.home),
            model: ModelPage::new(ctx.clone(), &selectors.model),
        }
    }
}
