//! Navbar login form and session state.

use super::selectors::{locate, LoginSelectors};
use crate::driver::{ElementHandle, PageDriver};
use crate::extract::{parse_display_name, AuthState};
use crate::fixture::Credentials;
use crate::locator::Locator;
use crate::page_object::{PageContext, PageLifecycle, PageObject};
use crate::result::{ProbeError, ProbeResult};
use crate::wait::WaitCondition;
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

/// How the site answered a login attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum LoginOutcome {
    /// The greeting appeared
    Authenticated {
        /// Name parsed from the greeting
        display_name: String,
    },
    /// The error marker appeared
    Rejected {
        /// Rendered error text
        message: String,
    },
}

impl LoginOutcome {
    /// Whether the login succeeded
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }
}

/// Presence of the login form's elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoginFormCheck {
    /// Login input present
    pub login_field: bool,
    /// Password input present
    pub password_field: bool,
    /// Submit button present
    pub submit_button: bool,
    /// Register link present
    pub register_link: bool,
}

impl LoginFormCheck {
    /// Whether every element is present
    #[must_use]
    pub const fn complete(&self) -> bool {
        self.login_field && self.password_field && self.submit_button && self.register_link
    }
}

/// Login form in the navbar, present on every page
pub struct LoginPage<D: PageDriver + ?Sized> {
    ctx: PageContext<D>,
    lifecycle: PageLifecycle,
    login_field: Locator,
    password_field: Locator,
    submit_button: Locator,
    register_link: Locator,
    form: Locator,
    greeting: Locator,
    logout_link: Locator,
    error_message: Locator,
    logo: Locator,
}

impl<D: PageDriver + ?Sized> std::fmt::Debug for LoginPage<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginPage")
            .field("ctx", &self.ctx)
            .field("lifecycle", &self.lifecycle)
            .finish_non_exhaustive()
    }
}

impl<D: PageDriver + ?Sized> LoginPage<D> {
    /// Create the page object over a session
    #[must_use]
    pub fn new(ctx: PageContext<D>, sel: &LoginSelectors) -> Self {
        Self {
            ctx,
            lifecycle: PageLifecycle::default(),
            login_field: locate(&sel.login_field, "login field"),
            password_field: locate(&sel.password_field, "password field"),
            submit_button: locate(&sel.submit_button, "login button"),
            register_link: locate(&sel.register_link, "register link"),
            form: locate(&sel.form, "login form"),
            greeting: locate(&sel.greeting, "greeting"),
            logout_link: locate(&sel.logout_link, "logout link"),
            error_message: locate(&sel.error_message, "login error"),
            logo: locate(&sel.logo, "logo"),
        }
    }

    /// Log in and wait for the site's verdict.
    ///
    /// Whichever of the greeting and the error marker shows up first decides
    /// the outcome. If neither shows up the result is a timeout, not a
    /// rejection. An error marker still shown from an earlier attempt does
    /// not count until it has gone away.
    pub async fn login(&self, credentials: &Credentials) -> ProbeResult<LoginOutcome> {
        self.ensure_ready().await?;
        info!(user = %credentials.email, "logging in");

        let leftover_error = self.ctx.extractor.is_visible(&self.error_message).await?;
        let actions = &self.ctx.actions;
        actions.type_text(&self.login_field, &credentials.email).await?;
        actions
            .type_text(&self.password_field, &credentials.password)
            .await?;
        actions.click(&self.submit_button).await?;

        let (winner, handle) = if leftover_error {
            debug!("login error from a previous attempt still shown");
            self.verdict_after_leftover_error().await?
        } else {
            self.verdict().await?
        };
        let text = self.ctx.driver().text(&handle).await?;
        let outcome = if winner == 0 {
            LoginOutcome::Authenticated {
                display_name: parse_display_name(&text)?,
            }
        } else {
            LoginOutcome::Rejected {
                message: text.trim().to_string(),
            }
        };
        info!(user = %credentials.email, ?outcome, "login finished");
        Ok(outcome)
    }

    /// First of greeting (0) and error marker (1) to show
    async fn verdict(&self) -> ProbeResult<(usize, ElementHandle)> {
        let candidates = [
            (self.greeting.clone(), WaitCondition::Visible),
            (self.error_message.clone(), WaitCondition::Visible),
        ];
        self.ctx.waiter.wait_for_first(&candidates).await
    }

    /// Verdict when the error marker was already up before submitting.
    ///
    /// The greeting wins outright. Once the old marker hides, the normal race
    /// runs. A marker that stays up for the whole budget is the site
    /// repeating its rejection.
    async fn verdict_after_leftover_error(&self) -> ProbeResult<(usize, ElementHandle)> {
        let waiter = &self.ctx.waiter;
        let (greeting, error) = (&self.greeting, &self.error_message);
        let settled = waiter
            .wait_until("greeting or cleared login error", move || async move {
                if let Some(handle) = waiter.check(greeting, &WaitCondition::Visible).await? {
                    return Ok::<_, ProbeError>(Some(Some(handle)));
                }
                let still_shown = waiter.check(error, &WaitCondition::Visible).await?.is_some();
                Ok((!still_shown).then_some(None))
            })
            .await;
        match settled {
            Ok(Some(handle)) => Ok((0, handle)),
            Ok(None) => self.verdict().await,
            Err(err) if err.is_timeout() => {
                match waiter.check(error, &WaitCondition::Visible).await? {
                    Some(handle) => Ok((1, handle)),
                    None => Err(err),
                }
            }
            Err(err) => Err(err),
        }
    }

    /// Log out if logged in; waits until the login form is back
    pub async fn logout(&self) -> ProbeResult<()> {
        if !self.is_authenticated().await? {
            debug!("logout skipped, no session");
            return Ok(());
        }
        info!("logging out");
        self.ctx.actions.click(&self.logout_link).await?;
        let _ = self.ctx.waiter.wait_for(&self.form, WaitCondition::Visible).await?;
        Ok(())
    }

    /// Immediate check of the logged-in marker; racy right after [`LoginPage::login`]
    pub async fn is_authenticated(&self) -> ProbeResult<bool> {
        Ok(self
            .ctx
            .extractor
            .auth_state(&self.greeting)
            .await?
            .is_authenticated())
    }

    /// Wait until the logged-in marker shows
    pub async fn wait_authenticated(&self) -> ProbeResult<AuthState> {
        self.ctx.extractor.wait_authenticated(&self.greeting).await
    }

    /// Name from the greeting, waiting for it to show
    pub async fn display_name(&self) -> ProbeResult<String> {
        let greeting = self.ctx.extractor.text(&self.greeting).await?;
        parse_display_name(&greeting)
    }

    /// Whether the login form is displayed right now
    pub async fn form_visible(&self) -> ProbeResult<bool> {
        self.ctx.extractor.is_visible(&self.form).await
    }

    /// Which form elements are present right now
    pub async fn form_elements(&self) -> ProbeResult<LoginFormCheck> {
        let ex = &self.ctx.extractor;
        Ok(LoginFormCheck {
            login_field: ex.exists(&self.login_field).await?,
            password_field: ex.exists(&self.password_field).await?,
            submit_button: ex.exists(&self.submit_button).await?,
            register_link: ex.exists(&self.register_link).await?,
        })
    }

    /// Error text shown after a rejected login, if any
    pub async fn error_message(&self) -> ProbeResult<Option<String>> {
        if self.ctx.extractor.is_visible(&self.error_message).await? {
            Ok(Some(self.ctx.extractor.text(&self.error_message).await?))
        } else {
            Ok(None)
        }
    }

    /// Empty both inputs when they are shown
    pub async fn clear_form(&self) -> ProbeResult<()> {
        for field in [&self.login_field, &self.password_field] {
            if self.ctx.extractor.is_visible(field).await? {
                self.ctx.actions.clear(field).await?;
            }
        }
        Ok(())
    }

    /// Follow the navbar brand back to the landing page
    pub async fn go_home(&self) -> ProbeResult<()> {
        self.ctx.actions.click(&self.logo).await?;
        self.ctx.waiter.wait_for_page_load().await
    }
}

#[async_trait]
impl<D: PageDriver + ?Sized> PageObject<D> for LoginPage<D> {
    fn page_name(&self) -> &'static str {
        "login"
    }

    fn url_pattern(&self) -> &str {
        "/"
    }

    fn context(&self) -> &PageContext<D> {
        &self.ctx
    }

    fn lifecycle(&self) -> &PageLifecycle {
        &self.lifecycle
    }

    async fn wait_ready(&self) -> ProbeResult<()> {
        self.ctx.waiter.wait_for_page_load().await?;
        let candidates = [
            (self.form.clone(), WaitCondition::Visible),
            (self.greeting.clone(), WaitCondition::Visible),
        ];
        let _ = self.ctx.waiter.wait_for_first(&candidates).await?;
        Ok(())
    }
}
