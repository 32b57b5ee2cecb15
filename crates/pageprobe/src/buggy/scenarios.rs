//! Built-in end-to-end scenarios for the Buggy Cars Rating site.

use super::login::LoginOutcome;
use super::model::{VoteOutcome, VoteState};
use crate::driver::PageDriver;
use crate::harness::{Scenario, ScenarioContext};
use crate::page_object::PageObject;
use crate::result::{ensure, ErrorKind, ProbeError, ProbeResult};
use crate::fixture::Credentials;
use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};

/// Every built-in scenario, grouped by suite
#[must_use]
pub fn builtin_scenarios<D: PageDriver + ?Sized>() -> Vec<Box<dyn Scenario<D>>> {
    vec![
        Box::new(LoginValidUser),
        Box::new(LoginRejectsInvalidCredentials),
        Box::new(AnonymousUserCannotVote),
        Box::new(AuthenticatedUserVotes),
        Box::new(EmptyCommentIsRefused),
        Box::new(CommentTableHasExpectedColumns),
        Box::new(PostedCommentIsListedAndPersists),
        Box::new(AnonymousUserReadsCommentsOnly),
        Box::new(HostileCredentialsAreRejected),
        Box::new(ModelPageShowsCarInformation),
        Box::new(UnknownModelHasNoVotePanel),
    ]
}

/// Login payloads carrying markup and SQL fragments
const HOSTILE_LOGINS: [(&str, &str); 4] = [
    (r#"test@test.com<script>alert("XSS")</script>"#, "test123"),
    (r#"test@test.com"><img src=x onerror=alert(1)>"#, "test123"),
    ("' OR '1'='1' --", "' OR '1'='1' --"),
    ("'; DROP TABLE users; --", "'; DROP TABLE users; --"),
];

/// Model id the site does not know
const UNKNOWN_MODEL_PATH: &str = "/model/99999";

async fn log_in<D: PageDriver + ?Sized>(ctx: &ScenarioContext<D>) -> ProbeResult<()> {
    match ctx.pages.login.login(&ctx.data.valid).await? {
        LoginOutcome::Authenticated { .. } => Ok(()),
        LoginOutcome::Rejected { message } => Err(ProbeError::precondition(format!(
            "valid account was rejected: {message}"
        ))),
    }
}

async fn open_popular_model<D: PageDriver + ?Sized>(ctx: &ScenarioContext<D>) -> ProbeResult<()> {
    let model = &ctx.data.popular_model;
    ctx.pages.model.open(&model.make_id, &model.model_id).await
}

/// Logging in with a known account shows the greeting
#[derive(Debug, Clone, Copy)]
pub struct LoginValidUser;

#[async_trait]
impl<D: PageDriver + ?Sized> Scenario<D> for LoginValidUser {
    fn name(&self) -> &'static str {
        "login_valid_user"
    }

    fn suite(&self) -> &'static str {
        "auth"
    }

    async fn run(&self, ctx: &ScenarioContext<D>) -> ProbeResult<()> {
        let login = &ctx.pages.login;
        let form = login.form_elements().await?;
        ensure(form.complete(), format!("login form incomplete: {form:?}"))?;

        let outcome = login.login(&ctx.data.valid).await?;
        let LoginOutcome::Authenticated { display_name } = outcome else {
            return Err(ProbeError::assertion(format!(
                "expected a greeting, got {outcome:?}"
            )));
        };
        if let Some(expected) = &ctx.data.valid.display_name {
            ensure(
                &display_name == expected,
                format!("greeted as {display_name:?}, expected {expected:?}"),
            )?;
        }
        ensure(
            login.wait_authenticated().await?.is_authenticated(),
            "session marker missing after login",
        )
    }
}

/// A wrong account is refused and the form stays
#[derive(Debug, Clone, Copy)]
pub struct LoginRejectsInvalidCredentials;

#[async_trait]
impl<D: PageDriver + ?Sized> Scenario<D> for LoginRejectsInvalidCredentials {
    fn name(&self) -> &'static str {
        "login_rejects_invalid_credentials"
    }

    fn suite(&self) -> &'static str {
        "auth"
    }

    async fn run(&self, ctx: &ScenarioContext<D>) -> ProbeResult<()> {
        let login = &ctx.pages.login;
        let outcome = login.login(&ctx.data.invalid).await?;
        ensure(
            !outcome.is_authenticated(),
            format!("invalid account was let in: {outcome:?}"),
        )?;
        ensure(!login.is_authenticated().await?, "session marker shown")?;
        ensure(login.form_visible().await?, "login form gone after rejection")
    }
}

/// Anonymous visitors are asked to log in instead of voting
#[derive(Debug, Clone, Copy)]
pub struct AnonymousUserCannotVote;

#[async_trait]
impl<D: PageDriver + ?Sized> Scenario<D> for AnonymousUserCannotVote {
    fn name(&self) -> &'static str {
        "anonymous_user_cannot_vote"
    }

    fn suite(&self) -> &'static str {
        "voting"
    }

    async fn run(&self, ctx: &ScenarioContext<D>) -> ProbeResult<()> {
        open_popular_model(ctx).await?;
        let model = &ctx.pages.model;
        let state = model.verify_vote_state().await?;
        ensure(
            state == VoteState::RequiresLogin,
            format!("anonymous vote state was {state}"),
        )?;
        match model.vote().await {
            Err(err) if err.kind() == ErrorKind::Precondition => Ok(()),
            Err(err) => Err(err),
            Ok(outcome) => Err(ProbeError::assertion(format!(
                "anonymous vote went through: {outcome:?}"
            ))),
        }
    }
}

/// A logged-in user's vote ends up on record
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUserVotes;

#[async_trait]
impl<D: PageDriver + ?Sized> Scenario<D> for AuthenticatedUserVotes {
    fn name(&self) -> &'static str {
        "authenticated_user_votes"
    }

    fn suite(&self) -> &'static str {
        "voting"
    }

    async fn run(&self, ctx: &ScenarioContext<D>) -> ProbeResult<()> {
        log_in(ctx).await?;
        open_popular_model(ctx).await?;
        let model = &ctx.pages.model;
        if let VoteOutcome::Cast { before, after } = model.ensure_voted().await? {
            ensure(after > before, format!("tally went from {before} to {after}"))?;
        }
        let state = model.verify_vote_state().await?;
        info!(%state, "vote state after voting");
        ensure(
            state == VoteState::AlreadyVoted,
            format!("vote state after voting was {state}"),
        )
    }
}

/// Blank comments are refused and nothing is posted
#[derive(Debug, Clone, Copy)]
pub struct EmptyCommentIsRefused;

#[async_trait]
impl<D: PageDriver + ?Sized> Scenario<D> for EmptyCommentIsRefused {
    fn name(&self) -> &'static str {
        "empty_comment_is_refused"
    }

    fn suite(&self) -> &'static str {
        "comments"
    }

    async fn run(&self, ctx: &ScenarioContext<D>) -> ProbeResult<()> {
        log_in(ctx).await?;
        open_popular_model(ctx).await?;
        let model = &ctx.pages.model;
        let before = model.comments().await?.len();
        match model.submit_comment("   ").await {
            Err(err) if err.kind() == ErrorKind::Precondition => {}
            Err(err) => return Err(err),
            Ok(record) => {
                return Err(ProbeError::assertion(format!(
                    "blank comment was posted: {record:?}"
                )))
            }
        }
        let after = model.comments().await?.len();
        ensure(
            after == before,
            format!("comment count changed from {before} to {after}"),
        )
    }
}

/// The comments table shows date, author and comment columns
#[derive(Debug, Clone, Copy)]
pub struct CommentTableHasExpectedColumns;

#[async_trait]
impl<D: PageDriver + ?Sized> Scenario<D> for CommentTableHasExpectedColumns {
    fn name(&self) -> &'static str {
        "comment_table_has_expected_columns"
    }

    fn suite(&self) -> &'static str {
        "comments"
    }

    async fn run(&self, ctx: &ScenarioContext<D>) -> ProbeResult<()> {
        open_popular_model(ctx).await?;
        let table = ctx.pages.model.comment_table().await?;
        ensure(table.headers_ok(), format!("comments table: {table:?}"))
    }
}

/// A posted comment is listed under the author's name and survives a reload
#[derive(Debug, Clone, Copy)]
pub struct PostedCommentIsListedAndPersists;

#[async_trait]
impl<D: PageDriver + ?Sized> Scenario<D> for PostedCommentIsListedAndPersists {
    fn name(&self) -> &'static str {
        "posted_comment_is_listed_and_persists"
    }

    fn suite(&self) -> &'static str {
        "comments"
    }

    async fn run(&self, ctx: &ScenarioContext<D>) -> ProbeResult<()> {
        log_in(ctx).await?;
        let author = ctx.pages.login.display_name().await?;
        open_popular_model(ctx).await?;
        let model = &ctx.pages.model;

        let text = format!("Great handling and sound {}", Utc::now().format("%H:%M:%S"));
        let record = model.submit_comment(&text).await?;
        ensure(
            record.author == author,
            format!("comment listed under {:?}, expected {author:?}", record.author),
        )?;

        ctx.driver().refresh().await?;
        let kept = model.find_comment(&text, Some(&author)).await?;
        ensure(kept.is_some(), "comment gone after reload")
    }
}

/// Anonymous visitors can read the comments table but get no comment field
#[derive(Debug, Clone, Copy)]
pub struct AnonymousUserReadsCommentsOnly;

#[async_trait]
impl<D: PageDriver + ?Sized> Scenario<D> for AnonymousUserReadsCommentsOnly {
    fn name(&self) -> &'static str {
        "anonymous_user_reads_comments_only"
    }

    fn suite(&self) -> &'static str {
        "comments"
    }

    async fn run(&self, ctx: &ScenarioContext<D>) -> ProbeResult<()> {
        open_popular_model(ctx).await?;
        let model = &ctx.pages.model;
        let table = model.comment_table().await?;
        ensure(table.headers_ok(), format!("comments table: {table:?}"))?;
        let comments = model.comments().await?;
        info!(count = comments.len(), "comments readable without a session");

        let state = model.verify_vote_state().await?;
        ensure(
            state == VoteState::RequiresLogin,
            format!("anonymous vote state was {state}"),
        )?;
        ensure(!model.can_comment().await?, "comment field offered without a session")
    }
}

/// Markup and SQL fragments in the login form never open a session
#[derive(Debug, Clone, Copy)]
pub struct HostileCredentialsAreRejected;

#[async_trait]
impl<D: PageDriver + ?Sized> Scenario<D> for HostileCredentialsAreRejected {
    fn name(&self) -> &'static str {
        "hostile_credentials_are_rejected"
    }

    fn suite(&self) -> &'static str {
        "security"
    }

    async fn run(&self, ctx: &ScenarioContext<D>) -> ProbeResult<()> {
        let login = &ctx.pages.login;
        for (email, password) in HOSTILE_LOGINS {
            ctx.pages.home.open().await?;
            match login.login(&Credentials::new(email, password)).await {
                Ok(LoginOutcome::Rejected { .. }) => {}
                Ok(outcome) => {
                    return Err(ProbeError::assertion(format!(
                        "login with {email:?} was let in: {outcome:?}"
                    )))
                }
                Err(err) if err.is_timeout() => {
                    warn!(email, "no verdict for hostile login");
                }
                Err(err) => return Err(err),
            }
            ensure(
                !login.is_authenticated().await?,
                format!("session marker shown after login with {email:?}"),
            )?;
        }
        Ok(())
    }
}

/// An unknown model id keeps its URL and renders no voting panel
#[derive(Debug, Clone, Copy)]
pub struct UnknownModelHasNoVotePanel;

#[async_trait]
impl<D: PageDriver + ?Sized> Scenario<D> for UnknownModelHasNoVotePanel {
    fn name(&self) -> &'static str {
        "unknown_model_has_no_vote_panel"
    }

    fn suite(&self) -> &'static str {
        "info"
    }

    async fn run(&self, ctx: &ScenarioContext<D>) -> ProbeResult<()> {
        ctx.driver().navigate(&ctx.url(UNKNOWN_MODEL_PATH)).await?;
        ctx.page().waiter.wait_for_page_load().await?;
        let url = ctx.driver().current_url().await?;
        ensure(
            url.contains(UNKNOWN_MODEL_PATH),
            format!("unknown model redirected to {url}"),
        )?;
        let panel = ctx.pages.model.vote_panel().await?;
        ensure(
            panel.is_none(),
            format!("unknown model shows a voting panel: {panel:?}"),
        )
    }
}

/// The popular model card leads to a complete detail page
#[derive(Debug, Clone, Copy)]
pub struct ModelPageShowsCarInformation;

#[async_trait]
impl<D: PageDriver + ?Sized> Scenario<D> for ModelPageShowsCarInformation {
    fn name(&self) -> &'static str {
        "model_page_shows_car_information"
    }

    fn suite(&self) -> &'static str {
        "info"
    }

    async fn run(&self, ctx: &ScenarioContext<D>) -> ProbeResult<()> {
        let home = &ctx.pages.home;
        home.ensure_ready().await?;
        let cards = home.cards().await?;
        ensure(!cards.is_empty(), "no cards on the landing page")?;

        let url = home.open_popular_model().await?;
        ensure(
            url.contains(&ctx.data.popular_model.model_id),
            format!("landed on {url}"),
        )?;
        let info = ctx.pages.model.car_info().await?;
        ensure(!info.title.is_empty(), "model title is empty")?;
        ensure(info.image_visible, "car image not displayed")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock_driver::MockDriver;
    use std::collections::HashSet;

    #[test]
    fn test_builtin_names_are_unique() {
        let scenarios = builtin_scenarios::<MockDriver>();
        assert_eq!(scenarios.len(), 11);
        let names: HashSet<_> = scenarios.iter().map(|s| s.name()).collect();
        assert_eq!(names.len(), scenarios.len());
    }

    #[test]
    fn test_suites() {
        let scenarios = builtin_scenarios::<MockDriver>();
        let suites: HashSet<_> = scenarios.iter().map(|s| s.suite()).collect();
        assert_eq!(
            suites,
            HashSet::from(["auth", "voting", "comments", "info", "security"])
        );
    }

    #[test]
    fn test_hostile_logins_carry_markup_and_sql() {
        assert!(HOSTILE_LOGINS.iter().any(|(email, _)| email.contains("<script>")));
        assert!(HOSTILE_LOGINS.iter().any(|(email, _)| email.contains("' OR '1'='1'")));
        assert!(HOSTILE_LOGINS
            .iter()
            .all(|(email, _)| *email != crate::fixture::TestData::default().valid.email));
    }
}
