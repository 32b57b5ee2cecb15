//! Model detail page: car information, voting and comments.
//!
//! Voting is guarded: [`ModelPage::vote`] classifies the page first and
//! refuses to click unless the user can vote. Comment submission refuses
//! blank text before touching the form.

use super::selectors::{locate, ModelSelectors};
use crate::driver::PageDriver;
use crate::extract::CommentRecord;
use crate::locator::{Locator, Selector};
use crate::page_object::{PageContext, PageLifecycle, PageObject};
use crate::result::{ProbeError, ProbeResult};
use crate::wait::WaitCondition;
use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

/// What the voting panel offers the current user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteState {
    /// Vote button shown
    CanVote,
    /// Thank-you message shown
    AlreadyVoted,
    /// Login-required message shown
    RequiresLogin,
}

impl std::fmt::Display for VoteState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::CanVote => "can vote",
            Self::AlreadyVoted => "already voted",
            Self::RequiresLogin => "requires login",
        };
        f.write_str(name)
    }
}

/// Result of asking for a vote to be on record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum VoteOutcome {
    /// A new vote was cast and the tally moved
    Cast {
        /// Tally before clicking
        before: u64,
        /// Tally after the vote registered
        after: u64,
    },
    /// The user had voted before; nothing was clicked
    AlreadyVoted,
}

/// Car information block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CarInfo {
    /// Model name
    pub title: String,
    /// Description, when the page has one
    pub description: Option<String>,
    /// Specification heading text, when present
    pub specification: Option<String>,
    /// Current vote tally
    pub votes: u64,
    /// Whether the car picture is displayed
    pub image_visible: bool,
}

/// Structure of the comments table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommentTableCheck {
    /// Table displayed
    pub table_present: bool,
    /// "Date" header displayed
    pub date_column: bool,
    /// "Author" header displayed
    pub author_column: bool,
    /// "Comment" header displayed
    pub comment_column: bool,
}

impl CommentTableCheck {
    /// Whether the table and all three headers are displayed
    #[must_use]
    pub const fn headers_ok(&self) -> bool {
        self.table_present && self.date_column && self.author_column && self.comment_column
    }
}

/// Model detail page
pub struct ModelPage<D: PageDriver + ?Sized> {
    ctx: PageContext<D>,
    lifecycle: PageLifecycle,
    title: Locator,
    image: Locator,
    description: Locator,
    specification: Locator,
    votes: Locator,
    vote_button: Locator,
    thank_you: Locator,
    login_required: Locator,
    comment_field: Locator,
    comment_submit: Locator,
    comment_table: Locator,
    comment_row: Selector,
    comment_cell: Selector,
    date_header: Locator,
    author_header: Locator,
    comment_header: Locator,
}

impl<D: PageDriver + ?Sized> std::fmt::Debug for ModelPage<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelPage")
            .field("ctx", &self.ctx)
            .field("lifecycle", &self.lifecycle)
            .finish_non_exhaustive()
    }
}

impl<D: PageDriver + ?Sized> ModelPage<D> {
    /// Create the page object over a session
    #[must_use]
    pub fn new(ctx: PageContext<D>, sel: &ModelSelectors) -> Self {
        Self {
            ctx,
            lifecycle: PageLifecycle::default(),
            title: locate(&sel.title, "model title"),
            image: locate(&sel.image, "car image"),
            description: locate(&sel.description, "description"),
            specification: locate(&sel.specification, "specification"),
            votes: locate(&sel.votes, "vote count"),
            vote_button: locate(&sel.vote_button, "vote button"),
            thank_you: locate(&sel.thank_you, "thank-you message"),
            login_required: locate(&sel.login_required, "login-required message"),
            comment_field: locate(&sel.comment_field, "comment field"),
            comment_submit: locate(&sel.comment_submit, "comment submit"),
            comment_table: locate(&sel.comment_table, "comments table"),
            comment_row: sel.comment_row.clone(),
            comment_cell: sel.comment_cell.clone(),
            date_header: locate(&sel.date_header, "date header"),
            author_header: locate(&sel.author_header, "author header"),
            comment_header: locate(&sel.comment_header, "comment header"),
        }
    }

    /// Navigate to `/model/<make>|<model>` and wait for the page
    pub async fn open(&self, make_id: &str, model_id: &str) -> ProbeResult<()> {
        let url = self.ctx.url(&format!("/model/{make_id}|{model_id}"));
        info!(%url, "opening model page");
        self.ctx.driver().navigate(&url).await?;
        self.ensure_ready().await
    }

    /// Read the car information block
    pub async fn car_info(&self) -> ProbeResult<CarInfo> {
        self.ensure_ready().await?;
        let ex = &self.ctx.extractor;
        let description = if ex.is_visible(&self.description).await? {
            Some(ex.text(&self.description).await?)
        } else {
            None
        };
        let specification = if ex.is_visible(&self.specification).await? {
            Some(ex.text(&self.specification).await?)
        } else {
            None
        };
        Ok(CarInfo {
            title: ex.text(&self.title).await?.trim().to_string(),
            description,
            specification,
            votes: self.vote_count().await?,
            image_visible: ex.is_visible(&self.image).await?,
        })
    }

    /// Current vote tally
    pub async fn vote_count(&self) -> ProbeResult<u64> {
        self.ensure_ready().await?;
        self.ctx.extractor.vote_count(&self.votes).await
    }

    /// Classify the voting panel.
    ///
    /// Polls until exactly one of the three markers is shown, probing the
    /// vote button first.
    pub async fn verify_vote_state(&self) -> ProbeResult<VoteState> {
        self.ensure_ready().await?;
        let this = self;
        let state = self
            .ctx
            .waiter
            .wait_until("vote state", move || async move { this.probe_vote_state().await })
            .await?;
        info!(%state, "vote state");
        Ok(state)
    }

    /// Immediate look at the voting panel; `None` when no marker is shown
    pub async fn vote_panel(&self) -> ProbeResult<Option<VoteState>> {
        self.probe_vote_state().await
    }

    async fn probe_vote_state(&self) -> ProbeResult<Option<VoteState>> {
        let ex = &self.ctx.extractor;
        let probes = [
            (&self.vote_button, VoteState::CanVote),
            (&self.thank_you, VoteState::AlreadyVoted),
            (&self.login_required, VoteState::RequiresLogin),
        ];
        for (locator, state) in probes {
            if ex.is_visible(locator).await? {
                return Ok(Some(state));
            }
        }
        Ok(None)
    }

    /// Cast a vote; only valid in [`VoteState::CanVote`].
    ///
    /// Waits for the thank-you message and for the tally to move past its
    /// previous value. Always returns [`VoteOutcome::Cast`].
    pub async fn vote(&self) -> ProbeResult<VoteOutcome> {
        let state = self.verify_vote_state().await?;
        if state != VoteState::CanVote {
            return Err(ProbeError::precondition(format!(
                "cannot vote: page says {state}"
            )));
        }
        let before = self.vote_count().await?;
        self.ctx.actions.click(&self.vote_button).await?;
        let _ = self
            .ctx
            .waiter
            .wait_for(&self.thank_you, WaitCondition::Visible)
            .await?;

        let extractor = &self.ctx.extractor;
        let votes = &self.votes;
        let after = self
            .ctx
            .waiter
            .wait_until(&format!("vote count above {before}"), move || async move {
                let now = extractor.vote_count(votes).await?;
                Ok::<_, ProbeError>((now > before).then_some(now))
            })
            .await?;
        info!(before, after, "vote cast");
        Ok(VoteOutcome::Cast { before, after })
    }

    /// Make sure the user's vote is on record.
    ///
    /// An earlier vote counts as success, but it is logged at `warn` because
    /// it cannot tell a working vote button from a broken one.
    pub async fn ensure_voted(&self) -> ProbeResult<VoteOutcome> {
        match self.verify_vote_state().await? {
            VoteState::CanVote => self.vote().await,
            VoteState::AlreadyVoted => {
                warn!("vote already on record; casting a new vote was not exercised");
                Ok(VoteOutcome::AlreadyVoted)
            }
            VoteState::RequiresLogin => Err(ProbeError::precondition(
                "cannot vote: page says requires login",
            )),
        }
    }

    /// Whether the comment field and its submit button are displayed
    pub async fn can_comment(&self) -> ProbeResult<bool> {
        let ex = &self.ctx.extractor;
        Ok(ex.is_visible(&self.comment_field).await? && ex.is_visible(&self.comment_submit).await?)
    }

    /// Submit a comment and wait until it is listed.
    ///
    /// Blank text is refused before anything is typed or clicked, and so is a
    /// page that does not offer the comment form ([`VoteState::CanVote`]).
    pub async fn submit_comment(&self, text: &str) -> ProbeResult<CommentRecord> {
        let wanted = text.trim();
        if wanted.is_empty() {
            return Err(ProbeError::precondition("comment text is empty"));
        }
        let state = self.verify_vote_state().await?;
        if state != VoteState::CanVote {
            return Err(ProbeError::precondition(format!(
                "cannot comment: page says {state}"
            )));
        }
        info!(chars = wanted.chars().count(), "submitting comment");
        self.ctx.actions.type_text(&self.comment_field, text).await?;
        self.ctx.actions.click(&self.comment_submit).await?;

        let this = self;
        self.ctx
            .waiter
            .wait_until("submitted comment", move || async move {
                this.find_comment(wanted, None).await
            })
            .await
    }

    /// Comment rows in document order; malformed rows are skipped
    pub async fn comments(&self) -> ProbeResult<Vec<CommentRecord>> {
        self.ensure_ready().await?;
        self.ctx
            .extractor
            .comment_records(&self.comment_table, &self.comment_row, &self.comment_cell)
            .await
    }

    /// First comment whose text contains `text`, optionally by `author`
    pub async fn find_comment(
        &self,
        text: &str,
        author: Option<&str>,
    ) -> ProbeResult<Option<CommentRecord>> {
        Ok(self
            .comments()
            .await?
            .into_iter()
            .find(|c| c.text.contains(text) && author.map_or(true, |a| c.author == a)))
    }

    /// Check the comments table and its headers
    pub async fn comment_table(&self) -> ProbeResult<CommentTableCheck> {
        self.ensure_ready().await?;
        let ex = &self.ctx.extractor;
        let table_present = ex.is_visible(&self.comment_table).await?;
        if !table_present {
            return Ok(CommentTableCheck {
                table_present,
                date_column: false,
                author_column: false,
                comment_column: false,
            });
        }
        Ok(CommentTableCheck {
            table_present,
            date_column: ex.is_visible(&self.date_header).await?,
            author_column: ex.is_visible(&self.author_header).await?,
            comment_column: ex.is_visible(&self.comment_header).await?,
        })
    }
}

#[async_trait]
impl<D: PageDriver + ?Sized> PageObject<D> for ModelPage<D> {
    fn page_name(&self) -> &'static str {
        "model"
    }

    fn url_pattern(&self) -> &str {
        "/model/:id"
    }

    fn context(&self) -> &PageContext<D> {
        &self.ctx
    }

    fn lifecycle(&self) -> &PageLifecycle {
        &self.lifecycle
    }

    async fn wait_ready(&self) -> ProbeResult<()> {
        self.ctx.waiter.wait_for_page_load().await?;
        let _ = self.ctx.waiter.wait_for(&self.votes, WaitCondition::Visible).await?;
        Ok(())
    }
}
