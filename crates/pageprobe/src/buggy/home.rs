//! Landing page: featured cards and navigation.

use super::selectors::{locate, HomeSelectors};
use crate::driver::PageDriver;
use crate::extract::parse_vote_count;
use crate::locator::{Locator, Selector};
use crate::page_object::{PageContext, PageLifecycle, PageObject, UrlMatcher};
use crate::result::ProbeResult;
use crate::wait::WaitCondition;
use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

/// One featured card on the landing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HomeCard {
    /// Card heading, e.g. "Popular Make"
    pub heading: String,
    /// Vote tally, for cards that show one
    pub votes: Option<u64>,
}

/// Landing page
pub struct HomePage<D: PageDriver + ?Sized> {
    ctx: PageContext<D>,
    lifecycle: PageLifecycle,
    logo: Locator,
    card: Locator,
    card_heading: Selector,
    card_votes: Selector,
    popular_make_link: Locator,
    popular_model_link: Locator,
    overall_link: Locator,
}

impl<D: PageDriver + ?Sized> std::fmt::Debug for HomePage<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HomePage")
            .field("ctx", &self.ctx)
            .field("lifecycle", &self.lifecycle)
            .finish_non_exhaustive()
    }
}

impl<D: PageDriver + ?Sized> HomePage<D> {
    /// Create the page object over a session
    #[must_use]
    pub fn new(ctx: PageContext<D>, sel: &HomeSelectors) -> Self {
        Self {
            ctx,
            lifecycle: PageLifecycle::default(),
            logo: locate(&sel.logo, "logo"),
            card: locate(&sel.card, "card"),
            card_heading: sel.card_heading.clone(),
            card_votes: sel.card_votes.clone(),
            popular_make_link: locate(&sel.popular_make_link, "popular make link"),
            popular_model_link: locate(&sel.popular_model_link, "popular model link"),
            overall_link: locate(&sel.overall_link, "overall rating link"),
        }
    }

    /// Navigate to the landing page and wait for it
    pub async fn open(&self) -> ProbeResult<()> {
        let url = self.ctx.url("/");
        info!(%url, "opening home page");
        self.ctx.driver().navigate(&url).await?;
        self.ensure_ready().await
    }

    /// Follow the popular make card; returns the make page URL
    pub async fn open_popular_make(&self) -> ProbeResult<String> {
        self.follow(&self.popular_make_link, "/make/:id").await
    }

    /// Follow the popular model card; returns the model page URL
    pub async fn open_popular_model(&self) -> ProbeResult<String> {
        self.follow(&self.popular_model_link, "/model/:id").await
    }

    /// Follow the overall rating card; returns the ranking URL
    pub async fn open_overall_rating(&self) -> ProbeResult<String> {
        self.follow(&self.overall_link, "/overall").await
    }

    async fn follow(&self, link: &Locator, pattern: &str) -> ProbeResult<String> {
        self.ensure_ready().await?;
        self.ctx.actions.click(link).await?;
        let url = self.ctx.waiter.wait_for_url(&UrlMatcher::new(pattern)).await?;
        info!(link = %link.name(), %url, "followed card link");
        Ok(url)
    }

    /// Featured cards in document order
    pub async fn cards(&self) -> ProbeResult<Vec<HomeCard>> {
        self.ensure_ready().await?;
        let driver = self.ctx.driver();
        let mut cards = Vec::new();
        for card in driver.find_elements(self.card.selector()).await? {
            let heading = match driver.find_children(&card, &self.card_heading).await?.first() {
                Some(h) => driver.text(h).await?.trim().to_string(),
                None => String::new(),
            };
            let votes = match driver.find_children(&card, &self.card_votes).await?.first() {
                Some(v) => Some(parse_vote_count(&driver.text(v).await?)?),
                None => None,
            };
            cards.push(HomeCard { heading, votes });
        }
        Ok(cards)
    }

    /// Document title
    pub async fn title(&self) -> ProbeResult<String> {
        self.ctx.driver().title().await
    }
}

#[async_trait]
impl<D: PageDriver + ?Sized> PageObject<D> for HomePage<D> {
    fn page_name(&self) -> &'static str {
        "home"
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
        let _ = self.ctx.waiter.wait_for(&self.logo, WaitCondition::Visible).await?;
        let _ = self.ctx.waiter.wait_for(&self.card, WaitCondition::Exists).await?;
        Ok(())
    }
}
