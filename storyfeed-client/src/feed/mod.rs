//! Feed State Controller.
//!
//! Owns the in-memory feed for one feed session and publishes it through a
//! [`watch`] channel. Presentation code reads snapshots and calls the intent
//! methods; nothing else mutates the feed.
//!
//! Every page fetch takes a generation ticket and its response is only
//! applied while that ticket is the newest one, so a slow earlier request can
//! never overwrite the result of a later one.

mod optimistic;
mod state;

pub use state::{FeedState, FeedStatus};

use crate::{
    config::ClientConfig,
    service::{self, ServiceError, StoryService},
};
use optimistic::LikeProjection;
use parking_lot::Mutex;
use serde::Deserialize;
use std::{collections::HashMap, num::NonZeroU32};
use storyfeed_common::{
    model::{
        Id, ModelValidationError, StoryfeedSnowflakeGenerator,
        page::Page,
        story::{CommentText, ImageUpload, NewStory, Story, StoryMarker},
        user::User,
    },
    snowflake::SnowflakeTimestampFromDateTimeError,
};
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

const FETCH_FAILED_MESSAGE: &str = "Failed to fetch stories";

pub type Result<T, E = FeedError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error(transparent)]
    Validation(#[from] ModelValidationError),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("The comment was stored but the feed could not be reloaded: {0}")]
    CommentUnconfirmed(ServiceError),
    #[error("Story {0} is not part of the feed")]
    UnknownStory(Id<StoryMarker>),
    #[error("Could not mint a provisional id: {0}")]
    ProvisionalId(#[from] SnowflakeTimestampFromDateTimeError),
}

/// What happens when the backend rejects a like toggle that was already
/// applied locally.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeErrorPolicy {
    /// Log the failure and keep the local state, even though it may now
    /// disagree with the backend.
    #[default]
    Silent,
    /// Roll the local change back and return the error.
    Surface,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct FeedOptions {
    pub page_size: NonZeroU32,
    pub like_error_policy: LikeErrorPolicy,
}

impl From<&ClientConfig> for FeedOptions {
    fn from(config: &ClientConfig) -> Self {
        Self {
            page_size: config.page_size,
            like_error_policy: config.like_error_policy,
        }
    }
}

/// Whether a finished fetch made it into the feed.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum FetchOutcome {
    Applied,
    /// A newer fetch was issued meanwhile; this response was dropped.
    Superseded,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
enum FetchKind {
    Replace,
    Append,
}

#[derive(Copy, Clone, Debug)]
struct FetchTicket {
    generation: u64,
    page: NonZeroU32,
    kind: FetchKind,
}

/// Controller bookkeeping that subscribers never see.
#[derive(Debug, Default)]
struct Ledger {
    latest_fetch: u64,
    /// Whether a first page has been applied since the last reset. Until then
    /// there is no page cursor to continue from.
    listed: bool,
    /// Bumped whenever the list is swapped out wholesale.
    replacements: u64,
    /// Newest like toggle per story that is still waiting on the backend.
    pending_likes: HashMap<Id<StoryMarker>, u64>,
    like_generation: u64,
    like_ids: StoryfeedSnowflakeGenerator,
}

impl Ledger {
    /// Makes every ticket issued so far stale.
    fn issue_ticket(&mut self, page: NonZeroU32, kind: FetchKind) -> FetchTicket {
        self.latest_fetch += 1;
        FetchTicket {
            generation: self.latest_fetch,
            page,
            kind,
        }
    }
}

pub struct FeedController<S> {
    service: S,
    options: FeedOptions,
    state: watch::Sender<FeedState>,
    ledger: Mutex<Ledger>,
}

impl<S: StoryService> FeedController<S> {
    #[must_use]
    pub fn new(service: S, options: FeedOptions) -> Self {
        Self {
            service,
            options,
            state: watch::Sender::new(FeedState::default()),
            ledger: Mutex::new(Ledger::default()),
        }
    }

    #[must_use]
    pub fn service(&self) -> &S {
        &self.service
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> FeedState {
        self.state.borrow().clone()
    }

    /// Fetches the first page at the start of a feed session.
    pub async fn load(&self) -> Result<FetchOutcome> {
        info!("Loading feed");
        Ok(self.fetch_first_page().await?)
    }

    /// Re-fetches the first page and replaces the whole list with it.
    pub async fn refresh(&self) -> Result<FetchOutcome> {
        info!("Refreshing feed");
        Ok(self.fetch_first_page().await?)
    }

    /// Appends the next page. Returns `None` without touching the network
    /// when there is nothing more to load, a fetch is already running, or no
    /// first page has been loaded yet.
    pub async fn load_more(&self) -> Result<Option<FetchOutcome>> {
        let Some(ticket) = self.begin_append() else {
            debug!("Not loading more stories");
            return Ok(None);
        };

        let result = self
            .service
            .list_stories(ticket.page, self.options.page_size)
            .await;
        Ok(Some(self.finish_fetch(ticket, result)?))
    }

    /// Drops everything, including the effect of any request still running.
    pub fn reset(&self) {
        let mut ledger = self.ledger.lock();
        ledger.latest_fetch += 1;
        ledger.replacements += 1;
        ledger.listed = false;
        ledger.pending_likes.clear();
        self.state.send_replace(FeedState::default());
    }

    /// Hides the banner error above already loaded stories. Returns whether
    /// there was one.
    pub fn dismiss_error(&self) -> bool {
        let dismissed = self.state.send_if_modified(FeedState::dismiss_error);
        if dismissed {
            debug!("Dismissed feed error");
        }
        dismissed
    }

    /// Validates and uploads a story, then puts it first in the feed.
    #[instrument(skip_all)]
    pub async fn create_story(&self, caption: String, image: ImageUpload) -> Result<Story> {
        let new_story = NewStory::new(caption, image)
            .inspect_err(|error| warn!(%error, "Story rejected before upload"))?;

        let story = self
            .service
            .create_story(&new_story)
            .await
            .inspect_err(|error| error!(%error, "Creating story failed"))?;

        self.state.send_modify(|state| state.prepend(story.clone()));
        info!(story = %story.id, "Created story");

        Ok(story)
    }

    /// Flips `acting_user`'s like locally, then tells the backend.
    #[instrument(skip(self, acting_user), fields(user = %acting_user.id))]
    pub async fn toggle_like(&self, story_id: &Id<StoryMarker>, acting_user: &User) -> Result<()> {
        let (projection, generation, replacements) = {
            let mut ledger = self.ledger.lock();
            let like_id = Id::provisional(ledger.like_ids.generate()?);
            let now = OffsetDateTime::now_utc();

            let mut projection = None;
            self.state.send_if_modified(|state| {
                projection = state
                    .story_mut(story_id)
                    .map(|story| optimistic::toggle(story, acting_user, like_id, now));
                projection.is_some()
            });
            let projection =
                projection.ok_or_else(|| FeedError::UnknownStory(story_id.clone()))?;

            ledger.like_generation += 1;
            let generation = ledger.like_generation;
            ledger.pending_likes.insert(story_id.clone(), generation);

            (projection, generation, ledger.replacements)
        };
        debug!(?projection, "Applied like locally");

        let result = self.service.toggle_like(story_id).await;

        let mut ledger = self.ledger.lock();
        let newest = ledger.pending_likes.get(story_id) == Some(&generation);
        if newest {
            ledger.pending_likes.remove(story_id);
        }

        let Err(error) = result else {
            return Ok(());
        };

        match self.options.like_error_policy {
            LikeErrorPolicy::Silent => {
                warn!(%error, "Toggling like failed, keeping local state");
                Ok(())
            }
            LikeErrorPolicy::Surface => {
                if newest && ledger.replacements == replacements {
                    self.rollback_like(story_id, projection);
                } else {
                    debug!("Like was superseded, not rolling back");
                }
                Err(error.into())
            }
        }
    }

    /// Stores a comment, then reloads the first page to pick it up.
    ///
    /// If the reload fails the comment exists on the backend but not in the
    /// feed; that surfaces as [`FeedError::CommentUnconfirmed`].
    #[instrument(skip(self, acting_user, text), fields(user = %acting_user.id))]
    pub async fn add_comment(
        &self,
        story_id: &Id<StoryMarker>,
        acting_user: &User,
        text: String,
    ) -> Result<()> {
        let text = CommentText::new(text).map_err(ModelValidationError::from)?;

        self.service
            .add_comment(story_id, &text)
            .await
            .inspect_err(|error| error!(%error, "Adding comment failed"))?;
        debug!("Comment stored, reloading feed");

        match self.fetch_first_page().await {
            Ok(_) => Ok(()),
            Err(error) => {
                warn!(%error, "Comment stored but feed reload failed");
                Err(FeedError::CommentUnconfirmed(error))
            }
        }
    }

    fn rollback_like(&self, story_id: &Id<StoryMarker>, projection: LikeProjection) {
        let rolled_back = self.state.send_if_modified(|state| match state.story_mut(story_id) {
            Some(story) => {
                optimistic::revert(story, projection);
                true
            }
            None => false,
        });

        if rolled_back {
            info!("Rolled back like");
        }
    }

    async fn fetch_first_page(&self) -> service::Result<FetchOutcome> {
        let ticket = self.begin_replace();

        let result = self
            .service
            .list_stories(ticket.page, self.options.page_size)
            .await;
        self.finish_fetch(ticket, result)
    }

    /// A replacing fetch always goes ahead and supersedes whatever is running.
    fn begin_replace(&self) -> FetchTicket {
        let mut ledger = self.ledger.lock();
        let ticket = ledger.issue_ticket(NonZeroU32::MIN, FetchKind::Replace);
        self.state
            .send_modify(|state| state.status = FeedStatus::Loading);

        debug!(generation = ticket.generation, "Fetching first page");
        ticket
    }

    /// `None` when there is no next page, a fetch is running, or no first page
    /// has been applied yet.
    fn begin_append(&self) -> Option<FetchTicket> {
        let mut ledger = self.ledger.lock();
        let mut ticket = None;

        self.state.send_if_modified(|state| {
            if !ledger.listed || !state.has_more || state.is_loading() {
                return false;
            }

            ticket = Some(ledger.issue_ticket(state.page.saturating_add(1), FetchKind::Append));
            state.status = FeedStatus::LoadingMore;
            true
        });

        if let Some(ticket) = ticket {
            debug!(
                page = ticket.page.get(),
                generation = ticket.generation,
                "Fetching next page"
            );
        }
        ticket
    }

    fn finish_fetch(
        &self,
        ticket: FetchTicket,
        result: service::Result<Page<Story>>,
    ) -> service::Result<FetchOutcome> {
        let mut ledger = self.ledger.lock();

        if ticket.generation != ledger.latest_fetch {
            debug!(
                page = ticket.page.get(),
                generation = ticket.generation,
                latest = ledger.latest_fetch,
                failed = result.is_err(),
                "Dropping superseded stories page"
            );
            return Ok(FetchOutcome::Superseded);
        }

        match result {
            Ok(page) => {
                let has_more = ticket.page.get() < page.total_pages;
                let fetched = page.data.len();

                self.state.send_modify(|state| {
                    match ticket.kind {
                        FetchKind::Replace => state.stories = page.data,
                        FetchKind::Append => state.stories.extend(page.data),
                    }
                    state.page = ticket.page;
                    state.has_more = has_more;
                    state.status = FeedStatus::Loaded;
                    state.error = None;
                });
                if ticket.kind == FetchKind::Replace {
                    ledger.replacements += 1;
                    ledger.listed = true;
                }

                debug!(page = ticket.page.get(), fetched, has_more, "Applied stories page");
                Ok(FetchOutcome::Applied)
            }
            Err(error) => {
                error!(%error, page = ticket.page.get(), "Fetching stories failed");
                let message = error
                    .server_message()
                    .unwrap_or(FETCH_FAILED_MESSAGE)
                    .to_owned();
                self.state.send_modify(|state| state.fail(message));

                Err(error)
            }
        }
    }
}
