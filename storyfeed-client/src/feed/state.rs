use std::num::NonZeroU32;
use storyfeed_common::model::{
    Id,
    story::{Story, StoryMarker},
};

/// Where a feed session currently is.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub enum FeedStatus {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// The first page is being fetched, either initially or on refresh.
    Loading,
    Loaded,
    LoadingMore,
    /// A fetch failed and there is nothing to show.
    ErrorEmpty,
    /// A fetch failed but earlier stories are kept.
    ErrorPartial,
}

/// Snapshot of a feed session as presentation code sees it.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct FeedState {
    pub(super) stories: Vec<Story>,
    pub(super) page: NonZeroU32,
    pub(super) has_more: bool,
    pub(super) status: FeedStatus,
    pub(super) error: Option<String>,
}

impl FeedState {
    #[must_use]
    pub fn stories(&self) -> &[Story] {
        &self.stories
    }

    #[must_use]
    pub fn story(&self, story_id: &Id<StoryMarker>) -> Option<&Story> {
        self.stories.iter().find(|story| &story.id == story_id)
    }

    /// Page number of the last page that was applied.
    #[must_use]
    pub fn page(&self) -> NonZeroU32 {
        self.page
    }

    #[must_use]
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    #[must_use]
    pub fn status(&self) -> FeedStatus {
        self.status
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self.status, FeedStatus::Loading | FeedStatus::LoadingMore)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }

    pub(super) fn story_mut(&mut self, story_id: &Id<StoryMarker>) -> Option<&mut Story> {
        self.stories.iter_mut().find(|story| &story.id == story_id)
    }

    pub(super) fn fail(&mut self, message: String) {
        self.status = if self.stories.is_empty() {
            FeedStatus::ErrorEmpty
        } else {
            FeedStatus::ErrorPartial
        };
        self.error = Some(message);
    }

    /// Clears a banner error shown above loaded stories. An error with
    /// nothing to show stays until a fetch succeeds.
    pub(super) fn dismiss_error(&mut self) -> bool {
        if self.status != FeedStatus::ErrorPartial {
            return false;
        }

        self.status = FeedStatus::Loaded;
        self.error = None;
        true
    }

    /// Puts a story first, e.g. one that was just created.
    pub(super) fn prepend(&mut self, story: Story) {
        self.stories.insert(0, story);
        if self.status == FeedStatus::ErrorEmpty {
            self.status = FeedStatus::ErrorPartial;
        }
    }
}

impl Default for FeedState {
    fn default() -> Self {
        Self {
            stories: Vec::new(),
            page: NonZeroU32::MIN,
            has_more: true,
            status: FeedStatus::Idle,
            error: None,
        }
    }
}
