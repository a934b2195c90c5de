//! Story Service: one method per backend endpoint, no business logic.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use storyfeed_common::model::{
    Id,
    page::Page,
    story::{Comment, CommentText, NewStory, Story, StoryMarker},
};
use thiserror::Error;
use url::Url;

mod http;

pub use http::HttpStoryService;

pub type Result<T, E = ServiceError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Request could not be completed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Request body could not be encoded: {0}")]
    Encode(reqwest::Error),
    #[error("Request rejected ({status}): {message}")]
    Validation { status: StatusCode, message: String },
    #[error("Server error ({status}): {message}")]
    Server { status: StatusCode, message: String },
    #[error("Base URL {0} cannot have endpoint paths appended")]
    BaseUrl(Url),
}

impl ServiceError {
    /// The message the backend attached to its error reply, if any.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ServiceError::Validation { message, .. } | ServiceError::Server { message, .. } => {
                Some(message)
            }
            ServiceError::Network(_) | ServiceError::Encode(_) | ServiceError::BaseUrl(_) => None,
        }
    }

    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ServiceError::Validation { status, .. } | ServiceError::Server { status, .. } => {
                Some(*status)
            }
            ServiceError::Network(error) | ServiceError::Encode(error) => error.status(),
            ServiceError::BaseUrl(_) => None,
        }
    }
}

/// Error body the backend sends along with non-2xx replies.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// Backend operations the feed needs.
///
/// `toggle_like` and `add_comment` only report success; callers that need the
/// resulting likes or comments have to reconcile on their own.
pub trait StoryService {
    fn list_stories(
        &self,
        page: NonZeroU32,
        page_size: NonZeroU32,
    ) -> impl Future<Output = Result<Page<Story>>> + Send;

    fn get_story(&self, story_id: &Id<StoryMarker>) -> impl Future<Output = Result<Story>> + Send;

    fn create_story(&self, story: &NewStory) -> impl Future<Output = Result<Story>> + Send;

    fn toggle_like(&self, story_id: &Id<StoryMarker>) -> impl Future<Output = Result<()>> + Send;

    fn add_comment(
        &self,
        story_id: &Id<StoryMarker>,
        text: &CommentText,
    ) -> impl Future<Output = Result<()>> + Send;

    fn list_comments(
        &self,
        story_id: &Id<StoryMarker>,
    ) -> impl Future<Output = Result<Vec<Comment>>> + Send;
}
