use crate::model::{
    Id, ModelValidationError,
    user::{User, UserMarker},
};
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use std::fmt::{Debug, Formatter};
use thiserror::Error;
use time::OffsetDateTime;

pub const STORY_CAPTION_MAX_LEN: usize = 500;
pub const STORY_IMAGE_MAX_BYTES: usize = 5 * 1024 * 1024;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct StoryMarker;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct LikeMarker;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct CommentMarker;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: Id<StoryMarker>,
    pub user_id: Id<UserMarker>,
    pub user: User,
    pub caption: String,
    pub image_url: String,
    #[serde(default)]
    pub likes: Vec<Like>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Story {
    /// Relies on the backend keeping at most one like per user and story.
    #[must_use]
    pub fn is_liked_by(&self, user_id: &Id<UserMarker>) -> bool {
        self.likes.iter().any(|like| &like.user_id == user_id)
    }

    #[must_use]
    pub fn like_count(&self) -> usize {
        self.likes.len()
    }

    #[must_use]
    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub id: Id<LikeMarker>,
    pub user_id: Id<UserMarker>,
    pub story_id: Id<StoryMarker>,
    pub user: User,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Id<CommentMarker>,
    pub user_id: Id<UserMarker>,
    pub story_id: Id<StoryMarker>,
    pub user: User,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Everything needed to submit a story, already checked client-side.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct NewStory {
    pub caption: StoryCaption,
    pub image: StoryImage,
}

impl NewStory {
    pub fn new(caption: String, image: ImageUpload) -> Result<Self, ModelValidationError> {
        Ok(Self {
            caption: StoryCaption::new(caption)?,
            image: StoryImage::new(image)?,
        })
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
#[serde(transparent)]
pub struct StoryCaption(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
pub enum InvalidCaptionError {
    #[error("Please add a caption")]
    Empty,
    #[error("Caption is {0} characters long, at most 500 are allowed")]
    TooLong(usize),
}

impl StoryCaption {
    pub fn new(caption: String) -> Result<Self, InvalidCaptionError> {
        if caption.trim().is_empty() {
            return Err(InvalidCaptionError::Empty);
        }

        let len = caption.chars().count();
        if len > STORY_CAPTION_MAX_LEN {
            return Err(InvalidCaptionError::TooLong(len));
        }

        Ok(Self(caption))
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl<'de> Deserialize<'de> for StoryCaption {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        StoryCaption::new(inner.clone())
            .map_err(|_| Error::invalid_value(Unexpected::Str(&inner), &"StoryCaption"))
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
pub enum InvalidImageError {
    #[error("Please select a valid image file (got {0})")]
    NotAnImage(String),
    #[error("Image size must be less than 5MB (got {0} bytes)")]
    TooLarge(usize),
}

/// An image file picked for upload, not yet checked.
#[derive(Clone, Eq, PartialEq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Debug for ImageUpload {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// An [`ImageUpload`] whose content type and size have been checked.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct StoryImage(ImageUpload);

impl StoryImage {
    pub fn new(upload: ImageUpload) -> Result<Self, InvalidImageError> {
        if !upload.content_type.starts_with("image/") {
            return Err(InvalidImageError::NotAnImage(upload.content_type));
        }
        if upload.bytes.len() > STORY_IMAGE_MAX_BYTES {
            return Err(InvalidImageError::TooLarge(upload.bytes.len()));
        }

        Ok(Self(upload))
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.0.file_name
    }

    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.0.content_type
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.0.bytes
    }

    #[must_use]
    pub fn into_inner(self) -> ImageUpload {
        self.0
    }
}

impl TryFrom<ImageUpload> for StoryImage {
    type Error = InvalidImageError;

    fn try_from(value: ImageUpload) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
#[serde(transparent)]
pub struct CommentText(String);

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("Comment text must not be blank")]
pub struct InvalidCommentTextError;

impl CommentText {
    pub fn new(text: String) -> Result<Self, InvalidCommentTextError> {
        if text.trim().is_empty() {
            Err(InvalidCommentTextError)
        } else {
            Ok(Self(text))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}
