pub mod auth;
pub mod page;
pub mod story;
pub mod user;

use crate::{
    model::story::{InvalidCaptionError, InvalidCommentTextError, InvalidImageError},
    snowflake::{Epoch, Snowflake, SnowflakeGenerator},
};
use derive_where::derive_where;
use serde::{Deserialize, Serialize};
use std::{fmt::Display, marker::PhantomData};
use thiserror::Error;
use time::{UtcDateTime, macros::utc_datetime};

#[derive(Clone, Eq, PartialEq, Debug, Hash, Error)]
pub enum ModelValidationError {
    #[error(transparent)]
    Caption(#[from] InvalidCaptionError),
    #[error(transparent)]
    Image(#[from] InvalidImageError),
    #[error(transparent)]
    CommentText(#[from] InvalidCommentTextError),
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct StoryfeedEpoch;
impl Epoch for StoryfeedEpoch {
    const EPOCH_TIME: UtcDateTime = utc_datetime!(2025-01-01 00:00);
}

pub type StoryfeedSnowflake = Snowflake<StoryfeedEpoch>;
pub type StoryfeedSnowflakeGenerator = SnowflakeGenerator<StoryfeedEpoch>;

/// Prefix of ids minted on the client. The backend never hands these out.
pub const PROVISIONAL_ID_PREFIX: &str = "local-";

/// Opaque backend id, typed by what it identifies.
#[derive_where(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id<Marker>(String, #[serde(skip)] PhantomData<Marker>);

impl<Marker> Id<Marker> {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into(), PhantomData)
    }

    /// Renders a locally minted snowflake as a provisional id.
    #[must_use]
    pub fn provisional(snowflake: StoryfeedSnowflake) -> Self {
        Self::new(format!("{PROVISIONAL_ID_PREFIX}{snowflake}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// The snowflake behind a provisional id.
    #[must_use]
    pub fn provisional_snowflake(&self) -> Option<StoryfeedSnowflake> {
        let raw = self.0.strip_prefix(PROVISIONAL_ID_PREFIX)?.parse::<u64>().ok()?;
        let snowflake = StoryfeedSnowflake::new(raw);
        snowflake.is_provisional().then_some(snowflake)
    }

    /// Whether this id was minted locally and not yet replaced by a backend id.
    #[must_use]
    pub fn is_provisional(&self) -> bool {
        self.provisional_snowflake().is_some()
    }
}

impl<Marker> Display for Id<Marker> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<Marker> AsRef<str> for Id<Marker> {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<Marker> From<String> for Id<Marker> {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl<Marker> From<&str> for Id<Marker> {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
