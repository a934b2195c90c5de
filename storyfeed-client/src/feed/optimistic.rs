//! Local projection of like toggles, applied before the backend answers.

use storyfeed_common::model::{
    Id,
    story::{Like, LikeMarker, Story},
    user::User,
};
use time::OffsetDateTime;

/// What a toggle did to a story's likes, kept so it can be undone.
#[derive(Clone, Eq, PartialEq, Debug)]
pub(crate) enum LikeProjection {
    Added { like_id: Id<LikeMarker> },
    Removed { index: usize, like: Like },
}

/// Flips `user`'s like on `story`.
///
/// A new like gets the provisional `like_id`, the given time and a snapshot
/// of `user`.
pub(crate) fn toggle(
    story: &mut Story,
    user: &User,
    like_id: Id<LikeMarker>,
    now: OffsetDateTime,
) -> LikeProjection {
    if let Some(index) = story.likes.iter().position(|like| like.user_id == user.id) {
        let like = story.likes.remove(index);
        return LikeProjection::Removed { index, like };
    }

    story.likes.push(Like {
        id: like_id.clone(),
        user_id: user.id.clone(),
        story_id: story.id.clone(),
        user: user.clone(),
        created_at: now,
    });
    LikeProjection::Added { like_id }
}

/// Undoes `projection`. A no-op when the story has since been replaced by a
/// fetched copy that no longer carries the projected change.
pub(crate) fn revert(story: &mut Story, projection: LikeProjection) {
    match projection {
        LikeProjection::Added { like_id } => story.likes.retain(|like| like.id != like_id),
        LikeProjection::Removed { index, like } => {
            if !story.is_liked_by(&like.user_id) {
                let index = index.min(story.likes.len());
                story.likes.insert(index, like);
            }
        }
    }
}
