//! Deterministic object key derivation.
//!
//! Every artifact of a generated story lives under one prefix derived
//! from the story id, so cleanup after a failed run is a single prefix
//! delete and a failed run can never leave objects that don't trace back
//! to it.

use lstory_models::{StepId, StoryId};
use uuid::Uuid;

/// Content type for composed assets and segment uploads.
pub const CONTENT_TYPE_MP4: &str = "video/mp4";
/// Content type for derived thumbnails.
pub const CONTENT_TYPE_JPEG: &str = "image/jpeg";

/// Prefix holding every object of one story.
pub fn story_prefix(story_id: &StoryId) -> String {
    format!("stories/{}/", story_id)
}

/// Key of the composed story asset.
pub fn story_asset_key(story_id: &StoryId) -> String {
    format!("stories/{}/story.mp4", story_id)
}

/// Key of the derived thumbnail.
pub fn story_thumbnail_key(story_id: &StoryId) -> String {
    format!("stories/{}/thumb.jpg", story_id)
}

/// Fresh collision-resistant key for a segment upload against a step.
///
/// Used when issuing presigned PUT URLs to submitters.
pub fn segment_upload_key(step_id: &StepId) -> String {
    format!("segments/{}/{}.mp4", step_id, Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_story_keys_share_prefix() {
        let id = StoryId::from_string("abc");
        let prefix = story_prefix(&id);
        assert!(story_asset_key(&id).starts_with(&prefix));
        assert!(story_thumbnail_key(&id).starts_with(&prefix));
    }

    #[test]
    fn test_story_keys_deterministic() {
        let id = StoryId::from_string("abc");
        assert_eq!(story_asset_key(&id), "stories/abc/story.mp4");
        assert_eq!(story_thumbnail_key(&id), "stories/abc/thumb.jpg");
    }

    #[test]
    fn test_segment_upload_keys_unique() {
        let step = StepId::from_string("step1");
        assert_ne!(segment_upload_key(&step), segment_upload_key(&step));
    }
}
