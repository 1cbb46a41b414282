//! Publishing composed assets to blob storage.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use lstory_models::StoryId;
use lstory_storage::keys;
use lstory_storage::BlobStore;

use crate::error::EngineResult;

/// Writes a story's composed asset and thumbnail under its deterministic
/// key prefix, and removes them again on failure or deletion.
#[derive(Clone)]
pub struct AssetPublisher {
    store: Arc<dyn BlobStore>,
}

impl AssetPublisher {
    /// Create a publisher over a blob store.
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// Upload the composed asset and thumbnail, returning their keys.
    ///
    /// Partial success is not a success: if the thumbnail upload fails
    /// after the asset uploaded, the caller's failure path runs
    /// [`AssetPublisher::unpublish`], which removes both.
    pub async fn publish(
        &self,
        story_id: &StoryId,
        asset_path: &Path,
        thumbnail_path: &Path,
    ) -> EngineResult<(String, String)> {
        let asset_key = keys::story_asset_key(story_id);
        let thumbnail_key = keys::story_thumbnail_key(story_id);

        self.store
            .upload_file(asset_path, &asset_key, keys::CONTENT_TYPE_MP4)
            .await?;
        self.store
            .upload_file(thumbnail_path, &thumbnail_key, keys::CONTENT_TYPE_JPEG)
            .await?;

        info!(story_id = %story_id, "Published story asset and thumbnail");
        Ok((asset_key, thumbnail_key))
    }

    /// Delete every object published for a story.
    pub async fn unpublish(&self, story_id: &StoryId) -> EngineResult<u32> {
        let deleted = self.store.delete_prefix(&keys::story_prefix(story_id)).await?;
        if deleted > 0 {
            info!(story_id = %story_id, deleted, "Removed published story objects");
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lstory_storage::MemoryStore;

    #[tokio::test]
    async fn test_publish_writes_both_objects() {
        let dir = tempfile::tempdir().unwrap();
        let asset = dir.path().join("story.mp4");
        let thumb = dir.path().join("thumb.jpg");
        tokio::fs::write(&asset, b"video").await.unwrap();
        tokio::fs::write(&thumb, b"image").await.unwrap();

        let store = Arc::new(MemoryStore::new());
        let publisher = AssetPublisher::new(store.clone());
        let story_id = StoryId::from_string("s1");

        let (asset_key, thumb_key) = publisher.publish(&story_id, &asset, &thumb).await.unwrap();

        assert_eq!(asset_key, "stories/s1/story.mp4");
        assert_eq!(thumb_key, "stories/s1/thumb.jpg");
        assert_eq!(store.content_type(&asset_key).await.as_deref(), Some("video/mp4"));
        assert_eq!(store.content_type(&thumb_key).await.as_deref(), Some("image/jpeg"));
    }

    #[tokio::test]
    async fn test_unpublish_clears_prefix() {
        let store = Arc::new(MemoryStore::new());
        store.put("stories/s1/story.mp4", vec![1], "video/mp4").await;
        store.put("stories/s1/thumb.jpg", vec![2], "image/jpeg").await;
        store.put("stories/s2/story.mp4", vec![3], "video/mp4").await;

        let publisher = AssetPublisher::new(store.clone());
        let deleted = publisher
            .unpublish(&StoryId::from_string("s1"))
            .await
            .unwrap();

        assert_eq!(deleted, 2);
        assert_eq!(store.list_keys("stories/s1/").await.unwrap().len(), 0);
        assert!(store.exists("stories/s2/story.mp4").await.unwrap());
    }
}
