//! Blob store trait and in-memory implementation.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::warn;

use crate::error::{StorageError, StorageResult};

/// The storage operations the generation engine depends on.
///
/// Production uses [`crate::S3Client`]; tests use [`MemoryStore`].
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload a local file.
    async fn upload_file(&self, path: &Path, key: &str, content_type: &str) -> StorageResult<()>;

    /// Upload raw bytes.
    async fn upload_bytes(&self, data: Vec<u8>, key: &str, content_type: &str)
        -> StorageResult<()>;

    /// Download an object to a local file.
    async fn download_file(&self, key: &str, path: &Path) -> StorageResult<()>;

    /// Delete a single object. Deleting a missing object is not an error.
    async fn delete_object(&self, key: &str) -> StorageResult<()>;

    /// List object keys under a prefix.
    async fn list_keys(&self, prefix: &str) -> StorageResult<Vec<String>>;

    /// Check whether an object exists.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Delete every object under a prefix, returning the count removed.
    ///
    /// Individual delete failures are logged and skipped so one stuck
    /// object cannot block cleanup of the rest.
    async fn delete_prefix(&self, prefix: &str) -> StorageResult<u32> {
        let keys = self.list_keys(prefix).await?;
        let mut deleted = 0;
        for key in keys {
            match self.delete_object(&key).await {
                Ok(()) => deleted += 1,
                Err(e) => warn!("Failed to delete {} during prefix cleanup: {}", key, e),
            }
        }
        Ok(deleted)
    }
}

/// In-memory blob store for tests and local runs.
#[derive(Clone, Default)]
pub struct MemoryStore {
    objects: Arc<RwLock<BTreeMap<String, StoredObject>>>,
}

#[derive(Debug, Clone)]
struct StoredObject {
    data: Vec<u8>,
    content_type: String,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Whether the store holds no objects.
    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    /// Read an object's bytes (test helper).
    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.read().await.get(key).map(|o| o.data.clone())
    }

    /// Seed an object directly (test helper).
    pub async fn put(&self, key: impl Into<String>, data: Vec<u8>, content_type: &str) {
        self.objects.write().await.insert(
            key.into(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
    }

    /// Content type recorded for an object (test helper).
    pub async fn content_type(&self, key: &str) -> Option<String> {
        self.objects
            .read()
            .await
            .get(key)
            .map(|o| o.content_type.clone())
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    async fn upload_file(&self, path: &Path, key: &str, content_type: &str) -> StorageResult<()> {
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| StorageError::upload_failed(format!("{}: {}", path.display(), e)))?;
        self.put(key, data, content_type).await;
        Ok(())
    }

    async fn upload_bytes(
        &self,
        data: Vec<u8>,
        key: &str,
        content_type: &str,
    ) -> StorageResult<()> {
        self.put(key, data, content_type).await;
        Ok(())
    }

    async fn download_file(&self, key: &str, path: &Path) -> StorageResult<()> {
        let data = self
            .get(key)
            .await
            .ok_or_else(|| StorageError::not_found(key))?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::download_failed(e.to_string()))?;
        }
        tokio::fs::write(path, data)
            .await
            .map_err(|e| StorageError::download_failed(e.to_string()))?;
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> StorageResult<()> {
        self.objects.write().await.remove(key);
        Ok(())
    }

    async fn list_keys(&self, prefix: &str) -> StorageResult<Vec<String>> {
        Ok(self
            .objects
            .read()
            .await
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self.objects.read().await.contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        store
            .upload_bytes(b"hello".to_vec(), "stories/a/story.mp4", "video/mp4")
            .await
            .unwrap();

        assert!(store.exists("stories/a/story.mp4").await.unwrap());
        assert_eq!(
            store.content_type("stories/a/story.mp4").await.as_deref(),
            Some("video/mp4")
        );
        assert_eq!(store.get("stories/a/story.mp4").await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_delete_prefix_removes_only_matching() {
        let store = MemoryStore::new();
        store.put("stories/a/story.mp4", vec![1], "video/mp4").await;
        store.put("stories/a/thumb.jpg", vec![2], "image/jpeg").await;
        store.put("stories/b/story.mp4", vec![3], "video/mp4").await;

        let deleted = store.delete_prefix("stories/a/").await.unwrap();
        assert_eq!(deleted, 2);
        assert!(!store.exists("stories/a/story.mp4").await.unwrap());
        assert!(store.exists("stories/b/story.mp4").await.unwrap());
    }

    #[tokio::test]
    async fn test_download_file_writes_to_disk() {
        let store = MemoryStore::new();
        store.put("segments/s/x.mp4", b"clip".to_vec(), "video/mp4").await;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("x.mp4");
        store.download_file("segments/s/x.mp4", &path).await.unwrap();

        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"clip");
    }

    #[tokio::test]
    async fn test_download_missing_is_not_found() {
        let store = MemoryStore::new();
        let dir = tempfile::tempdir().unwrap();
        let err = store
            .download_file("missing", &dir.path().join("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }
}
