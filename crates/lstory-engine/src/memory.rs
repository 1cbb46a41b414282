//! In-memory collaborator implementations for tests and local runs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use lstory_models::{
    GeneratedStory, Segment, StepId, StoryId, StoryMetadata, StorySegment, Template, TemplateId,
};

use crate::error::{EngineResult, GenerateError};
use crate::stores::{CounterKind, Page, SegmentStore, StoryFilter, StoryRepository, TemplateStore};

/// In-memory template store.
#[derive(Clone, Default)]
pub struct MemoryTemplateStore {
    templates: Arc<RwLock<HashMap<TemplateId, Template>>>,
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a template.
    pub async fn insert(&self, template: Template) {
        self.templates
            .write()
            .await
            .insert(template.id.clone(), template);
    }
}

#[async_trait]
impl TemplateStore for MemoryTemplateStore {
    async fn get_active_template(&self, id: &TemplateId) -> EngineResult<Option<Template>> {
        Ok(self
            .templates
            .read()
            .await
            .get(id)
            .filter(|t| t.is_active)
            .cloned())
    }
}

/// In-memory segment store.
#[derive(Clone, Default)]
pub struct MemorySegmentStore {
    segments: Arc<RwLock<Vec<Segment>>>,
}

impl MemorySegmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a segment to the pool.
    pub async fn insert(&self, segment: Segment) {
        self.segments.write().await.push(segment);
    }
}

#[async_trait]
impl SegmentStore for MemorySegmentStore {
    async fn query_eligible(
        &self,
        step_id: &StepId,
        exclude_owners: &[String],
    ) -> EngineResult<Vec<Segment>> {
        Ok(self
            .segments
            .read()
            .await
            .iter()
            .filter(|s| {
                s.step_id == *step_id
                    && s.is_eligible()
                    && !exclude_owners.contains(&s.owner_id)
            })
            .cloned()
            .collect())
    }
}

/// In-memory story repository.
#[derive(Clone, Default)]
pub struct MemoryStoryRepository {
    stories: Arc<RwLock<HashMap<StoryId, GeneratedStory>>>,
}

impl MemoryStoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored stories (test helper).
    pub async fn len(&self) -> usize {
        self.stories.read().await.len()
    }

    /// Whether the repository is empty (test helper).
    pub async fn is_empty(&self) -> bool {
        self.stories.read().await.is_empty()
    }
}

#[async_trait]
impl StoryRepository for MemoryStoryRepository {
    async fn insert(&self, story: GeneratedStory) -> EngineResult<()> {
        self.stories.write().await.insert(story.id.clone(), story);
        Ok(())
    }

    async fn get(&self, id: &StoryId) -> EngineResult<Option<GeneratedStory>> {
        Ok(self.stories.read().await.get(id).cloned())
    }

    async fn set_segments(&self, id: &StoryId, segments: Vec<StorySegment>) -> EngineResult<()> {
        let mut stories = self.stories.write().await;
        let story = stories
            .get_mut(id)
            .ok_or_else(|| GenerateError::StoryNotFound(id.clone()))?;
        story.segments = segments;
        story.updated_at = Utc::now();
        Ok(())
    }

    async fn mark_completed(
        &self,
        id: &StoryId,
        storage_key: String,
        thumbnail_key: String,
        metadata: StoryMetadata,
    ) -> EngineResult<()> {
        let mut stories = self.stories.write().await;
        let story = stories
            .get_mut(id)
            .ok_or_else(|| GenerateError::StoryNotFound(id.clone()))?;
        *story = story.clone().complete(storage_key, thumbnail_key, metadata);
        Ok(())
    }

    async fn mark_failed(&self, id: &StoryId, kind: &str, message: &str) -> EngineResult<()> {
        let mut stories = self.stories.write().await;
        let story = stories
            .get_mut(id)
            .ok_or_else(|| GenerateError::StoryNotFound(id.clone()))?;
        *story = story.clone().fail(kind, message);
        Ok(())
    }

    async fn list(
        &self,
        filter: &StoryFilter,
        page: &Page,
    ) -> EngineResult<(Vec<GeneratedStory>, usize)> {
        let stories = self.stories.read().await;

        let mut matching: Vec<GeneratedStory> = stories
            .values()
            .filter(|s| {
                filter
                    .creator_id
                    .as_ref()
                    .is_none_or(|c| s.creator_id == *c)
                    && filter.status.is_none_or(|st| s.status == st)
            })
            .cloned()
            .collect();

        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len();
        let items = matching
            .into_iter()
            .skip(page.offset)
            .take(page.limit)
            .collect();

        Ok((items, total))
    }

    async fn delete(&self, id: &StoryId) -> EngineResult<bool> {
        Ok(self.stories.write().await.remove(id).is_some())
    }

    async fn increment_counter(&self, id: &StoryId, counter: CounterKind) -> EngineResult<u64> {
        let mut stories = self.stories.write().await;
        let story = stories
            .get_mut(id)
            .ok_or_else(|| GenerateError::StoryNotFound(id.clone()))?;

        let value = match counter {
            CounterKind::Views => {
                story.view_count += 1;
                story.view_count
            }
            CounterKind::Likes => {
                story.like_count += 1;
                story.like_count
            }
            CounterKind::Shares => {
                story.share_count += 1;
                story.share_count
            }
        };

        Ok(value)
    }
}
