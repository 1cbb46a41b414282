//! Collaborator traits: template store, segment store, story repository.
//!
//! Templates and segments are owned by upstream services; the engine only
//! reads them. The story repository is the persistence boundary this core
//! exposes to its callers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use lstory_models::{
    GeneratedStory, Segment, StepId, StoryId, StoryMetadata, StorySegment, StoryStatus, Template,
    TemplateId,
};

use crate::error::EngineResult;

/// Read access to story templates.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Fetch a template if it exists and is active.
    async fn get_active_template(&self, id: &TemplateId) -> EngineResult<Option<Template>>;
}

/// Read access to the pool of submitted segments.
#[async_trait]
pub trait SegmentStore: Send + Sync {
    /// Eligible segments for a step (approved, ingest-completed), with
    /// segments owned by any of `exclude_owners` filtered out.
    async fn query_eligible(
        &self,
        step_id: &StepId,
        exclude_owners: &[String],
    ) -> EngineResult<Vec<Segment>>;
}

/// Filter for story listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoryFilter {
    /// Restrict to one creator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<String>,
    /// Restrict to one lifecycle state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StoryStatus>,
}

/// Pagination window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Page {
    /// Items to skip
    pub offset: usize,
    /// Maximum items to return
    pub limit: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 10,
        }
    }
}

/// Engagement counter selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterKind {
    Views,
    Likes,
    Shares,
}

/// Persistence boundary for generated stories.
///
/// Single-writer invariant: after `insert`, only the generation task that
/// owns the story calls the mutating methods until a terminal state is
/// reached; counters are the one exception.
#[async_trait]
pub trait StoryRepository: Send + Sync {
    /// Insert a freshly created story record.
    async fn insert(&self, story: GeneratedStory) -> EngineResult<()>;

    /// Fetch a story by id.
    async fn get(&self, id: &StoryId) -> EngineResult<Option<GeneratedStory>>;

    /// Attach the materialized segment rows.
    async fn set_segments(&self, id: &StoryId, segments: Vec<StorySegment>) -> EngineResult<()>;

    /// Atomically transition to `completed` with keys and metadata.
    async fn mark_completed(
        &self,
        id: &StoryId,
        storage_key: String,
        thumbnail_key: String,
        metadata: StoryMetadata,
    ) -> EngineResult<()>;

    /// Atomically transition to `failed` with the error recorded.
    async fn mark_failed(&self, id: &StoryId, kind: &str, message: &str) -> EngineResult<()>;

    /// List stories newest-first with a total count for the filter.
    async fn list(
        &self,
        filter: &StoryFilter,
        page: &Page,
    ) -> EngineResult<(Vec<GeneratedStory>, usize)>;

    /// Delete a story record. Returns false if it did not exist.
    async fn delete(&self, id: &StoryId) -> EngineResult<bool>;

    /// Increment an engagement counter, returning the new value.
    async fn increment_counter(&self, id: &StoryId, counter: CounterKind) -> EngineResult<u64>;
}
