//! Generated story aggregate and lifecycle.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::render::{Customization, Resolution, TransitionKind};
use crate::request::GenerationRequest;
use crate::segment::SegmentId;
use crate::template::{StepId, TemplateId};

/// Unique identifier for a generated story.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct StoryId(pub String);

impl StoryId {
    /// Generate a new random story ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for StoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Generation lifecycle state.
///
/// `pending -> processing -> (completed | failed)`; terminal states are
/// immutable apart from the engagement counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoryStatus {
    /// Accepted, run not started
    #[default]
    Pending,
    /// Generation run in flight
    Processing,
    /// Final asset published
    Completed,
    /// Run failed, error recorded
    Failed,
}

impl StoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoryStatus::Pending => "pending",
            StoryStatus::Processing => "processing",
            StoryStatus::Completed => "completed",
            StoryStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StoryStatus::Completed | StoryStatus::Failed)
    }
}

impl fmt::Display for StoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Metadata probed from the composed output asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StoryMetadata {
    /// Duration in seconds
    pub duration: f64,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Frame rate
    pub fps: f64,
}

/// Join row: one chosen segment fulfilling one template step.
///
/// Rows are materialized atomically once every step has a selection;
/// their `position` values equal the step positions, so reading them back
/// sorted by position reproduces the template's step order exactly.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StorySegment {
    /// Owning story
    pub story_id: StoryId,

    /// Step this row fulfills
    pub step_id: StepId,

    /// Chosen segment
    pub segment_id: SegmentId,

    /// Copy of the step's position
    pub position: i32,

    /// Per-instance edits applied during composition
    pub customization: Customization,
}

/// A complete story generated from randomly selected segments.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GeneratedStory {
    /// Unique story ID
    pub id: StoryId,

    /// Source template
    pub template_id: TemplateId,

    /// Requesting user
    pub creator_id: String,

    /// Display title
    pub title: String,

    /// Optional description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Render settings carried from the request
    pub resolution: Resolution,
    pub transition: TransitionKind,
    pub transition_duration: f64,

    /// Lifecycle state
    #[serde(default)]
    pub status: StoryStatus,

    /// Blob key of the composed asset; present iff completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_key: Option<String>,

    /// Blob key of the derived thumbnail; present iff completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_key: Option<String>,

    /// Probed output metadata; present iff completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<StoryMetadata>,

    /// Stable error kind (e.g. "no_eligible_segment"); present iff failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,

    /// Human-readable error message; present iff failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Engagement counters, independent of generation state
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub share_count: u64,

    /// Chosen segments ordered by position
    #[serde(default)]
    pub segments: Vec<StorySegment>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,

    /// Completion timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    /// Failure timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<DateTime<Utc>>,
}

impl GeneratedStory {
    /// Create a story record in `processing` state with no segments yet.
    ///
    /// The record exists before any media work starts so a caller polling
    /// immediately sees an in-flight story.
    pub fn new(creator_id: impl Into<String>, request: &GenerationRequest) -> Self {
        let now = Utc::now();

        Self {
            id: StoryId::new(),
            template_id: request.template_id.clone(),
            creator_id: creator_id.into(),
            title: request.title.clone(),
            description: request.description.clone(),
            resolution: request.resolution,
            transition: request.transition,
            transition_duration: request.transition_duration,
            status: StoryStatus::Processing,
            storage_key: None,
            thumbnail_key: None,
            metadata: None,
            error_kind: None,
            error_message: None,
            view_count: 0,
            like_count: 0,
            share_count: 0,
            segments: Vec::new(),
            created_at: now,
            updated_at: now,
            completed_at: None,
            failed_at: None,
        }
    }

    /// Attach the materialized segment rows.
    pub fn with_segments(mut self, segments: Vec<StorySegment>) -> Self {
        self.segments = segments;
        self.updated_at = Utc::now();
        self
    }

    /// Transition to `completed` with the published keys and metadata.
    pub fn complete(
        mut self,
        storage_key: impl Into<String>,
        thumbnail_key: impl Into<String>,
        metadata: StoryMetadata,
    ) -> Self {
        self.status = StoryStatus::Completed;
        self.storage_key = Some(storage_key.into());
        self.thumbnail_key = Some(thumbnail_key.into());
        self.metadata = Some(metadata);
        self.error_kind = None;
        self.error_message = None;
        self.completed_at = Some(Utc::now());
        self.updated_at = Utc::now();
        self
    }

    /// Transition to `failed` with the triggering error recorded.
    ///
    /// Storage keys and metadata stay unset: a failed story never points
    /// at an artifact.
    pub fn fail(mut self, kind: impl Into<String>, message: impl Into<String>) -> Self {
        self.status = StoryStatus::Failed;
        self.storage_key = None;
        self.thumbnail_key = None;
        self.metadata = None;
        self.error_kind = Some(kind.into());
        self.error_message = Some(message.into());
        self.failed_at = Some(Utc::now());
        self.updated_at = Utc::now();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::TemplateId;

    fn request() -> GenerationRequest {
        GenerationRequest::new(TemplateId::new(), "Our Wedding")
    }

    #[test]
    fn test_new_story_is_processing() {
        let story = GeneratedStory::new("user1", &request());
        assert_eq!(story.status, StoryStatus::Processing);
        assert!(story.segments.is_empty());
        assert!(story.storage_key.is_none());
        assert!(story.metadata.is_none());
    }

    #[test]
    fn test_complete_sets_keys_and_metadata() {
        let story = GeneratedStory::new("user1", &request());
        let meta = StoryMetadata {
            duration: 42.0,
            width: 1920,
            height: 1080,
            fps: 30.0,
        };

        let done = story.complete("stories/x/story.mp4", "stories/x/thumb.jpg", meta.clone());
        assert_eq!(done.status, StoryStatus::Completed);
        assert!(done.status.is_terminal());
        assert_eq!(done.storage_key.as_deref(), Some("stories/x/story.mp4"));
        assert_eq!(done.metadata, Some(meta));
        assert!(done.error_kind.is_none());
        assert!(done.completed_at.is_some());
    }

    #[test]
    fn test_fail_leaves_keys_unset() {
        let story = GeneratedStory::new("user1", &request());
        let failed = story.fail("no_eligible_segment", "no segments for step intro");

        assert_eq!(failed.status, StoryStatus::Failed);
        assert!(failed.storage_key.is_none());
        assert!(failed.thumbnail_key.is_none());
        assert!(failed.metadata.is_none());
        assert_eq!(failed.error_kind.as_deref(), Some("no_eligible_segment"));
        assert!(failed.failed_at.is_some());
    }

    #[test]
    fn test_counters_survive_transitions() {
        let mut story = GeneratedStory::new("user1", &request());
        story.view_count = 7;
        let failed = story.fail("cancelled", "cancelled by caller");
        assert_eq!(failed.view_count, 7);
    }
}
