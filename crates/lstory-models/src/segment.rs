//! User-submitted video segments.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::template::StepId;

/// Unique identifier for a video segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct SegmentId(pub String);

impl SegmentId {
    /// Generate a new random segment ID.
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

impl Default for SegmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Segment ingest processing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum SegmentStatus {
    /// Upload received, probe/transcode pending
    #[default]
    Pending,
    /// Ingest completed, segment is usable
    Completed,
    /// Ingest failed
    Failed,
}

impl SegmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentStatus::Pending => "pending",
            SegmentStatus::Completed => "completed",
            SegmentStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for SegmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user-submitted video clip tied to one template step.
///
/// Segments are immutable once eligible: generation reads them, it never
/// mutates or consumes them, so one segment may appear in any number of
/// generated stories.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Segment {
    /// Unique segment ID
    pub id: SegmentId,

    /// Step this segment was submitted for
    pub step_id: StepId,

    /// Submitting user ID
    pub owner_id: String,

    /// Blob storage key of the uploaded clip
    pub storage_key: String,

    /// Clip duration in seconds (probed at ingest)
    pub duration: f64,

    /// Moderator approval flag
    #[serde(default)]
    pub is_approved: bool,

    /// Moderator notes attached at approval time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_notes: Option<String>,

    /// Ingest status
    #[serde(default)]
    pub status: SegmentStatus,

    /// Submission timestamp
    pub created_at: DateTime<Utc>,
}

impl Segment {
    /// Create a new segment pending approval.
    pub fn new(
        step_id: StepId,
        owner_id: impl Into<String>,
        storage_key: impl Into<String>,
        duration: f64,
    ) -> Self {
        Self {
            id: SegmentId::new(),
            step_id,
            owner_id: owner_id.into(),
            storage_key: storage_key.into(),
            duration,
            is_approved: false,
            approval_notes: None,
            status: SegmentStatus::Pending,
            created_at: Utc::now(),
        }
    }

    /// Mark ingest complete.
    pub fn complete(mut self) -> Self {
        self.status = SegmentStatus::Completed;
        self
    }

    /// Approve for use in generated stories.
    pub fn approve(mut self, notes: Option<String>) -> Self {
        self.is_approved = true;
        self.approval_notes = notes;
        self
    }

    /// Whether this segment can be selected for a story.
    pub fn is_eligible(&self) -> bool {
        self.is_approved && self.status == SegmentStatus::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_segment_not_eligible() {
        let seg = Segment::new(StepId::new(), "user1", "segments/abc.mp4", 12.0);
        assert!(!seg.is_eligible());
    }

    #[test]
    fn test_eligibility_requires_both_flags() {
        let seg = Segment::new(StepId::new(), "user1", "segments/abc.mp4", 12.0);

        let approved_only = seg.clone().approve(None);
        assert!(!approved_only.is_eligible());

        let completed_only = seg.clone().complete();
        assert!(!completed_only.is_eligible());

        let both = seg.complete().approve(Some("lgtm".to_string()));
        assert!(both.is_eligible());
    }
}
