//! Generation error taxonomy.

use thiserror::Error;

use lstory_media::MediaError;
use lstory_models::{StepId, StoryId, TemplateId};
use lstory_storage::StorageError;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, GenerateError>;

/// Errors that can occur across a generation run.
///
/// Request-validation errors surface synchronously to the caller before
/// any record exists; every other error only surfaces through the story's
/// terminal `failed` state and its recorded `error_kind`.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("Invalid generation request: {0}")]
    InvalidRequest(String),

    #[error("Template not found or inactive: {0}")]
    TemplateNotFound(TemplateId),

    #[error("Story not found: {0}")]
    StoryNotFound(StoryId),

    #[error("No eligible segment for step {step_id}")]
    NoEligibleSegment { step_id: StepId },

    #[error("Invalid trim range: {0}")]
    InvalidRange(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Composition failed: {0}")]
    Composition(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Generation cancelled")]
    Cancelled,

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GenerateError {
    /// Stable snake_case kind recorded on failed stories.
    pub fn kind(&self) -> &'static str {
        match self {
            GenerateError::InvalidRequest(_) => "invalid_request",
            GenerateError::TemplateNotFound(_) => "template_not_found",
            GenerateError::StoryNotFound(_) => "story_not_found",
            GenerateError::NoEligibleSegment { .. } => "no_eligible_segment",
            GenerateError::InvalidRange(_) => "invalid_range",
            GenerateError::InvalidParameter(_) => "invalid_parameter",
            GenerateError::Composition(_) => "composition",
            GenerateError::Storage(_) => "storage",
            GenerateError::Cancelled => "cancelled",
            GenerateError::Repository(_) => "repository",
            GenerateError::Internal(_) => "internal",
        }
    }

    /// Whether this error rejects the request before a record exists.
    pub fn is_request_validation(&self) -> bool {
        matches!(
            self,
            GenerateError::InvalidRequest(_) | GenerateError::TemplateNotFound(_)
        )
    }

    /// Create a repository error.
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }

    /// Create a composition error.
    pub fn composition(msg: impl Into<String>) -> Self {
        Self::Composition(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<MediaError> for GenerateError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::InvalidRange(msg) => GenerateError::InvalidRange(msg),
            MediaError::InvalidParameter(msg) => GenerateError::InvalidParameter(msg),
            MediaError::Cancelled => GenerateError::Cancelled,
            other => GenerateError::Composition(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for GenerateError {
    fn from(err: validator::ValidationErrors) -> Self {
        GenerateError::InvalidRequest(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_error_mapping() {
        let err: GenerateError = MediaError::InvalidRange("empty window".to_string()).into();
        assert_eq!(err.kind(), "invalid_range");

        let err: GenerateError = MediaError::InvalidParameter("volume".to_string()).into();
        assert_eq!(err.kind(), "invalid_parameter");

        let err: GenerateError = MediaError::Cancelled.into();
        assert_eq!(err.kind(), "cancelled");

        let err: GenerateError = MediaError::EmptyComposition.into();
        assert_eq!(err.kind(), "composition");
    }

    #[test]
    fn test_request_validation_classification() {
        assert!(GenerateError::TemplateNotFound(TemplateId::new()).is_request_validation());
        assert!(GenerateError::InvalidRequest("bad title".to_string()).is_request_validation());
        assert!(!GenerateError::Cancelled.is_request_validation());
        assert!(!GenerateError::NoEligibleSegment {
            step_id: StepId::new()
        }
        .is_request_validation());
    }
}
