//! Structured generation logging.

use tracing::{error, info, warn, Span};

use lstory_models::StoryId;

/// Logger carrying story context through a generation run.
#[derive(Debug, Clone)]
pub struct GenerationLogger {
    story_id: String,
    operation: String,
}

impl GenerationLogger {
    /// Create a logger for one story and operation.
    pub fn new(story_id: &StoryId, operation: &str) -> Self {
        Self {
            story_id: story_id.to_string(),
            operation: operation.to_string(),
        }
    }

    /// Log the start of a run.
    pub fn log_start(&self, message: &str) {
        info!(
            story_id = %self.story_id,
            operation = %self.operation,
            "Generation started: {}", message
        );
    }

    /// Log a stage boundary.
    pub fn log_progress(&self, message: &str) {
        info!(
            story_id = %self.story_id,
            operation = %self.operation,
            "Generation progress: {}", message
        );
    }

    /// Log a degraded-but-continuing condition.
    pub fn log_warning(&self, message: &str) {
        warn!(
            story_id = %self.story_id,
            operation = %self.operation,
            "Generation warning: {}", message
        );
    }

    /// Log a run failure.
    pub fn log_error(&self, message: &str) {
        error!(
            story_id = %self.story_id,
            operation = %self.operation,
            "Generation error: {}", message
        );
    }

    /// Log a successful completion.
    pub fn log_completion(&self, message: &str) {
        info!(
            story_id = %self.story_id,
            operation = %self.operation,
            "Generation completed: {}", message
        );
    }

    /// Create a tracing span for this run.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "generation",
            story_id = %self.story_id,
            operation = %self.operation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_creation() {
        let id = StoryId::new();
        let logger = GenerationLogger::new(&id, "story_generation");
        assert_eq!(logger.story_id, id.to_string());
        assert_eq!(logger.operation, "story_generation");
    }
}
