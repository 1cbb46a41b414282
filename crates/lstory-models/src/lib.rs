//! Shared data models for the LoveStory backend.
//!
//! This crate provides Serde-serializable types for:
//! - Story templates and their ordered steps
//! - User-submitted video segments
//! - Generation requests and per-segment customization
//! - Generated stories and their lifecycle
//! - Output encoding configuration

pub mod encoding;
pub mod render;
pub mod request;
pub mod segment;
pub mod story;
pub mod template;

// Re-export common types
pub use encoding::EncodingConfig;
pub use render::{Customization, Resolution, TransitionKind};
pub use request::GenerationRequest;
pub use segment::{Segment, SegmentId, SegmentStatus};
pub use story::{GeneratedStory, StoryId, StoryMetadata, StorySegment, StoryStatus};
pub use template::{StepId, Template, TemplateId, TemplateStep};
