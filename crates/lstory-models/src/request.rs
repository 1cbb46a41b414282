//! Story generation request schema.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::render::{Resolution, TransitionKind};
use crate::template::TemplateId;

/// A request to generate a story from a template.
///
/// Transient input: nothing of the request is persisted beyond what lands
/// on the resulting `GeneratedStory`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
pub struct GenerationRequest {
    /// Template to generate from
    pub template_id: TemplateId,

    /// Display title for the generated story
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    /// Optional description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Target output resolution
    #[serde(default)]
    pub resolution: Resolution,

    /// Transition applied at segment boundaries
    #[serde(default)]
    pub transition: TransitionKind,

    /// Transition duration in seconds
    #[serde(default = "default_transition_duration")]
    #[validate(range(min = 0.0, max = 10.0))]
    pub transition_duration: f64,
}

fn default_transition_duration() -> f64 {
    1.0
}

impl GenerationRequest {
    /// Create a request with default render settings (1080p, 1s fade).
    pub fn new(template_id: TemplateId, title: impl Into<String>) -> Self {
        Self {
            template_id,
            title: title.into(),
            description: None,
            resolution: Resolution::default(),
            transition: TransitionKind::default(),
            transition_duration: default_transition_duration(),
        }
    }
}
