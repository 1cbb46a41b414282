//! Story template and step definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a story template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct TemplateId(pub String);

impl TemplateId {
    /// Generate a new random template ID.
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

impl Default for TemplateId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a template step.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct StepId(pub String);

impl StepId {
    /// Generate a new random step ID.
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

impl Default for StepId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One ordered slot in a story template, to be filled by one segment.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TemplateStep {
    /// Unique step ID
    pub id: StepId,

    /// Owning template
    pub template_id: TemplateId,

    /// Position in the sequence. Positions are totally ordered but need
    /// not be contiguous; uniqueness is not guaranteed.
    pub position: i32,

    /// Step name (e.g. "ceremony")
    pub name: String,

    /// Step description shown to submitters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Preferred minimum segment duration in seconds (selection hint)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_min: Option<f64>,

    /// Preferred maximum segment duration in seconds (selection hint)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_max: Option<f64>,
}

impl TemplateStep {
    /// Create a new step with no duration hints.
    pub fn new(template_id: TemplateId, position: i32, name: impl Into<String>) -> Self {
        Self {
            id: StepId::new(),
            template_id,
            position,
            name: name.into(),
            description: None,
            duration_min: None,
            duration_max: None,
        }
    }

    /// Set duration hints.
    pub fn with_duration_hints(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.duration_min = min;
        self.duration_max = max;
        self
    }

    /// Whether a segment duration falls within this step's hints.
    ///
    /// Hints are advisory; a missing bound always matches.
    pub fn duration_hint_matches(&self, duration: f64) -> bool {
        if let Some(min) = self.duration_min {
            if duration < min {
                return false;
            }
        }
        if let Some(max) = self.duration_max {
            if duration > max {
                return false;
            }
        }
        true
    }
}

/// Ordered recipe of steps defining a story's structure.
///
/// A template is immutable for the duration of a generation run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Template {
    /// Unique template ID
    pub id: TemplateId,

    /// Template name (e.g. "Wedding")
    pub name: String,

    /// Template description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Inactive templates are hidden from generation
    #[serde(default = "default_active")]
    pub is_active: bool,

    /// Steps in declaration order (not necessarily sorted)
    #[serde(default)]
    pub steps: Vec<TemplateStep>,
}

fn default_active() -> bool {
    true
}

impl Template {
    /// Create a new active template with no steps.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: TemplateId::new(),
            name: name.into(),
            description: None,
            is_active: true,
            steps: Vec::new(),
        }
    }

    /// Append a step at the given position.
    pub fn with_step(mut self, position: i32, name: impl Into<String>) -> Self {
        let step = TemplateStep::new(self.id.clone(), position, name);
        self.steps.push(step);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_id_generation() {
        let id1 = TemplateId::new();
        let id2 = TemplateId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_duration_hint_matches() {
        let step = TemplateStep::new(TemplateId::new(), 1, "intro")
            .with_duration_hints(Some(5.0), Some(30.0));

        assert!(step.duration_hint_matches(10.0));
        assert!(step.duration_hint_matches(5.0));
        assert!(!step.duration_hint_matches(4.9));
        assert!(!step.duration_hint_matches(31.0));
    }

    #[test]
    fn test_duration_hint_open_bounds() {
        let step = TemplateStep::new(TemplateId::new(), 1, "intro");
        assert!(step.duration_hint_matches(0.1));
        assert!(step.duration_hint_matches(3600.0));
    }

    #[test]
    fn test_template_builder() {
        let template = Template::new("Wedding")
            .with_step(1, "intro")
            .with_step(2, "ceremony");

        assert!(template.is_active);
        assert_eq!(template.steps.len(), 2);
        assert_eq!(template.steps[0].template_id, template.id);
    }
}
