//! Template step sequencing.

use lstory_models::{Template, TemplateId, TemplateStep};

use crate::error::{EngineResult, GenerateError};
use crate::stores::TemplateStore;

/// Resolve a template that exists and is active.
pub async fn resolve_active_template(
    store: &dyn TemplateStore,
    id: &TemplateId,
) -> EngineResult<Template> {
    store
        .get_active_template(id)
        .await?
        .ok_or_else(|| GenerateError::TemplateNotFound(id.clone()))
}

/// A template's steps in generation order.
///
/// Ascending by `position`; positions are not guaranteed unique, so ties
/// break on step id to keep the ordering deterministic for identical
/// template state.
pub fn ordered_steps(template: &Template) -> Vec<TemplateStep> {
    let mut steps = template.steps.clone();
    steps.sort_by(|a, b| {
        a.position
            .cmp(&b.position)
            .then_with(|| a.id.as_str().cmp(b.id.as_str()))
    });
    steps
}
