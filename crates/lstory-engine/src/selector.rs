//! Random segment selection.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::Mutex;
use tracing::debug;

use lstory_models::{Segment, TemplateStep};

use crate::error::{EngineResult, GenerateError};
use crate::stores::SegmentStore;

/// Picks one eligible segment per step, uniformly at random.
///
/// The random source is injected so tests can fix the draw; production
/// constructors seed from the OS. No global random state is touched.
pub struct SegmentSelector {
    store: Arc<dyn SegmentStore>,
    rng: Mutex<StdRng>,
    exclude_requester: bool,
}

impl SegmentSelector {
    /// Create a selector with an OS-seeded random source.
    pub fn new(store: Arc<dyn SegmentStore>) -> Self {
        Self::with_rng(store, StdRng::from_os_rng())
    }

    /// Create a selector with an explicit random source.
    pub fn with_rng(store: Arc<dyn SegmentStore>, rng: StdRng) -> Self {
        Self {
            store,
            rng: Mutex::new(rng),
            exclude_requester: true,
        }
    }

    /// Configure whether the requester's own segments are excluded.
    pub fn exclude_requester(mut self, exclude: bool) -> Self {
        self.exclude_requester = exclude;
        self
    }

    /// Select a segment for one step.
    ///
    /// The requester's own segments are excluded first so a story is not
    /// assembled purely from its requester's uploads; if that exclusion
    /// empties the pool, it is dropped and the full eligible pool is
    /// retried once before failing. Step duration bounds act as a
    /// preference: the pool narrows to in-bounds segments only when at
    /// least one exists.
    pub async fn select(&self, step: &TemplateStep, requester: &str) -> EngineResult<Segment> {
        let exclusions: Vec<String> = if self.exclude_requester {
            vec![requester.to_string()]
        } else {
            Vec::new()
        };

        let mut pool = self.store.query_eligible(&step.id, &exclusions).await?;

        if pool.is_empty() && !exclusions.is_empty() {
            debug!(
                step_id = %step.id,
                "Self-exclusion emptied the pool, retrying without exclusions"
            );
            pool = self.store.query_eligible(&step.id, &[]).await?;
        }

        if pool.is_empty() {
            return Err(GenerateError::NoEligibleSegment {
                step_id: step.id.clone(),
            });
        }

        let hinted: Vec<&Segment> = pool
            .iter()
            .filter(|s| step.duration_hint_matches(s.duration))
            .collect();
        let candidates: Vec<&Segment> = if hinted.is_empty() {
            pool.iter().collect()
        } else {
            hinted
        };

        let idx = self.rng.lock().await.random_range(0..candidates.len());
        Ok(candidates[idx].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemorySegmentStore;
    use lstory_models::{StepId, TemplateId};

    fn eligible(step: &StepId, owner: &str, duration: f64) -> Segment {
        Segment::new(step.clone(), owner, format!("segments/{}.mp4", owner), duration)
            .complete()
            .approve(None)
    }

    fn step(id: &StepId) -> TemplateStep {
        let mut step = TemplateStep::new(TemplateId::new(), 1, "intro");
        step.id = id.clone();
        step
    }

    async fn store_with(segments: Vec<Segment>) -> Arc<MemorySegmentStore> {
        let store = Arc::new(MemorySegmentStore::new());
        for segment in segments {
            store.insert(segment).await;
        }
        store
    }

    #[tokio::test]
    async fn test_seeded_selection_is_deterministic() {
        let step_id = StepId::new();
        let segments: Vec<Segment> = (0..10)
            .map(|i| eligible(&step_id, &format!("user{}", i), 5.0))
            .collect();
        let store = store_with(segments).await;

        let mut picks = Vec::new();
        for _ in 0..2 {
            let selector =
                SegmentSelector::with_rng(store.clone(), StdRng::seed_from_u64(42));
            let mut run = Vec::new();
            for _ in 0..5 {
                run.push(selector.select(&step(&step_id), "someone").await.unwrap().id);
            }
            picks.push(run);
        }

        assert_eq!(picks[0], picks[1]);
    }

    #[tokio::test]
    async fn test_requester_excluded_when_others_exist() {
        let step_id = StepId::new();
        let store = store_with(vec![
            eligible(&step_id, "requester", 5.0),
            eligible(&step_id, "other", 5.0),
        ])
        .await;

        let selector = SegmentSelector::with_rng(store, StdRng::seed_from_u64(1));
        for _ in 0..10 {
            let pick = selector.select(&step(&step_id), "requester").await.unwrap();
            assert_eq!(pick.owner_id, "other");
        }
    }

    #[tokio::test]
    async fn test_self_exclusion_falls_back_to_full_pool() {
        let step_id = StepId::new();
        let store = store_with(vec![eligible(&step_id, "requester", 5.0)]).await;

        let selector = SegmentSelector::with_rng(store, StdRng::seed_from_u64(1));
        let pick = selector.select(&step(&step_id), "requester").await.unwrap();
        assert_eq!(pick.owner_id, "requester");
    }

    #[tokio::test]
    async fn test_empty_pool_is_no_eligible_segment() {
        let step_id = StepId::new();
        let store = store_with(vec![]).await;

        let selector = SegmentSelector::with_rng(store, StdRng::seed_from_u64(1));
        let err = selector.select(&step(&step_id), "requester").await.unwrap_err();
        assert!(matches!(err, GenerateError::NoEligibleSegment { .. }));
    }

    #[tokio::test]
    async fn test_duration_hints_prefer_in_bounds() {
        let step_id = StepId::new();
        let store = store_with(vec![
            eligible(&step_id, "short", 2.0),
            eligible(&step_id, "fits", 10.0),
        ])
        .await;

        let mut hinted_step = step(&step_id);
        hinted_step.duration_min = Some(5.0);
        hinted_step.duration_max = Some(20.0);

        let selector = SegmentSelector::with_rng(store, StdRng::seed_from_u64(1));
        for _ in 0..10 {
            let pick = selector.select(&hinted_step, "someone").await.unwrap();
            assert_eq!(pick.owner_id, "fits");
        }
    }

    #[tokio::test]
    async fn test_duration_hints_never_empty_the_pool() {
        let step_id = StepId::new();
        let store = store_with(vec![eligible(&step_id, "short", 2.0)]).await;

        let mut hinted_step = step(&step_id);
        hinted_step.duration_min = Some(5.0);

        let selector = SegmentSelector::with_rng(store, StdRng::seed_from_u64(1));
        // Nothing satisfies the hint, so it is ignored rather than fatal
        let pick = selector.select(&hinted_step, "someone").await.unwrap();
        assert_eq!(pick.owner_id, "short");
    }
}
