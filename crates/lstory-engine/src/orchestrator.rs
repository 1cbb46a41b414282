//! Generation orchestration.
//!
//! One `StoryGenerator` serves all generation requests. Each accepted
//! request becomes an independent run driving selection, customization,
//! composition, and publishing; the run reports its outcome only through
//! the story record's terminal state. Runs for different stories share no
//! mutable state beyond the read-only segment pool.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use rand::rngs::StdRng;
use tokio::sync::{watch, Mutex, Semaphore};
use tracing::{error, warn};
use validator::Validate;

use lstory_media::Clip;
use lstory_models::{
    Customization, GeneratedStory, GenerationRequest, Segment, StoryId, StoryMetadata,
    StorySegment, Template, TemplateStep,
};
use lstory_storage::BlobStore;

use crate::config::EngineConfig;
use crate::error::{EngineResult, GenerateError};
use crate::logging::GenerationLogger;
use crate::pipeline::{FfmpegPipeline, MediaPipeline};
use crate::publisher::AssetPublisher;
use crate::selector::SegmentSelector;
use crate::sequencer;
use crate::stores::{CounterKind, Page, SegmentStore, StoryFilter, StoryRepository, TemplateStore};

/// The generation state machine and the persistence boundary it exposes.
#[derive(Clone)]
pub struct StoryGenerator {
    config: EngineConfig,
    templates: Arc<dyn TemplateStore>,
    stories: Arc<dyn StoryRepository>,
    blobs: Arc<dyn BlobStore>,
    media: Arc<dyn MediaPipeline>,
    selector: Arc<SegmentSelector>,
    publisher: AssetPublisher,
    active_runs: Arc<Mutex<HashMap<StoryId, watch::Sender<bool>>>>,
}

impl StoryGenerator {
    /// Create a generator with an OS-seeded segment selector.
    pub fn new(
        config: EngineConfig,
        templates: Arc<dyn TemplateStore>,
        segments: Arc<dyn SegmentStore>,
        stories: Arc<dyn StoryRepository>,
        blobs: Arc<dyn BlobStore>,
        media: Arc<dyn MediaPipeline>,
    ) -> Self {
        let selector = SegmentSelector::new(segments);
        Self::build(config, templates, stories, blobs, media, selector)
    }

    /// Create a generator backed by the FFmpeg media pipeline.
    pub fn with_ffmpeg(
        config: EngineConfig,
        templates: Arc<dyn TemplateStore>,
        segments: Arc<dyn SegmentStore>,
        stories: Arc<dyn StoryRepository>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        let media = Arc::new(FfmpegPipeline::new(
            lstory_models::EncodingConfig::default(),
            config.ffmpeg_timeout,
        ));
        Self::new(config, templates, segments, stories, blobs, media)
    }

    /// Create a generator with an explicit random source for selection.
    pub fn with_rng(
        config: EngineConfig,
        templates: Arc<dyn TemplateStore>,
        segments: Arc<dyn SegmentStore>,
        stories: Arc<dyn StoryRepository>,
        blobs: Arc<dyn BlobStore>,
        media: Arc<dyn MediaPipeline>,
        rng: StdRng,
    ) -> Self {
        let selector = SegmentSelector::with_rng(segments, rng);
        Self::build(config, templates, stories, blobs, media, selector)
    }

    fn build(
        config: EngineConfig,
        templates: Arc<dyn TemplateStore>,
        stories: Arc<dyn StoryRepository>,
        blobs: Arc<dyn BlobStore>,
        media: Arc<dyn MediaPipeline>,
        selector: SegmentSelector,
    ) -> Self {
        let selector = selector.exclude_requester(config.exclude_requester_segments);
        let publisher = AssetPublisher::new(blobs.clone());

        Self {
            config,
            templates,
            stories,
            blobs,
            media,
            selector: Arc::new(selector),
            publisher,
            active_runs: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Accept a generation request and start the run in the background.
    ///
    /// Request validation (bad input, missing/inactive template) fails
    /// synchronously and creates no record. On success the returned story
    /// is already persisted in `processing`; the caller observes the
    /// outcome by polling [`StoryGenerator::get_generation`].
    pub async fn create_generation(
        &self,
        creator_id: &str,
        request: GenerationRequest,
    ) -> EngineResult<GeneratedStory> {
        let (story, template, cancel_rx) = self.admit(creator_id, request).await?;

        let this = self.clone();
        let spawned = story.clone();
        tokio::spawn(async move {
            this.drive_run(spawned, template, cancel_rx).await;
        });

        Ok(story)
    }

    /// Accept a generation request and wait for its terminal record.
    ///
    /// Same pipeline as [`StoryGenerator::create_generation`]; run-time
    /// failures still land in the record rather than the `Err` channel.
    pub async fn generate_and_wait(
        &self,
        creator_id: &str,
        request: GenerationRequest,
    ) -> EngineResult<GeneratedStory> {
        let (story, template, cancel_rx) = self.admit(creator_id, request).await?;
        self.drive_run(story.clone(), template, cancel_rx).await;
        self.get_generation(&story.id).await
    }

    /// Validate the request, persist the in-flight record, and register
    /// the run's cancellation channel.
    async fn admit(
        &self,
        creator_id: &str,
        request: GenerationRequest,
    ) -> EngineResult<(GeneratedStory, Template, watch::Receiver<bool>)> {
        request.validate()?;
        let template =
            sequencer::resolve_active_template(self.templates.as_ref(), &request.template_id)
                .await?;

        let story = GeneratedStory::new(creator_id, &request);
        self.stories.insert(story.clone()).await?;

        let (cancel_tx, cancel_rx) = watch::channel(false);
        self.active_runs
            .lock()
            .await
            .insert(story.id.clone(), cancel_tx);

        Ok((story, template, cancel_rx))
    }

    /// Signal cancellation of an in-flight run.
    ///
    /// Returns false when no run for the story is active (already
    /// terminal or unknown).
    pub async fn cancel_generation(&self, id: &StoryId) -> bool {
        match self.active_runs.lock().await.get(id) {
            Some(tx) => tx.send(true).is_ok(),
            None => false,
        }
    }

    /// Fetch a story. Pure read: no counters move.
    pub async fn get_generation(&self, id: &StoryId) -> EngineResult<GeneratedStory> {
        self.stories
            .get(id)
            .await?
            .ok_or_else(|| GenerateError::StoryNotFound(id.clone()))
    }

    /// List stories newest-first.
    pub async fn list_generations(
        &self,
        filter: &StoryFilter,
        page: &Page,
    ) -> EngineResult<(Vec<GeneratedStory>, usize)> {
        self.stories.list(filter, page).await
    }

    /// Record a view. Counters are the only mutation allowed on terminal
    /// stories and are explicitly separate from reads.
    pub async fn record_view(&self, id: &StoryId) -> EngineResult<u64> {
        self.stories.increment_counter(id, CounterKind::Views).await
    }

    /// Record a like.
    pub async fn record_like(&self, id: &StoryId) -> EngineResult<u64> {
        self.stories.increment_counter(id, CounterKind::Likes).await
    }

    /// Record a share.
    pub async fn record_share(&self, id: &StoryId) -> EngineResult<u64> {
        self.stories
            .increment_counter(id, CounterKind::Shares)
            .await
    }

    /// Delete a story and everything published for it.
    pub async fn delete_generation(&self, id: &StoryId) -> EngineResult<()> {
        // Fail on unknown ids before touching storage
        self.get_generation(id).await?;

        self.publisher.unpublish(id).await?;
        self.stories.delete(id).await?;
        Ok(())
    }

    /// Run one generation to its terminal state.
    ///
    /// Every failure after admission ends here: record the error on the
    /// story, remove anything already published, and never propagate.
    async fn drive_run(
        &self,
        story: GeneratedStory,
        template: Template,
        cancel: watch::Receiver<bool>,
    ) {
        let story_id = story.id.clone();
        let logger = GenerationLogger::new(&story_id, "story_generation");

        let result = self.execute(&story, &template, &logger, cancel).await;

        match result {
            Ok((storage_key, thumbnail_key, metadata)) => {
                metrics::counter!("story_generation_completed_total").increment(1);
                logger.log_completion(&format!(
                    "{:.1}s at {}x{}",
                    metadata.duration, metadata.width, metadata.height
                ));
                if let Err(e) = self
                    .stories
                    .mark_completed(&story_id, storage_key, thumbnail_key, metadata)
                    .await
                {
                    error!(story_id = %story_id, "Failed to persist completed story: {}", e);
                }
            }
            Err(err) => {
                metrics::counter!("story_generation_failed_total", "kind" => err.kind())
                    .increment(1);
                logger.log_error(&err.to_string());

                // Cleanup runs first so a failed story never leaves
                // artifacts; its failure is logged, never masks `err`.
                if let Err(cleanup_err) = self.publisher.unpublish(&story_id).await {
                    logger.log_warning(&format!(
                        "Cleanup after failure did not finish: {}",
                        cleanup_err
                    ));
                }

                if let Err(e) = self
                    .stories
                    .mark_failed(&story_id, err.kind(), &err.to_string())
                    .await
                {
                    error!(story_id = %story_id, "Failed to persist failed story: {}", e);
                }
            }
        }

        self.active_runs.lock().await.remove(&story_id);
    }

    /// The pipeline proper: select, materialize, prepare, compose,
    /// publish. Returns the published keys and probed metadata.
    async fn execute(
        &self,
        story: &GeneratedStory,
        template: &Template,
        logger: &GenerationLogger,
        cancel: watch::Receiver<bool>,
    ) -> EngineResult<(String, String, StoryMetadata)> {
        let steps = sequencer::ordered_steps(template);
        logger.log_start(&format!(
            "template '{}' with {} steps",
            template.name,
            steps.len()
        ));

        // Stage 1: one segment per step, in order
        let mut selections: Vec<(TemplateStep, Segment)> = Vec::with_capacity(steps.len());
        for step in steps {
            ensure_not_cancelled(&cancel)?;
            let segment = self.selector.select(&step, &story.creator_id).await?;
            selections.push((step, segment));
        }

        // Stage 2: materialize the segment rows before any media work so
        // the selection stays auditable even if composition fails later
        let customization =
            Customization::with_transition(story.transition, story.transition_duration);
        let rows: Vec<StorySegment> = selections
            .iter()
            .map(|(step, segment)| StorySegment {
                story_id: story.id.clone(),
                step_id: step.id.clone(),
                segment_id: segment.id.clone(),
                position: step.position,
                customization: customization.clone(),
            })
            .collect();
        self.stories.set_segments(&story.id, rows).await?;
        logger.log_progress(&format!("{} segments selected", selections.len()));

        // Stage 3: per-segment prepare, fanned out under a bounded pool.
        // Scratch space is per-run and released on every exit path.
        tokio::fs::create_dir_all(&self.config.work_dir)
            .await
            .map_err(|e| GenerateError::internal(format!("scratch dir: {}", e)))?;
        let workdir = tempfile::Builder::new()
            .prefix("run-")
            .tempdir_in(&self.config.work_dir)
            .map_err(|e| GenerateError::internal(format!("scratch dir: {}", e)))?;

        let target_height = story.resolution.height();
        let semaphore = Arc::new(Semaphore::new(self.config.max_prepare_parallel.max(1)));
        let mut handles = Vec::with_capacity(selections.len());

        for (index, (_, segment)) in selections.iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let blobs = Arc::clone(&self.blobs);
            let media = Arc::clone(&self.media);
            let segment = segment.clone();
            let customization = customization.clone();
            let dir = workdir.path().to_path_buf();
            let cancel = cancel.clone();

            handles.push(tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| GenerateError::internal("prepare pool closed"))?;
                prepare_clip(
                    blobs,
                    media,
                    dir,
                    index,
                    segment,
                    customization,
                    target_height,
                    cancel,
                )
                .await
            }));
        }

        // Fan-in: join every task in step order before composing, so no
        // task outlives the scratch dir even when one of them fails
        let mut clips: Vec<Clip> = Vec::with_capacity(handles.len());
        let mut first_err: Option<GenerateError> = None;
        for handle in handles {
            match handle.await {
                Ok(Ok(clip)) => {
                    if first_err.is_none() {
                        clips.push(clip);
                    }
                }
                Ok(Err(e)) => {
                    if first_err.is_none() {
                        first_err = Some(e);
                    }
                }
                Err(join_err) => {
                    if first_err.is_none() {
                        first_err = Some(GenerateError::internal(format!(
                            "clip preparation task failed: {}",
                            join_err
                        )));
                    }
                }
            }
        }
        if let Some(err) = first_err {
            return Err(err);
        }
        logger.log_progress(&format!("{} clips prepared", clips.len()));

        // Stage 4: strictly sequential composition in step order
        ensure_not_cancelled(&cancel)?;
        let asset_path = workdir.path().join("story.mp4");
        let composed = self
            .media
            .compose(&clips, &asset_path, story.resolution, cancel.clone())
            .await?;

        let thumbnail_path = workdir.path().join("thumb.jpg");
        self.media.thumbnail(&composed, &thumbnail_path).await?;

        // Stage 5: publish both artifacts or none
        ensure_not_cancelled(&cancel)?;
        let (storage_key, thumbnail_key) = self
            .publisher
            .publish(&story.id, &composed.path, &thumbnail_path)
            .await?;

        let metadata = StoryMetadata {
            duration: composed.info.duration,
            width: composed.info.width,
            height: composed.info.height,
            fps: composed.info.fps,
        };

        Ok((storage_key, thumbnail_key, metadata))
    }
}

/// Download one segment and render its customized clip.
#[allow(clippy::too_many_arguments)]
async fn prepare_clip(
    blobs: Arc<dyn BlobStore>,
    media: Arc<dyn MediaPipeline>,
    dir: PathBuf,
    index: usize,
    segment: Segment,
    customization: Customization,
    target_height: u32,
    cancel: watch::Receiver<bool>,
) -> EngineResult<Clip> {
    ensure_not_cancelled(&cancel)?;

    let raw_path = dir.join(format!("segment_{:03}_raw.mp4", index));
    blobs.download_file(&segment.storage_key, &raw_path).await?;

    let clip = media.load_clip(&raw_path).await?;

    let out_path = dir.join(format!("segment_{:03}.mp4", index));
    media
        .customize(&clip, &out_path, &customization, target_height, cancel)
        .await
}

fn ensure_not_cancelled(cancel: &watch::Receiver<bool>) -> EngineResult<()> {
    if *cancel.borrow() {
        warn!("Generation run observed cancellation signal");
        Err(GenerateError::Cancelled)
    } else {
        Ok(())
    }
}
