//! Media pipeline seam.
//!
//! The orchestrator drives customization and composition through this
//! trait so the generation flow can be exercised without FFmpeg; the
//! production implementation delegates to `lstory-media`.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use lstory_media::{compose_clips, customize_clip, generate_thumbnail, Clip, FfmpegRunner};
use lstory_models::{Customization, EncodingConfig, Resolution};

use crate::error::EngineResult;

/// Media operations one generation run needs.
#[async_trait]
pub trait MediaPipeline: Send + Sync {
    /// Probe a downloaded file into a clip handle.
    async fn load_clip(&self, path: &Path) -> EngineResult<Clip>;

    /// Render a customized derived clip.
    async fn customize(
        &self,
        clip: &Clip,
        output: &Path,
        custom: &Customization,
        target_height: u32,
        cancel: watch::Receiver<bool>,
    ) -> EngineResult<Clip>;

    /// Concatenate customized clips in order into one asset.
    async fn compose(
        &self,
        clips: &[Clip],
        output: &Path,
        resolution: Resolution,
        cancel: watch::Receiver<bool>,
    ) -> EngineResult<Clip>;

    /// Extract a thumbnail from the composed asset.
    async fn thumbnail(&self, clip: &Clip, output: &Path) -> EngineResult<()>;
}

/// FFmpeg-backed media pipeline.
pub struct FfmpegPipeline {
    encoding: EncodingConfig,
    timeout: Duration,
}

impl FfmpegPipeline {
    /// Create a pipeline with the given final-pass encoding settings.
    pub fn new(encoding: EncodingConfig, timeout: Duration) -> Self {
        Self { encoding, timeout }
    }

    fn runner(&self, cancel: watch::Receiver<bool>) -> FfmpegRunner {
        FfmpegRunner::new()
            .with_cancel(cancel)
            .with_timeout(self.timeout.as_secs())
    }
}

impl Default for FfmpegPipeline {
    fn default() -> Self {
        Self::new(EncodingConfig::default(), Duration::from_secs(600))
    }
}

#[async_trait]
impl MediaPipeline for FfmpegPipeline {
    async fn load_clip(&self, path: &Path) -> EngineResult<Clip> {
        Ok(Clip::probe(path).await?)
    }

    async fn customize(
        &self,
        clip: &Clip,
        output: &Path,
        custom: &Customization,
        target_height: u32,
        cancel: watch::Receiver<bool>,
    ) -> EngineResult<Clip> {
        let runner = self.runner(cancel);
        Ok(customize_clip(
            clip,
            output,
            custom,
            target_height,
            &EncodingConfig::for_customization(),
            &runner,
        )
        .await?)
    }

    async fn compose(
        &self,
        clips: &[Clip],
        output: &Path,
        resolution: Resolution,
        cancel: watch::Receiver<bool>,
    ) -> EngineResult<Clip> {
        let runner = self.runner(cancel);
        Ok(compose_clips(
            clips,
            output,
            resolution.width(),
            resolution.height(),
            &self.encoding,
            &runner,
        )
        .await?)
    }

    async fn thumbnail(&self, clip: &Clip, output: &Path) -> EngineResult<()> {
        Ok(generate_thumbnail(&clip.path, output).await?)
    }
}
