//! In-flight clip handle.

use std::path::{Path, PathBuf};

use crate::error::MediaResult;
use crate::probe::{probe_video, VideoInfo};

/// A decoded-on-disk clip: local file path plus probed metadata.
///
/// Clip handles are cheap value objects; derived clips (customized,
/// composed) get fresh handles with re-probed metadata rather than
/// mutating their source.
#[derive(Debug, Clone)]
pub struct Clip {
    /// Local file path
    pub path: PathBuf,
    /// Probed stream info
    pub info: VideoInfo,
}

impl Clip {
    /// Create a handle from already-known metadata.
    pub fn new(path: impl Into<PathBuf>, info: VideoInfo) -> Self {
        Self {
            path: path.into(),
            info,
        }
    }

    /// Probe a local file and wrap it in a handle.
    pub async fn probe(path: impl AsRef<Path>) -> MediaResult<Self> {
        let path = path.as_ref();
        let info = probe_video(path).await?;
        Ok(Self {
            path: path.to_path_buf(),
            info,
        })
    }

    /// Clip duration in seconds.
    pub fn duration(&self) -> f64 {
        self.info.duration
    }
}
