//! FFmpeg CLI wrapper for story composition.
//!
//! This crate drives the external `ffmpeg`/`ffprobe` binaries to:
//! - probe clip metadata
//! - apply per-segment customization (trim, scale, volume, fade)
//! - concatenate customized clips into one asset in a fixed order
//! - extract thumbnails
//!
//! Filter and argument construction is pure and unit-testable; only the
//! `run` entry points touch the process table.

pub mod clip;
pub mod command;
pub mod compose;
pub mod customize;
pub mod error;
pub mod probe;
pub mod thumbnail;

pub use clip::Clip;
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use compose::{build_concat_filter, compose_clips};
pub use customize::{customize_clip, CustomizePlan};
pub use error::{MediaError, MediaResult};
pub use probe::{probe_video, VideoInfo};
pub use thumbnail::generate_thumbnail;
