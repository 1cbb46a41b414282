//! Per-segment customization: trim, scale, volume, transitions.

use std::path::Path;
use tracing::info;

use lstory_models::{Customization, EncodingConfig, TransitionKind};

use crate::clip::Clip;
use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::VideoInfo;

/// A validated render plan for one clip.
///
/// Building the plan is pure: all validation, clamping, and filter
/// construction happens here, so it can be tested without FFmpeg.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomizePlan {
    /// Clamped trim window `[start, end)` in source seconds, if any
    pub trim: Option<(f64, f64)>,
    /// Expected duration of the derived clip
    pub output_duration: f64,
    /// Video filter chain entries
    pub video_filters: Vec<String>,
    /// Audio filter chain entries
    pub audio_filters: Vec<String>,
}

impl CustomizePlan {
    /// Build a plan from a customization record and probed clip info.
    ///
    /// - Trim applies only when both bounds are given; bounds are clamped
    ///   to the clip duration and an inverted window is `InvalidRange`.
    /// - The clip is scaled to `target_height` (aspect preserved) only
    ///   when its native height differs.
    /// - Volume must be finite and > 0; 1.0 emits no filter.
    /// - `Fade` ramps video opacity and audio volume at both ends, with
    ///   the ramp clamped to half the derived clip's duration. Other
    ///   transition kinds emit nothing: unknown effects degrade to a hard
    ///   cut rather than failing the run.
    pub fn build(
        custom: &Customization,
        info: &VideoInfo,
        target_height: u32,
    ) -> MediaResult<Self> {
        if !custom.volume.is_finite() || custom.volume <= 0.0 {
            return Err(MediaError::invalid_parameter(format!(
                "volume multiplier must be > 0, got {}",
                custom.volume
            )));
        }
        if !custom.transition_duration.is_finite() || custom.transition_duration < 0.0 {
            return Err(MediaError::invalid_parameter(format!(
                "transition duration must be >= 0, got {}",
                custom.transition_duration
            )));
        }

        let trim = match (custom.trim_start, custom.trim_end) {
            (Some(start), Some(end)) => {
                let start = start.clamp(0.0, info.duration);
                let end = end.clamp(0.0, info.duration);
                if start >= end {
                    return Err(MediaError::invalid_range(format!(
                        "trim window [{:.3}, {:.3}) is empty after clamping to {:.3}s",
                        start, end, info.duration
                    )));
                }
                Some((start, end))
            }
            _ => None,
        };

        let output_duration = trim.map(|(s, e)| e - s).unwrap_or(info.duration);

        let mut video_filters = Vec::new();
        let mut audio_filters = Vec::new();

        if info.height != target_height {
            video_filters.push(format!("scale=-2:{}", target_height));
        }

        if (custom.volume - 1.0).abs() > f64::EPSILON {
            audio_filters.push(format!("volume={:.3}", custom.volume));
        }

        if custom.transition == TransitionKind::Fade && custom.transition_duration > 0.0 {
            let ramp = custom.transition_duration.min(output_duration / 2.0);
            let out_start = (output_duration - ramp).max(0.0);
            video_filters.push(format!("fade=t=in:st=0:d={:.3}", ramp));
            video_filters.push(format!("fade=t=out:st={:.3}:d={:.3}", out_start, ramp));
            audio_filters.push(format!("afade=t=in:st=0:d={:.3}", ramp));
            audio_filters.push(format!("afade=t=out:st={:.3}:d={:.3}", out_start, ramp));
        }

        Ok(Self {
            trim,
            output_duration,
            video_filters,
            audio_filters,
        })
    }

    /// Whether the plan changes nothing about the clip.
    pub fn is_passthrough(&self) -> bool {
        self.trim.is_none() && self.video_filters.is_empty() && self.audio_filters.is_empty()
    }
}

/// Render a customized copy of `input` to `output`.
///
/// The source file is read-only; the derived clip is re-probed so later
/// stages see real durations, not planned ones. Cancellation and timeout
/// come configured on the runner.
pub async fn customize_clip(
    input: &Clip,
    output: impl AsRef<Path>,
    custom: &Customization,
    target_height: u32,
    encoding: &EncodingConfig,
    runner: &FfmpegRunner,
) -> MediaResult<Clip> {
    let output = output.as_ref();
    let plan = CustomizePlan::build(custom, &input.info, target_height)?;

    info!(
        "Customizing clip: {} -> {} (trim: {:?}, filters: {}v/{}a)",
        input.path.display(),
        output.display(),
        plan.trim,
        plan.video_filters.len(),
        plan.audio_filters.len()
    );

    let mut cmd = FfmpegCommand::new(&input.path, output);

    if let Some((start, end)) = plan.trim {
        cmd = cmd.seek(start).duration(end - start);
    }
    if !plan.video_filters.is_empty() {
        cmd = cmd.video_filter(plan.video_filters.join(","));
    }
    if !plan.audio_filters.is_empty() {
        cmd = cmd.audio_filter(plan.audio_filters.join(","));
    }
    cmd = cmd.output_args(encoding.to_ffmpeg_args());

    runner.run(&cmd).await?;

    Clip::probe(output).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(duration: f64, height: u32) -> VideoInfo {
        VideoInfo {
            duration,
            width: height * 16 / 9,
            height,
            fps: 30.0,
        }
    }

    fn fade(duration: f64) -> Customization {
        Customization::with_transition(TransitionKind::Fade, duration)
    }

    #[test]
    fn test_trim_clamped_to_clip_duration() {
        let custom = Customization {
            trim_start: Some(2.0),
            trim_end: Some(100.0),
            ..fade(0.0)
        };
        let plan = CustomizePlan::build(&custom, &info(10.0, 1080), 1080).unwrap();
        assert_eq!(plan.trim, Some((2.0, 10.0)));
        assert!((plan.output_duration - 8.0).abs() < 0.001);
    }

    #[test]
    fn test_inverted_trim_rejected() {
        let custom = Customization {
            trim_start: Some(8.0),
            trim_end: Some(3.0),
            ..fade(0.0)
        };
        let err = CustomizePlan::build(&custom, &info(10.0, 1080), 1080).unwrap_err();
        assert!(matches!(err, MediaError::InvalidRange(_)));
    }

    #[test]
    fn test_trim_ignored_when_one_bound_missing() {
        let custom = Customization {
            trim_start: Some(2.0),
            trim_end: None,
            ..fade(0.0)
        };
        let plan = CustomizePlan::build(&custom, &info(10.0, 1080), 1080).unwrap();
        assert!(plan.trim.is_none());
        assert!((plan.output_duration - 10.0).abs() < 0.001);
    }

    #[test]
    fn test_non_positive_volume_rejected() {
        for volume in [0.0, -1.0, f64::NAN] {
            let custom = Customization {
                volume,
                ..fade(0.0)
            };
            let err = CustomizePlan::build(&custom, &info(10.0, 1080), 1080).unwrap_err();
            assert!(matches!(err, MediaError::InvalidParameter(_)));
        }
    }

    #[test]
    fn test_neutral_volume_emits_no_filter() {
        let plan = CustomizePlan::build(&fade(0.0), &info(10.0, 1080), 1080).unwrap();
        assert!(plan.audio_filters.is_empty());
        assert!(plan.is_passthrough());
    }

    #[test]
    fn test_scale_only_when_height_differs() {
        let plan = CustomizePlan::build(&fade(0.0), &info(10.0, 720), 1080).unwrap();
        assert_eq!(plan.video_filters, vec!["scale=-2:1080".to_string()]);

        let plan = CustomizePlan::build(&fade(0.0), &info(10.0, 1080), 1080).unwrap();
        assert!(plan.video_filters.is_empty());
    }

    #[test]
    fn test_fade_filters_at_both_ends() {
        let plan = CustomizePlan::build(&fade(1.0), &info(10.0, 1080), 1080).unwrap();
        assert_eq!(
            plan.video_filters,
            vec![
                "fade=t=in:st=0:d=1.000".to_string(),
                "fade=t=out:st=9.000:d=1.000".to_string(),
            ]
        );
        assert_eq!(
            plan.audio_filters,
            vec![
                "afade=t=in:st=0:d=1.000".to_string(),
                "afade=t=out:st=9.000:d=1.000".to_string(),
            ]
        );
    }

    #[test]
    fn test_fade_clamped_to_half_duration() {
        let plan = CustomizePlan::build(&fade(5.0), &info(4.0, 1080), 1080).unwrap();
        // 5s requested, clip is 4s, ramp clamps to 2s
        assert_eq!(plan.video_filters[0], "fade=t=in:st=0:d=2.000");
        assert_eq!(plan.video_filters[1], "fade=t=out:st=2.000:d=2.000");
    }

    #[test]
    fn test_fade_applies_to_trimmed_duration() {
        let custom = Customization {
            trim_start: Some(0.0),
            trim_end: Some(6.0),
            ..fade(1.0)
        };
        let plan = CustomizePlan::build(&custom, &info(20.0, 1080), 1080).unwrap();
        assert_eq!(plan.video_filters[1], "fade=t=out:st=5.000:d=1.000");
    }

    #[test]
    fn test_unsupported_transition_is_noop() {
        for kind in [TransitionKind::Dissolve, TransitionKind::Cut] {
            let custom = Customization::with_transition(kind, 1.0);
            let plan = CustomizePlan::build(&custom, &info(10.0, 1080), 1080).unwrap();
            assert!(plan.video_filters.is_empty());
            assert!(plan.audio_filters.is_empty());
        }
    }

    #[test]
    fn test_negative_transition_duration_rejected() {
        let custom = Customization::with_transition(TransitionKind::Fade, -0.5);
        let err = CustomizePlan::build(&custom, &info(10.0, 1080), 1080).unwrap_err();
        assert!(matches!(err, MediaError::InvalidParameter(_)));
    }
}
