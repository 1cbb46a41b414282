//! Ordered concatenation of customized clips.

use std::path::Path;
use tracing::info;

use lstory_models::EncodingConfig;

use crate::clip::Clip;
use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Build the concat filter graph for `n` inputs at a uniform frame size.
///
/// Every input is normalized here even if customization already scaled
/// it: clips that requested no resize may still arrive at a different
/// size, and the concat filter requires identical frames. Letterboxing
/// pads mismatched aspect ratios instead of distorting them.
pub fn build_concat_filter(n: usize, target_width: u32, target_height: u32) -> String {
    let mut graph = String::new();

    for i in 0..n {
        graph.push_str(&format!(
            "[{i}:v]scale={w}:{h}:force_original_aspect_ratio=decrease,\
             pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1[v{i}];",
            i = i,
            w = target_width,
            h = target_height,
        ));
    }

    for i in 0..n {
        graph.push_str(&format!("[v{i}][{i}:a]", i = i));
    }
    graph.push_str(&format!("concat=n={}:v=1:a=1[vout][aout]", n));

    graph
}

/// Concatenate customized clips into one asset, preserving input order.
///
/// Returns a handle to the composed file with freshly probed metadata.
/// The clip list must be non-empty; one clip per template step means an
/// empty list is an upstream bug, not a user error.
pub async fn compose_clips(
    clips: &[Clip],
    output: impl AsRef<Path>,
    target_width: u32,
    target_height: u32,
    encoding: &EncodingConfig,
    runner: &FfmpegRunner,
) -> MediaResult<Clip> {
    if clips.is_empty() {
        return Err(MediaError::EmptyComposition);
    }

    let output = output.as_ref();
    let expected: f64 = clips.iter().map(Clip::duration).sum();

    info!(
        "Composing {} clips -> {} ({}x{}, ~{:.1}s)",
        clips.len(),
        output.display(),
        target_width,
        target_height,
        expected
    );

    let mut cmd = FfmpegCommand::new(&clips[0].path, output);
    for clip in &clips[1..] {
        cmd = cmd.add_input(&clip.path);
    }
    cmd = cmd
        .filter_complex(build_concat_filter(clips.len(), target_width, target_height))
        .map_stream("[vout]")
        .map_stream("[aout]")
        .output_args(encoding.to_ffmpeg_args());

    runner.run(&cmd).await?;

    let composed = Clip::probe(output).await?;

    // Concatenation can only add container overhead, never drop content.
    let longest = clips.iter().map(Clip::duration).fold(0.0, f64::max);
    if composed.duration() + 0.05 < longest {
        return Err(MediaError::internal(format!(
            "composed duration {:.3}s shorter than longest input {:.3}s",
            composed.duration(),
            longest
        )));
    }

    Ok(composed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concat_filter_single_input() {
        let graph = build_concat_filter(1, 1920, 1080);
        assert!(graph.contains("[0:v]scale=1920:1080"));
        assert!(graph.ends_with("concat=n=1:v=1:a=1[vout][aout]"));
    }

    #[test]
    fn test_concat_filter_preserves_order() {
        let graph = build_concat_filter(3, 1280, 720);

        // Each input gets its own normalization chain
        for i in 0..3 {
            assert!(graph.contains(&format!("[{}:v]scale=1280:720", i)));
        }

        // Pairs feed concat in input order
        let concat_inputs = "[v0][0:a][v1][1:a][v2][2:a]concat=n=3:v=1:a=1";
        assert!(graph.contains(concat_inputs));
    }

    #[tokio::test]
    async fn test_empty_clip_list_rejected() {
        let runner = FfmpegRunner::new();
        let err = compose_clips(&[], "out.mp4", 1920, 1080, &EncodingConfig::default(), &runner)
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::EmptyComposition));
    }
}
