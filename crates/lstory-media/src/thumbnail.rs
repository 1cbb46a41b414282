//! Thumbnail generation.

use std::path::Path;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;
use lstory_models::encoding::{THUMBNAIL_SCALE_WIDTH, THUMBNAIL_TIMESTAMP};

/// Extract a single scaled frame from a video file.
pub async fn generate_thumbnail(
    video_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
) -> MediaResult<()> {
    let video_path = video_path.as_ref();
    let output_path = output_path.as_ref();

    let filter = format!("scale={}:-2", THUMBNAIL_SCALE_WIDTH);

    let cmd = FfmpegCommand::new(video_path, output_path)
        .input_arg("-ss")
        .input_arg(THUMBNAIL_TIMESTAMP)
        .single_frame()
        .video_filter(&filter)
        .log_level("error");

    FfmpegRunner::new().run(&cmd).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thumbnail_command_args() {
        let filter = format!("scale={}:-2", THUMBNAIL_SCALE_WIDTH);
        let cmd = FfmpegCommand::new("story.mp4", "thumb.jpg")
            .input_arg("-ss")
            .input_arg(THUMBNAIL_TIMESTAMP)
            .single_frame()
            .video_filter(&filter);

        let args = cmd.build_args();
        assert!(args.contains(&"-vframes".to_string()));
        assert!(args.contains(&"00:00:01".to_string()));
        assert!(args.iter().any(|a| a.contains("scale=480")));
    }
}
