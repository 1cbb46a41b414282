//! Engine configuration.

use std::time::Duration;

/// Generation engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum concurrent segment downloads/customizations per run
    pub max_prepare_parallel: usize,
    /// Timeout applied to each FFmpeg invocation
    pub ffmpeg_timeout: Duration,
    /// Parent directory for per-run scratch space
    pub work_dir: String,
    /// Exclude the requesting user's own segments from selection
    /// (dropped once per step if it would empty the pool)
    pub exclude_requester_segments: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_prepare_parallel: 4,
            ffmpeg_timeout: Duration::from_secs(600),
            work_dir: "/tmp/lstory".to_string(),
            exclude_requester_segments: true,
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            max_prepare_parallel: std::env::var("LSTORY_MAX_PREPARE_PARALLEL")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(4),
            ffmpeg_timeout: Duration::from_secs(
                std::env::var("LSTORY_FFMPEG_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
            work_dir: std::env::var("LSTORY_WORK_DIR")
                .unwrap_or_else(|_| "/tmp/lstory".to_string()),
            exclude_requester_segments: std::env::var("LSTORY_EXCLUDE_REQUESTER_SEGMENTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_prepare_parallel, 4);
        assert!(config.exclude_requester_segments);
    }
}
