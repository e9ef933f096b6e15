//! Worker configuration.

use std::time::Duration;

/// How the pipeline decomposes a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineShape {
    /// Extract audio and frames locally, then run transcription, OCR, and
    /// per-frame description against the decomposed artifacts. Primary shape.
    #[default]
    Decomposed,
    /// Submit the whole video as inline multimodal input in a single
    /// generation call and use its output as the transcript-equivalent.
    /// Used when configured, or when FFmpeg is unavailable.
    Monolithic,
}

impl PipelineShape {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "decomposed" => Some(PipelineShape::Decomposed),
            "monolithic" => Some(PipelineShape::Monolithic),
            _ => None,
        }
    }
}

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum concurrent pipeline runs
    pub max_concurrent_jobs: usize,
    /// Pending jobs accepted before `start` rejects (admission control)
    pub queue_depth: usize,
    /// Work directory for temporary files
    pub work_dir: String,
    /// Seconds between sampled frames
    pub frame_interval_secs: u32,
    /// Maximum frames analyzed per video
    pub max_frames: usize,
    /// BCP-47 language code for transcription
    pub language_code: String,
    /// Timeout per capability call
    pub call_timeout: Duration,
    /// Timeout per FFmpeg invocation (seconds)
    pub media_timeout_secs: u64,
    /// Overall per-job deadline
    pub job_timeout: Duration,
    /// Graceful shutdown timeout
    pub shutdown_timeout: Duration,
    /// Retries per capability call (transient errors only)
    pub max_call_retries: u32,
    /// Pipeline shape selection
    pub pipeline_shape: PipelineShape,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 2,
            queue_depth: 64,
            work_dir: "/tmp/vquiz".to_string(),
            frame_interval_secs: 10,
            max_frames: 5,
            language_code: "en-US".to_string(),
            call_timeout: Duration::from_secs(60),
            media_timeout_secs: 120,
            job_timeout: Duration::from_secs(900), // 15 minutes
            shutdown_timeout: Duration::from_secs(30),
            max_call_retries: 3,
            pipeline_shape: PipelineShape::Decomposed,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_concurrent_jobs: env_parse("WORKER_MAX_JOBS", defaults.max_concurrent_jobs),
            queue_depth: env_parse("WORKER_QUEUE_DEPTH", defaults.queue_depth),
            work_dir: std::env::var("WORKER_WORK_DIR").unwrap_or(defaults.work_dir),
            frame_interval_secs: env_parse("WORKER_FRAME_INTERVAL_SECS", defaults.frame_interval_secs),
            max_frames: env_parse("WORKER_MAX_FRAMES", defaults.max_frames),
            language_code: std::env::var("WORKER_LANGUAGE_CODE").unwrap_or(defaults.language_code),
            call_timeout: Duration::from_secs(env_parse("WORKER_CALL_TIMEOUT_SECS", 60)),
            media_timeout_secs: env_parse("WORKER_MEDIA_TIMEOUT_SECS", defaults.media_timeout_secs),
            job_timeout: Duration::from_secs(env_parse("WORKER_JOB_TIMEOUT_SECS", 900)),
            shutdown_timeout: Duration::from_secs(env_parse("WORKER_SHUTDOWN_TIMEOUT_SECS", 30)),
            max_call_retries: env_parse("WORKER_CALL_RETRIES", defaults.max_call_retries),
            pipeline_shape: std::env::var("WORKER_PIPELINE_SHAPE")
                .ok()
                .and_then(|s| PipelineShape::parse(&s))
                .unwrap_or(defaults.pipeline_shape),
        }
    }
}

fn env_parse<T: std::str::FromStr>(var: &str, default: T) -> T {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorkerConfig::default();
        assert_eq!(config.max_concurrent_jobs, 2);
        assert_eq!(config.max_frames, 5);
        assert_eq!(config.pipeline_shape, PipelineShape::Decomposed);
    }

    #[test]
    fn test_shape_parse() {
        assert_eq!(PipelineShape::parse("monolithic"), Some(PipelineShape::Monolithic));
        assert_eq!(PipelineShape::parse("Decomposed"), Some(PipelineShape::Decomposed));
        assert_eq!(PipelineShape::parse("other"), None);
    }
}
