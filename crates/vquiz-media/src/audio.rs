//! Audio track extraction.

use std::path::{Path, PathBuf};
use tracing::warn;

use crate::command::{FfmpegCommand, FfmpegRunner};

/// Sample rate of extracted audio, matched to the transcription capability.
pub const AUDIO_SAMPLE_RATE_HZ: u32 = 16_000;

/// Extract the audio track of a video as 16 kHz mono PCM WAV.
///
/// Returns `None` on any failure (missing FFmpeg, no audio track, timeout).
/// Extraction failure is a soft failure the pipeline must tolerate, so this
/// function never returns an error.
pub async fn extract_audio(
    video_path: impl AsRef<Path>,
    workdir: impl AsRef<Path>,
    timeout_secs: u64,
) -> Option<PathBuf> {
    let video_path = video_path.as_ref();
    let output_path = workdir.as_ref().join("audio.wav");

    if let Err(e) = tokio::fs::create_dir_all(workdir.as_ref()).await {
        warn!(error = %e, "Failed to create audio workdir");
        return None;
    }

    let cmd = FfmpegCommand::new(video_path, &output_path)
        .no_video()
        .audio_codec("pcm_s16le")
        .audio_sample_rate(AUDIO_SAMPLE_RATE_HZ)
        .audio_channels(1);

    match FfmpegRunner::new().with_timeout(timeout_secs).run(&cmd).await {
        Ok(()) => {
            // An output that exists but is empty means no audio track.
            match tokio::fs::metadata(&output_path).await {
                Ok(meta) if meta.len() > 0 => Some(output_path),
                _ => {
                    warn!(video = %video_path.display(), "Audio extraction produced no data");
                    None
                }
            }
        }
        Err(e) => {
            warn!(video = %video_path.display(), error = %e, "Audio extraction failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_extract_audio_soft_fails_on_bogus_input() {
        let dir = TempDir::new().unwrap();
        let result = extract_audio("/nonexistent/video.mp4", dir.path(), 10).await;
        assert!(result.is_none());
    }
}
