//! Bounded frame sampling.

use std::path::{Path, PathBuf};
use tracing::warn;

use crate::command::{FfmpegCommand, FfmpegRunner};

/// Sample frames from a video at a fixed interval, bounded by `max_frames`.
///
/// Frames are written as JPEGs into `workdir` and returned ordered by frame
/// index. Returns an empty vector on any failure; never partial corrupt
/// entries (the output directory is scanned only after FFmpeg exits cleanly).
pub async fn sample_frames(
    video_path: impl AsRef<Path>,
    workdir: impl AsRef<Path>,
    interval_secs: u32,
    max_frames: usize,
    timeout_secs: u64,
) -> Vec<PathBuf> {
    let video_path = video_path.as_ref();
    let workdir = workdir.as_ref();

    if max_frames == 0 {
        return Vec::new();
    }

    if let Err(e) = tokio::fs::create_dir_all(workdir).await {
        warn!(error = %e, "Failed to create frames workdir");
        return Vec::new();
    }

    let pattern = workdir.join("frame_%03d.jpg");
    let filter = format!("fps=1/{}", interval_secs.max(1));

    let cmd = FfmpegCommand::new(video_path, &pattern)
        .video_filter(&filter)
        .max_frames(max_frames);

    if let Err(e) = FfmpegRunner::new().with_timeout(timeout_secs).run(&cmd).await {
        warn!(video = %video_path.display(), error = %e, "Frame sampling failed");
        return Vec::new();
    }

    collect_frames(workdir).await
}

/// Collect sampled frames in index order.
async fn collect_frames(workdir: &Path) -> Vec<PathBuf> {
    let mut frames = Vec::new();

    let mut entries = match tokio::fs::read_dir(workdir).await {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, "Failed to read frames workdir");
            return Vec::new();
        }
    };

    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        let is_frame = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with("frame_") && n.ends_with(".jpg"))
            .unwrap_or(false);
        if is_frame {
            frames.push(path);
        }
    }

    // The %03d pattern makes lexicographic order equal frame order.
    frames.sort();
    frames
}
