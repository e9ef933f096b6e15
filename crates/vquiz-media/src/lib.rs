//! FFmpeg CLI wrapper for deriving transient media artifacts.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with timeout enforcement
//! - Audio track extraction (soft-failing)
//! - Bounded frame sampling (soft-failing)
//! - Scoped, best-effort cleanup of everything it produced

pub mod audio;
pub mod command;
pub mod error;
pub mod frames;
pub mod temp;

pub use audio::extract_audio;
pub use command::{check_ffmpeg, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use frames::sample_frames;
pub use temp::TempResources;
