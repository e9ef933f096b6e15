//! Capability contracts consumed, never implemented, by the pipeline core.

use async_trait::async_trait;

use crate::error::AiResult;

/// Media payload passed inline with a generation prompt.
#[derive(Debug, Clone)]
pub struct InlineMedia {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl InlineMedia {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    /// JPEG frame payload.
    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self::new(bytes, "image/jpeg")
    }

    /// MP4 video payload.
    pub fn mp4(bytes: Vec<u8>) -> Self {
        Self::new(bytes, "video/mp4")
    }
}

/// Speech-to-text capability.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe raw PCM audio.
    async fn transcribe(
        &self,
        audio: &[u8],
        sample_rate_hz: u32,
        language_code: &str,
    ) -> AiResult<String>;
}

/// OCR capability.
#[async_trait]
pub trait TextDetector: Send + Sync {
    /// Detect text in an encoded image.
    async fn detect_text(&self, image: &[u8]) -> AiResult<String>;
}

/// Generative text capability, optionally multimodal.
///
/// A single polymorphic contract over "prompt with optional media": plain
/// text generation, image description, and whole-video description all go
/// through here.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str, media: Option<InlineMedia>) -> AiResult<String>;
}
