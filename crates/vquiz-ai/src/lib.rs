//! Capability ports and Google AI adapters.
//!
//! This crate provides:
//! - Narrow async contracts toward external transcription, OCR, and
//!   generative services (`Transcriber`, `TextDetector`, `Generator`)
//! - REST adapters for Google Speech-to-Text, Vision, and Gemini
//! - Structured quiz extraction from free-form model output

pub mod error;
pub mod extractor;
pub mod gemini;
pub mod ports;
pub mod speech;
pub mod vision;

pub use error::{AiError, AiResult};
pub use extractor::{extract_quiz, ExtractedQuiz};
pub use gemini::{GeminiClient, GeminiConfig};
pub use ports::{Generator, InlineMedia, TextDetector, Transcriber};
pub use speech::{SpeechClient, SpeechConfig};
pub use vision::{VisionClient, VisionConfig};
