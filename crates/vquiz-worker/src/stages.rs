//! Stage executors.
//!
//! Each stage is a function of its inputs to a result-or-soft-failure; no
//! stage lets a capability error escape its own boundary. Soft failure is an
//! explicit `StageOutcome::Degraded` tag, never an empty-string sentinel the
//! orchestrator has to guess at.

use std::path::Path;

use tracing::warn;

use vquiz_ai::{extract_quiz, Generator, InlineMedia, TextDetector, Transcriber};
use vquiz_media::audio::AUDIO_SAMPLE_RATE_HZ;
use vquiz_media::{extract_audio, sample_frames, TempResources};
use vquiz_models::{derive_answer_key, QuizQuestion};

use crate::config::WorkerConfig;
use crate::error::WorkerResult;
use crate::retry::{call_with_retry, RetryConfig};

/// Prompt for summarizing the combined video content.
const SUMMARY_PROMPT: &str = r#"You are an educational content assistant. Summarize the following video content in 3-5 sentences aimed at a student reviewing the material. Focus on the key concepts and conclusions.

VIDEO CONTENT:
"#;

/// Prompt for generating the quiz.
const QUIZ_PROMPT: &str = r#"You are an educational content assistant. Based on the following video content, write 5 multiple-choice questions that test understanding of the material.

IMPORTANT: You must strictly follow this output format.
Return ONLY a single JSON object with this schema:
{
  "questions": [
    {
      "question": "Question text",
      "options": ["Option 1", "Option 2", "Option 3", "Option 4"],
      "correctAnswer": "Option 2"
    }
  ]
}

Additional instructions:
- Return ONLY a single JSON object and nothing else.
- Each question must have exactly 4 options.
- correctAnswer must be copied verbatim from the options.

VIDEO CONTENT:
"#;

/// Prompt for describing a single sampled frame.
const FRAME_PROMPT: &str =
    "Describe what is shown in this video frame in 1-2 sentences. Mention any diagrams, slides, or demonstrations.";

/// Prompt for the monolithic shape: one multimodal call over the whole video.
const VIDEO_PROMPT: &str = "Watch this video and produce a detailed description of its content: transcribe the speech as closely as possible and describe what is shown on screen, in order.";

/// Result of one stage: a value, or an explicitly degraded output.
///
/// Hard failures travel separately as `Err(WorkerError)`; the orchestrator's
/// continue/abort decision is made on this tag, not on string truthiness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome<T> {
    /// Stage produced its output.
    Complete(T),
    /// Stage soft-failed; output degrades to the default.
    Degraded(String),
}

impl<T> StageOutcome<T> {
    /// Whether the stage degraded.
    pub fn is_degraded(&self) -> bool {
        matches!(self, StageOutcome::Degraded(_))
    }
}

impl<T: Default> StageOutcome<T> {
    /// The stage value, or the default for a degraded stage (logging the
    /// degradation reason).
    pub fn unwrap_or_default(self) -> T {
        match self {
            StageOutcome::Complete(value) => value,
            StageOutcome::Degraded(reason) => {
                warn!("Stage degraded: {}", reason);
                T::default()
            }
        }
    }
}

/// Output of the visual stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisualOutput {
    /// On-screen text collected by OCR, in frame order
    pub extracted_text: String,
    /// Per-frame descriptions, in frame order
    pub visual_description: String,
}

/// Output of the synthesis stage.
#[derive(Debug, Clone)]
pub struct SynthesisOutput {
    pub summary: String,
    pub quiz_questions: Vec<QuizQuestion>,
    pub answer_key: String,
}

fn retry_config(config: &WorkerConfig, operation: &str) -> RetryConfig {
    RetryConfig::new(operation).with_max_retries(config.max_call_retries)
}

/// Audio stage: extract the audio track and transcribe it.
///
/// Degrades (transcript stays empty) when extraction yields nothing, the
/// transcription capability fails, or the transcript comes back empty.
pub async fn run_audio_stage(
    transcriber: &dyn Transcriber,
    config: &WorkerConfig,
    video_path: &Path,
    workdir: &Path,
    temp: &mut TempResources,
) -> WorkerResult<StageOutcome<String>> {
    let audio_dir = workdir.join("audio");
    let Some(audio_path) = extract_audio(video_path, &audio_dir, config.media_timeout_secs).await
    else {
        return Ok(StageOutcome::Degraded("audio extraction failed".into()));
    };
    temp.track(&audio_path);

    let audio_bytes = match tokio::fs::read(&audio_path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return Ok(StageOutcome::Degraded(format!(
                "failed to read extracted audio: {}",
                e
            )))
        }
    };

    let retry = retry_config(config, "transcribe");
    let transcript = match call_with_retry(&retry, config.call_timeout, || {
        transcriber.transcribe(&audio_bytes, AUDIO_SAMPLE_RATE_HZ, &config.language_code)
    })
    .await
    {
        Ok(transcript) => transcript,
        Err(e) => return Ok(StageOutcome::Degraded(format!("transcription failed: {}", e))),
    };

    if transcript.trim().is_empty() {
        return Ok(StageOutcome::Degraded("empty transcript".into()));
    }

    Ok(StageOutcome::Complete(transcript))
}

/// Visual stage: sample frames, then OCR and describe each independently.
///
/// Per-frame failures are skipped, not fatal; outputs are concatenated in
/// frame order. Degrades only when no frame yields anything.
pub async fn run_visual_stage(
    detector: &dyn TextDetector,
    generator: &dyn Generator,
    config: &WorkerConfig,
    video_path: &Path,
    workdir: &Path,
    temp: &mut TempResources,
) -> WorkerResult<StageOutcome<VisualOutput>> {
    let frames_dir = workdir.join("frames");
    let frames = sample_frames(
        video_path,
        &frames_dir,
        config.frame_interval_secs,
        config.max_frames,
        config.media_timeout_secs,
    )
    .await;
    temp.track_all(frames.iter().cloned());

    if frames.is_empty() {
        return Ok(StageOutcome::Degraded("frame sampling produced no frames".into()));
    }

    let mut extracted_text = Vec::new();
    let mut descriptions = Vec::new();

    for (index, frame) in frames.iter().enumerate() {
        let frame_bytes = match tokio::fs::read(frame).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(frame = %frame.display(), error = %e, "Skipping unreadable frame");
                continue;
            }
        };

        let retry = retry_config(config, "detect_text");
        match call_with_retry(&retry, config.call_timeout, || {
            detector.detect_text(&frame_bytes)
        })
        .await
        {
            Ok(text) if !text.trim().is_empty() => extracted_text.push(text.trim().to_string()),
            Ok(_) => {}
            Err(e) => warn!(frame = index, error = %e, "OCR failed for frame, skipping"),
        }

        let retry = retry_config(config, "describe_frame");
        match call_with_retry(&retry, config.call_timeout, || {
            generator.generate(FRAME_PROMPT, Some(InlineMedia::jpeg(frame_bytes.clone())))
        })
        .await
        {
            Ok(description) if !description.trim().is_empty() => {
                descriptions.push(description.trim().to_string())
            }
            Ok(_) => {}
            Err(e) => warn!(frame = index, error = %e, "Frame description failed, skipping"),
        }
    }

    if extracted_text.is_empty() && descriptions.is_empty() {
        return Ok(StageOutcome::Degraded("no frame produced any output".into()));
    }

    Ok(StageOutcome::Complete(VisualOutput {
        extracted_text: extracted_text.join("\n"),
        visual_description: descriptions.join("\n"),
    }))
}

/// Monolithic shape: describe the whole video in one multimodal call.
///
/// The output stands in for the transcript. Degrades when the file cannot be
/// read or the generation capability fails.
pub async fn run_monolithic_stage(
    generator: &dyn Generator,
    config: &WorkerConfig,
    video_path: &Path,
) -> WorkerResult<StageOutcome<String>> {
    let video_bytes = match tokio::fs::read(video_path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return Ok(StageOutcome::Degraded(format!(
                "failed to read source video: {}",
                e
            )))
        }
    };

    let retry = retry_config(config, "describe_video");
    match call_with_retry(&retry, config.call_timeout, || {
        generator.generate(VIDEO_PROMPT, Some(InlineMedia::mp4(video_bytes.clone())))
    })
    .await
    {
        Ok(description) if !description.trim().is_empty() => {
            Ok(StageOutcome::Complete(description))
        }
        Ok(_) => Ok(StageOutcome::Degraded("empty video description".into())),
        Err(e) => Ok(StageOutcome::Degraded(format!(
            "video description failed: {}",
            e
        ))),
    }
}

/// Build the combined content blob fed to the synthesis prompts.
pub fn build_content_blob(transcript: &str, extracted_text: &str, visual_description: &str) -> String {
    let mut sections = Vec::new();
    if !transcript.trim().is_empty() {
        sections.push(format!("TRANSCRIPT:\n{}", transcript.trim()));
    }
    if !extracted_text.trim().is_empty() {
        sections.push(format!("ON-SCREEN TEXT:\n{}", extracted_text.trim()));
    }
    if !visual_description.trim().is_empty() {
        sections.push(format!("VISUAL DESCRIPTION:\n{}", visual_description.trim()));
    }
    if sections.is_empty() {
        sections.push("(No content could be extracted from the video.)".to_string());
    }
    sections.join("\n\n")
}

/// Synthesis stage: summary and quiz from the combined content.
///
/// Never hard-fails: a failed summary call degrades to an empty summary and a
/// failed or unusable quiz response degrades to the canonical fallback
/// question, so the quiz is never empty.
pub async fn run_synthesis_stage(
    generator: &dyn Generator,
    config: &WorkerConfig,
    content: &str,
) -> WorkerResult<SynthesisOutput> {
    let summary_prompt = format!("{}{}", SUMMARY_PROMPT, content);
    let retry = retry_config(config, "summarize");
    let summary = match call_with_retry(&retry, config.call_timeout, || {
        generator.generate(&summary_prompt, None)
    })
    .await
    {
        Ok(summary) => summary.trim().to_string(),
        Err(e) => {
            warn!(error = %e, "Summary generation failed, leaving summary empty");
            String::new()
        }
    };

    let quiz_prompt = format!("{}{}", QUIZ_PROMPT, content);
    let retry = retry_config(config, "generate_quiz");
    let quiz_questions = match call_with_retry(&retry, config.call_timeout, || {
        generator.generate(&quiz_prompt, None)
    })
    .await
    {
        Ok(raw) => extract_quiz(&raw).into_questions(),
        Err(e) => {
            warn!(error = %e, "Quiz generation failed, using fallback question");
            vquiz_ai::extractor::fallback_quiz()
        }
    };

    // The answer key is derived from the final sequence, never the raw text.
    let answer_key = derive_answer_key(&quiz_questions);

    Ok(SynthesisOutput {
        summary,
        quiz_questions,
        answer_key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use vquiz_ai::{AiError, AiResult};

    struct StubGenerator {
        response: AiResult<String>,
    }

    impl StubGenerator {
        fn ok(text: &str) -> Self {
            Self {
                response: Ok(text.to_string()),
            }
        }

        fn failing() -> Self {
            Self {
                response: Err(AiError::Http {
                    status: 400,
                    body: "bad".into(),
                }),
            }
        }
    }

    #[async_trait]
    impl Generator for StubGenerator {
        async fn generate(&self, _prompt: &str, _media: Option<InlineMedia>) -> AiResult<String> {
            match &self.response {
                Ok(text) => Ok(text.clone()),
                Err(_) => Err(AiError::Http {
                    status: 400,
                    body: "bad".into(),
                }),
            }
        }
    }

    #[test]
    fn test_stage_outcome_default_on_degraded() {
        let outcome: StageOutcome<String> = StageOutcome::Degraded("reason".into());
        assert!(outcome.is_degraded());
        assert_eq!(outcome.unwrap_or_default(), "");
    }

    #[test]
    fn test_content_blob_sections() {
        let blob = build_content_blob("spoken", "slide text", "a diagram");
        assert!(blob.contains("TRANSCRIPT:\nspoken"));
        assert!(blob.contains("ON-SCREEN TEXT:\nslide text"));
        assert!(blob.contains("VISUAL DESCRIPTION:\na diagram"));
    }

    #[test]
    fn test_content_blob_skips_empty_sections() {
        let blob = build_content_blob("spoken", "", "  ");
        assert!(blob.contains("TRANSCRIPT"));
        assert!(!blob.contains("ON-SCREEN TEXT"));
        assert!(!blob.contains("VISUAL DESCRIPTION"));
    }

    #[test]
    fn test_content_blob_never_empty() {
        let blob = build_content_blob("", "", "");
        assert!(!blob.is_empty());
    }

    #[tokio::test]
    async fn test_synthesis_parses_quiz() {
        let generator = StubGenerator::ok(
            r#"{"questions":[{"question":"Q?","options":["A","B","C","D"],"correctAnswer":"B"}]}"#,
        );
        let config = WorkerConfig::default();

        let output = run_synthesis_stage(&generator, &config, "content")
            .await
            .unwrap();
        assert_eq!(output.quiz_questions.len(), 1);
        assert_eq!(output.answer_key, "Q1: B");
    }

    #[tokio::test]
    async fn test_synthesis_degrades_to_fallback_quiz() {
        let generator = StubGenerator::failing();
        let config = WorkerConfig::default();

        let output = run_synthesis_stage(&generator, &config, "content")
            .await
            .unwrap();
        // Quiz is never empty, summary degrades to empty string.
        assert_eq!(output.quiz_questions.len(), 1);
        assert_eq!(output.quiz_questions[0].correct_answer, "Topic A");
        assert!(output.summary.is_empty());
        assert_eq!(output.answer_key, "Q1: Topic A");
    }

    #[tokio::test]
    async fn test_monolithic_stage_degrades_on_unreadable_video() {
        let generator = StubGenerator::ok("description");
        let config = WorkerConfig::default();

        let outcome = run_monolithic_stage(&generator, &config, Path::new("/nonexistent.mp4"))
            .await
            .unwrap();
        assert!(outcome.is_degraded());
    }
}
