//! Job record definitions for pipeline processing.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::quiz::QuizQuestion;

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Processing state of a job.
///
/// Transitions are monotonic: `Processing` moves to exactly one of
/// `Completed` or `Failed` and is never revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Pipeline run is in progress (initial state)
    #[default]
    Processing,
    /// Run finished, all content fields persisted
    Completed,
    /// Run aborted on an unexpected error
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The unit of work and its outcome.
///
/// Created by the upload collaborator in `Processing` state with all content
/// fields empty; mutated exclusively by the pipeline orchestrator during a
/// single run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    /// Unique job ID, immutable
    pub id: JobId,

    /// Owner of the uploaded video, used only for access filtering
    pub owner_id: String,

    /// Original name of the uploaded file
    pub source_filename: String,

    /// Location of the uploaded media on local storage
    pub source_path: String,

    /// Current state
    #[serde(default)]
    pub status: JobStatus,

    /// Spoken-word transcript (empty if the audio stage degraded)
    #[serde(default)]
    pub transcript: String,

    /// On-screen text collected by OCR
    #[serde(default)]
    pub extracted_text: String,

    /// Per-frame visual descriptions, concatenated in frame order
    #[serde(default)]
    pub visual_description: String,

    /// Generated short summary
    #[serde(default)]
    pub summary: String,

    /// Generated multiple-choice quiz, never empty after completion
    #[serde(default)]
    pub quiz_questions: Vec<QuizQuestion>,

    /// Derived answer key, one line per question
    #[serde(default)]
    pub answer_key: String,

    /// Failure message, present only when status is `Failed`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Creation timestamp, immutable
    pub created_at: DateTime<Utc>,
}

impl JobRecord {
    /// Create a new record in `Processing` state with empty content fields.
    pub fn new(
        owner_id: impl Into<String>,
        source_filename: impl Into<String>,
        source_path: impl Into<String>,
    ) -> Self {
        Self {
            id: JobId::new(),
            owner_id: owner_id.into(),
            source_filename: source_filename.into(),
            source_path: source_path.into(),
            status: JobStatus::Processing,
            transcript: String::new(),
            extracted_text: String::new(),
            visual_description: String::new(),
            summary: String::new(),
            quiz_questions: Vec::new(),
            answer_key: String::new(),
            error: None,
            created_at: Utc::now(),
        }
    }

    /// Mark the record as completed. No-op once terminal.
    pub fn complete(mut self) -> Self {
        if !self.status.is_terminal() {
            self.status = JobStatus::Completed;
        }
        self
    }

    /// Mark the record as failed with an error message. No-op once terminal.
    pub fn fail(mut self, error: impl Into<String>) -> Self {
        if !self.status.is_terminal() {
            self.status = JobStatus::Failed;
            self.error = Some(error.into());
        }
        self
    }

    /// Check if the record is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_creation() {
        let job = JobRecord::new("user123", "lecture.mp4", "/tmp/uploads/lecture.mp4");

        assert_eq!(job.status, JobStatus::Processing);
        assert!(job.transcript.is_empty());
        assert!(job.quiz_questions.is_empty());
        assert!(job.error.is_none());
    }

    #[test]
    fn test_status_transitions_are_monotonic() {
        let job = JobRecord::new("user123", "lecture.mp4", "/tmp/uploads/lecture.mp4");

        let completed = job.complete();
        assert_eq!(completed.status, JobStatus::Completed);
        assert!(completed.is_terminal());

        // A terminal record never re-enters processing or flips state.
        let still_completed = completed.fail("late failure");
        assert_eq!(still_completed.status, JobStatus::Completed);
        assert!(still_completed.error.is_none());
    }

    #[test]
    fn test_fail_records_error() {
        let job = JobRecord::new("user123", "lecture.mp4", "/tmp/uploads/lecture.mp4");

        let failed = job.fail("capability call exploded");
        assert_eq!(failed.status, JobStatus::Failed);
        assert_eq!(failed.error.as_deref(), Some("capability call exploded"));
    }

    #[test]
    fn test_record_serde_shape() {
        let job = JobRecord::new("user123", "lecture.mp4", "/tmp/uploads/lecture.mp4");
        let json = serde_json::to_value(&job).unwrap();

        assert!(json.get("ownerId").is_some());
        assert!(json.get("sourceFilename").is_some());
        assert_eq!(json["status"], "processing");
        // `error` is absent until a failure is recorded
        assert!(json.get("error").is_none());
    }
}
