//! Shared data models for the VidQuiz backend.
//!
//! This crate provides Serde-serializable types for:
//! - Job records and their lifecycle states
//! - Quiz questions and answer-key derivation

pub mod job;
pub mod quiz;

pub use job::{JobId, JobRecord, JobStatus};
pub use quiz::{derive_answer_key, QuizQuestion};
