//! Video-to-quiz pipeline worker.
//!
//! This crate provides:
//! - Stage executors deriving transcript, on-screen text, visual
//!   descriptions, summary, and quiz from an uploaded video
//! - A pipeline orchestrator owning the job state machine
//! - A bounded runner with queue admission and graceful shutdown
//! - Retry, logging, and configuration plumbing

pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod processor;
pub mod retry;
pub mod stages;

pub use config::{PipelineShape, WorkerConfig};
pub use error::{WorkerError, WorkerResult};
pub use executor::PipelineRunner;
pub use processor::{PipelineContext, PipelineOrchestrator};
pub use stages::{StageOutcome, SynthesisOutput, VisualOutput};
