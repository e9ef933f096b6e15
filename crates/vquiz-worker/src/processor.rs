//! Pipeline orchestrator.
//!
//! Runs a single job end to end: fetches the record, derives content through
//! the stage executors, and persists exactly one terminal transition.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use metrics::counter;
use tracing::{error, info, warn};

use vquiz_ai::{Generator, TextDetector, Transcriber};
use vquiz_media::{check_ffmpeg, TempResources};
use vquiz_models::JobId;
use vquiz_store::JobStore;

use crate::config::{PipelineShape, WorkerConfig};
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::stages::{
    build_content_blob, run_audio_stage, run_monolithic_stage, run_synthesis_stage,
    run_visual_stage, VisualOutput,
};

/// Shared dependencies of the pipeline, injected at construction.
#[derive(Clone)]
pub struct PipelineContext {
    pub config: WorkerConfig,
    pub store: Arc<dyn JobStore>,
    pub transcriber: Arc<dyn Transcriber>,
    pub detector: Arc<dyn TextDetector>,
    pub generator: Arc<dyn Generator>,
}

/// Executes the video pipeline for one job at a time.
pub struct PipelineOrchestrator {
    ctx: PipelineContext,
}

impl PipelineOrchestrator {
    pub fn new(ctx: PipelineContext) -> Self {
        Self { ctx }
    }

    /// Run the pipeline for a job, bounded by the per-job deadline.
    ///
    /// Any hard failure (including the deadline) marks the job `Failed`
    /// through [`mark_failed`] before returning; temporary artifacts are
    /// released either way.
    ///
    /// [`mark_failed`]: PipelineOrchestrator::mark_failed
    pub async fn run(&self, job_id: &JobId) -> WorkerResult<()> {
        let logger = JobLogger::new(job_id, "video_pipeline");
        let mut temp = TempResources::new();

        let deadline = self.ctx.config.job_timeout;
        let result = match tokio::time::timeout(
            deadline,
            self.run_pipeline(job_id, &logger, &mut temp),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(WorkerError::JobTimeout(format!(
                "job exceeded deadline of {:?}",
                deadline
            ))),
        };
        temp.release().await;

        match result {
            Ok(()) => {
                counter!("pipeline_jobs_completed_total").increment(1);
                Ok(())
            }
            Err(e) => {
                counter!("pipeline_jobs_failed_total").increment(1);
                logger.log_error(&format!("Pipeline failed: {}", e));
                self.mark_failed(job_id, &e.to_string()).await;
                Err(e)
            }
        }
    }

    async fn run_pipeline(
        &self,
        job_id: &JobId,
        logger: &JobLogger,
        temp: &mut TempResources,
    ) -> WorkerResult<()> {
        let job = self.ctx.store.get(job_id).await?;

        // Monotonic state machine: a terminal record is never reprocessed.
        if job.is_terminal() {
            logger.log_warning(&format!(
                "Job already in terminal state {}, skipping",
                job.status
            ));
            return Ok(());
        }

        logger.log_start(&format!("Processing {}", job.source_filename));

        let video_path = PathBuf::from(&job.source_path);
        if !video_path.exists() {
            return Err(WorkerError::job_failed(format!(
                "source video not found: {}",
                job.source_path
            )));
        }

        let workdir = Path::new(&self.ctx.config.work_dir).join(job_id.as_str());
        tokio::fs::create_dir_all(&workdir).await?;
        temp.track(&workdir);

        let shape = self.select_shape();
        let (transcript, visual) = match shape {
            PipelineShape::Decomposed => {
                let audio = run_audio_stage(
                    self.ctx.transcriber.as_ref(),
                    &self.ctx.config,
                    &video_path,
                    &workdir,
                    temp,
                )
                .await?;
                logger.log_progress("Audio stage finished");

                let visual = run_visual_stage(
                    self.ctx.detector.as_ref(),
                    self.ctx.generator.as_ref(),
                    &self.ctx.config,
                    &video_path,
                    &workdir,
                    temp,
                )
                .await?;
                logger.log_progress("Visual stage finished");

                (audio.unwrap_or_default(), visual.unwrap_or_default())
            }
            PipelineShape::Monolithic => {
                let description =
                    run_monolithic_stage(self.ctx.generator.as_ref(), &self.ctx.config, &video_path)
                        .await?;
                logger.log_progress("Monolithic stage finished");

                (description.unwrap_or_default(), VisualOutput::default())
            }
        };

        let content =
            build_content_blob(&transcript, &visual.extracted_text, &visual.visual_description);
        let synthesis =
            run_synthesis_stage(self.ctx.generator.as_ref(), &self.ctx.config, &content).await?;
        logger.log_progress("Synthesis stage finished");

        let mut job = job;
        job.transcript = transcript;
        job.extracted_text = visual.extracted_text;
        job.visual_description = visual.visual_description;
        job.summary = synthesis.summary;
        job.quiz_questions = synthesis.quiz_questions;
        job.answer_key = synthesis.answer_key;

        let completed = job.complete();
        self.ctx.store.save(&completed).await?;

        logger.log_completion(&format!(
            "Generated {} quiz questions",
            completed.quiz_questions.len()
        ));
        Ok(())
    }

    fn select_shape(&self) -> PipelineShape {
        match self.ctx.config.pipeline_shape {
            PipelineShape::Monolithic => PipelineShape::Monolithic,
            PipelineShape::Decomposed => match check_ffmpeg() {
                Ok(_) => PipelineShape::Decomposed,
                Err(e) => {
                    warn!(error = %e, "FFmpeg unavailable, falling back to monolithic shape");
                    PipelineShape::Monolithic
                }
            },
        }
    }

    /// Re-fetch the record and mark it `Failed`.
    ///
    /// Re-fetching avoids clobbering fields written by a concurrent save. If
    /// the fetch or the save itself fails there is nothing left to update
    /// with, so the record may be stuck in `processing`; all we can do is
    /// log it loudly for operators.
    pub async fn mark_failed(&self, job_id: &JobId, message: &str) {
        let job = match self.ctx.store.get(job_id).await {
            Ok(job) => job,
            Err(e) => {
                error!(
                    job_id = %job_id,
                    error = %e,
                    "Could not fetch job to mark it failed; record may be stuck in processing"
                );
                return;
            }
        };

        if job.is_terminal() {
            return;
        }

        let failed = job.fail(message);
        if let Err(e) = self.ctx.store.save(&failed).await {
            error!(
                job_id = %job_id,
                error = %e,
                "Could not persist failure; record may be stuck in processing"
            );
        } else {
            info!(job_id = %job_id, "Job marked failed: {}", message);
        }
    }
}
