//! Bounded pipeline runner.
//!
//! Jobs enter through a fixed-depth queue and run on a semaphore-bounded
//! pool, so a burst of uploads degrades to queueing (and eventually to
//! admission rejection) instead of unbounded task spawns.

use std::sync::Arc;

use metrics::{counter, gauge};
use tokio::sync::{mpsc, watch, Mutex, Semaphore};
use tracing::{info, warn};

use vquiz_models::JobId;

use crate::error::{WorkerError, WorkerResult};
use crate::processor::{PipelineContext, PipelineOrchestrator};

/// Accepts jobs and drives them through the orchestrator with bounded
/// concurrency.
pub struct PipelineRunner {
    ctx: PipelineContext,
    queue_tx: mpsc::Sender<JobId>,
    queue_rx: Mutex<Option<mpsc::Receiver<JobId>>>,
    job_semaphore: Arc<Semaphore>,
    shutdown_tx: watch::Sender<bool>,
}

impl PipelineRunner {
    pub fn new(ctx: PipelineContext) -> Self {
        let (queue_tx, queue_rx) = mpsc::channel(ctx.config.queue_depth);
        let (shutdown_tx, _) = watch::channel(false);
        let job_semaphore = Arc::new(Semaphore::new(ctx.config.max_concurrent_jobs));

        Self {
            ctx,
            queue_tx,
            queue_rx: Mutex::new(Some(queue_rx)),
            job_semaphore,
            shutdown_tx,
        }
    }

    /// Enqueue a job for processing. Returns immediately; the pipeline runs
    /// in the background. Fails fast when the queue is full.
    pub fn start(&self, job_id: JobId) -> WorkerResult<()> {
        match self.queue_tx.try_send(job_id.clone()) {
            Ok(()) => {
                counter!("pipeline_jobs_enqueued_total").increment(1);
                info!(job_id = %job_id, "Job enqueued");
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                counter!("pipeline_jobs_rejected_total").increment(1);
                Err(WorkerError::queue_full(format!(
                    "queue at capacity ({} pending)",
                    self.ctx.config.queue_depth
                )))
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                Err(WorkerError::queue_full("runner is shut down"))
            }
        }
    }

    /// Consume the queue until shutdown is signalled.
    ///
    /// Each job acquires a concurrency permit, then runs on its own task
    /// under the per-job deadline. Callable once; later calls return an
    /// error instead of silently competing for the queue.
    pub async fn run(&self) -> WorkerResult<()> {
        let mut queue_rx = self
            .queue_rx
            .lock()
            .await
            .take()
            .ok_or_else(|| WorkerError::config_error("runner already consuming the queue"))?;

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        info!(
            max_concurrent = self.ctx.config.max_concurrent_jobs,
            queue_depth = self.ctx.config.queue_depth,
            "Pipeline runner started"
        );

        loop {
            if *shutdown_rx.borrow() {
                info!("Shutdown signalled, draining in-flight jobs");
                break;
            }
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Shutdown signalled, draining in-flight jobs");
                        break;
                    }
                }
                job_id = queue_rx.recv() => {
                    let Some(job_id) = job_id else { break };
                    self.dispatch(job_id).await;
                }
            }
        }

        self.wait_for_jobs().await;
        Ok(())
    }

    async fn dispatch(&self, job_id: JobId) {
        // Blocks here when the pool is saturated; the queue absorbs the rest.
        let permit = match self.job_semaphore.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => return,
        };
        gauge!("pipeline_jobs_in_flight")
            .set((self.ctx.config.max_concurrent_jobs - self.job_semaphore.available_permits()) as f64);

        let orchestrator = PipelineOrchestrator::new(self.ctx.clone());

        tokio::spawn(async move {
            let _permit = permit;
            // The orchestrator enforces the per-job deadline and marks the
            // record failed itself; nothing to do here but log.
            if let Err(e) = orchestrator.run(&job_id).await {
                warn!(job_id = %job_id, error = %e, "Pipeline run failed");
            }
        });
    }

    /// Signal shutdown. `run` drains in-flight jobs before returning.
    pub fn shutdown(&self) {
        // send_replace stores the value even before `run` has subscribed.
        self.shutdown_tx.send_replace(true);
    }

    /// Wait for all in-flight jobs, bounded by the shutdown timeout.
    async fn wait_for_jobs(&self) {
        let all_permits = self.ctx.config.max_concurrent_jobs as u32;
        match tokio::time::timeout(
            self.ctx.config.shutdown_timeout,
            self.job_semaphore.acquire_many(all_permits),
        )
        .await
        {
            Ok(Ok(_)) => info!("All in-flight jobs finished"),
            Ok(Err(_)) => {}
            Err(_) => warn!(
                "Shutdown timeout of {:?} elapsed with jobs still running",
                self.ctx.config.shutdown_timeout
            ),
        }
    }

    /// Number of jobs that can still be admitted without queueing behind a
    /// running one. Test and observability hook.
    pub fn available_slots(&self) -> usize {
        self.job_semaphore.available_permits()
    }
}

impl std::fmt::Debug for PipelineRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineRunner")
            .field("queue_depth", &self.ctx.config.queue_depth)
            .field("max_concurrent_jobs", &self.ctx.config.max_concurrent_jobs)
            .finish()
    }
}
