//! The job store contract.

use async_trait::async_trait;

use vquiz_models::{JobId, JobRecord};

use crate::error::StoreResult;

/// Durable state keyed by job id, mutated only by the orchestrator.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Fetch a record by id. Fails with `StoreError::NotFound` when absent.
    async fn get(&self, id: &JobId) -> StoreResult<JobRecord>;

    /// Persist a record. Idempotent per call: saving the same record twice
    /// leaves the same stored state.
    async fn save(&self, record: &JobRecord) -> StoreResult<()>;
}
