//! In-memory job store.

use std::collections::HashMap;

use async_trait::async_trait;
use metrics::counter;
use tokio::sync::RwLock;
use tracing::debug;

use vquiz_models::{JobId, JobRecord};

use crate::error::{StoreError, StoreResult};
use crate::store::JobStore;

/// In-memory `JobStore` for tests and single-node deployments.
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    records: RwLock<HashMap<JobId, JobRecord>>,
}

impl MemoryJobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn get(&self, id: &JobId) -> StoreResult<JobRecord> {
        counter!("store_get_total").increment(1);
        self.records
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(id.as_str()))
    }

    async fn save(&self, record: &JobRecord) -> StoreResult<()> {
        counter!("store_save_total").increment(1);
        debug!(job_id = %record.id, status = %record.status, "Saving job record");
        self.records
            .write()
            .await
            .insert(record.id.clone(), record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vquiz_models::JobStatus;

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = MemoryJobStore::new();
        let err = store.get(&JobId::from_string("nope")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_save_then_get_round_trip() {
        let store = MemoryJobStore::new();
        let record = JobRecord::new("user1", "a.mp4", "/tmp/a.mp4");
        store.save(&record).await.unwrap();

        let fetched = store.get(&record.id).await.unwrap();
        assert_eq!(fetched.owner_id, "user1");
        assert_eq!(fetched.status, JobStatus::Processing);
    }

    #[tokio::test]
    async fn test_save_is_idempotent() {
        let store = MemoryJobStore::new();
        let record = JobRecord::new("user1", "a.mp4", "/tmp/a.mp4");
        store.save(&record).await.unwrap();
        store.save(&record).await.unwrap();
        assert_eq!(store.len().await, 1);
    }
}
