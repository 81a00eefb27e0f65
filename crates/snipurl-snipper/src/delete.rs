use crate::workerpool::{PoolError, TaskHandler, WorkerPool};
use async_trait::async_trait;
use snipurl_core::{OwnerId, ShortCode, StorageError, UrlStore};
use std::sync::Arc;
use tracing::debug;

/// One batch of codes to soft-delete on behalf of an owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteTask {
    pub owner: OwnerId,
    pub codes: Vec<ShortCode>,
}

struct DeleteHandler<S> {
    store: Arc<S>,
}

#[async_trait]
impl<S: UrlStore> TaskHandler<DeleteTask> for DeleteHandler<S> {
    type Error = StorageError;

    async fn handle(&self, task: DeleteTask) -> Result<(), StorageError> {
        debug!(owner = %task.owner, codes = task.codes.len(), "applying delete batch");
        self.store.delete_urls(&task.owner, &task.codes).await
    }
}

/// Applies delete batches against a store in the background.
pub struct DeleteService {
    pool: WorkerPool<DeleteTask>,
}

impl DeleteService {
    pub fn new<S: UrlStore>(store: Arc<S>, workers: usize) -> Self {
        Self {
            pool: WorkerPool::new(workers, DeleteHandler { store }),
        }
    }

    /// Queues a batch. Returns as soon as the queue accepted it.
    pub async fn submit(&self, task: DeleteTask) -> Result<(), PoolError> {
        self.pool.add_task(task).await
    }

    /// Finishes every queued batch and stops the workers.
    pub async fn shutdown(&self) {
        self.pool.shutdown().await;
    }
}
