use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("worker pool is closed")]
    Closed,
}

/// Work executed by the pool's workers.
#[async_trait]
pub trait TaskHandler<T>: Send + Sync + 'static {
    type Error: std::fmt::Display + Send;

    async fn handle(&self, task: T) -> Result<(), Self::Error>;
}

/// A fixed set of tokio tasks draining one bounded queue.
///
/// The queue holds at most as many tasks as there are workers, so
/// [`WorkerPool::add_task`] applies backpressure to producers. A worker whose
/// handler fails logs the error and stops; it is not replaced.
pub struct WorkerPool<T> {
    sender: Mutex<Option<mpsc::Sender<T>>>,
    workers: tokio::sync::Mutex<Vec<JoinHandle<()>>>,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Spawns `workers` workers on the current tokio runtime.
    pub fn new<H: TaskHandler<T>>(workers: usize, handler: H) -> Self {
        let workers = workers.max(1);
        let (sender, receiver) = mpsc::channel(workers);
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));
        let handler = Arc::new(handler);

        let handles = (0..workers)
            .map(|worker| {
                tokio::spawn(run_worker(
                    worker,
                    Arc::clone(&receiver),
                    Arc::clone(&handler),
                ))
            })
            .collect();

        Self {
            sender: Mutex::new(Some(sender)),
            workers: tokio::sync::Mutex::new(handles),
        }
    }

    /// Queues a task, waiting while the queue is full.
    pub async fn add_task(&self, task: T) -> Result<(), PoolError> {
        let sender = self.sender.lock().clone().ok_or(PoolError::Closed)?;
        sender.send(task).await.map_err(|_| PoolError::Closed)
    }

    pub fn is_closed(&self) -> bool {
        self.sender
            .lock()
            .as_ref()
            .map_or(true, |sender| sender.is_closed())
    }

    /// Stops accepting tasks, lets the workers drain the queue and waits
    /// for them to exit. Calling it again is a no-op.
    pub async fn shutdown(&self) {
        drop(self.sender.lock().take());

        let handles = std::mem::take(&mut *self.workers.lock().await);
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "worker task panicked");
            }
        }
    }
}

async fn run_worker<T, H>(
    worker: usize,
    receiver: Arc<tokio::sync::Mutex<mpsc::Receiver<T>>>,
    handler: Arc<H>,
) where
    T: Send + 'static,
    H: TaskHandler<T>,
{
    loop {
        let task = receiver.lock().await.recv().await;
        let Some(task) = task else {
            debug!(worker, "queue closed, worker exiting");
            return;
        };

        if let Err(e) = handler.handle(task).await {
            error!(worker, error = %e, "task failed, worker exiting");
            return;
        }
    }
}
