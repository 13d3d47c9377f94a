use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Worker pool is shut down")]
    ShutDown,

    #[error("Job failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Bounded pool of workers for fetch/parse/resolve jobs.
///
/// Jobs are spawned as tokio tasks immediately but each waits for one of `size` permits
/// before running, so at most `size` jobs make progress at once. Submitters decide where
/// to wait by joining the returned handles.
#[derive(Debug)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl WorkerPool {
    /// A pool with `size` workers (at least one)
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_shut_down(&self) -> bool {
        self.permits.is_closed()
    }

    /// Queue a job
    ///
    /// # Errors
    ///
    /// Returns `PoolError::ShutDown` once `shutdown` has been called.
    pub fn submit<T, Fut>(&self, job: Fut) -> Result<JobHandle<T>, PoolError>
    where
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        if self.is_shut_down() {
            return Err(PoolError::ShutDown);
        }
        let permits = Arc::clone(&self.permits);
        let inner = tokio::spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|_| PoolError::ShutDown)?;
            Ok(job.await)
        });
        Ok(JobHandle { inner })
    }

    /// Refuse further jobs. Jobs still waiting for a worker fail with `ShutDown`.
    pub fn shutdown(&self) {
        self.permits.close();
    }
}

/// Pending result of a submitted job
#[derive(Debug)]
pub struct JobHandle<T> {
    inner: JoinHandle<Result<T, PoolError>>,
}

impl<T> JobHandle<T> {
    /// Wait for the job
    ///
    /// # Errors
    ///
    /// Returns `PoolError::ShutDown` if the pool closed before the job ran, or
    /// `PoolError::Join` if the job panicked.
    pub async fn join(self) -> Result<T, PoolError> {
        self.inner.await?
    }
}

/// Barrier: wait for every handle, preserving submission order
pub async fn join_all<T>(handles: Vec<JobHandle<T>>) -> Vec<Result<T, PoolError>> {
    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.join().await);
    }
    results
}
