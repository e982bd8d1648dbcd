use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;

/// Fixed-width, order-preserving fan-out. Each `run` call gets its own
/// semaphore, so the width bounds one batch at a time.
#[derive(Debug, Clone, Copy)]
pub struct BoundedPool {
    limit: usize,
}

impl BoundedPool {
    /// A zero limit is raised to 1.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
        }
    }

    #[must_use]
    pub fn limit(self) -> usize {
        self.limit
    }

    /// Apply `task` to every item, returning outputs in input order.
    pub async fn run<T, F, Fut>(&self, items: Vec<T>, task: F) -> Vec<Fut::Output>
    where
        F: Fn(T) -> Fut,
        Fut: Future,
    {
        let semaphore = Arc::new(Semaphore::new(self.limit));
        let task = &task;
        let jobs = items.into_iter().map(|item| {
            let semaphore = Arc::clone(&semaphore);
            async move {
                // Never closed, so this always yields a permit.
                let _permit = semaphore.acquire_owned().await.ok();
                task(item).await
            }
        });
        join_all(jobs).await
    }
}
