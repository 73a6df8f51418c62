//! Worker handle that spawns one background task per accepted build.
//!
//! Admission is unbounded by default, matching the reference behaviour; a
//! configured cap gates task execution through a semaphore without changing
//! the call contract.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

pub(crate) struct BuildWorkers {
    limit: Option<Arc<Semaphore>>,
}

impl BuildWorkers {
    pub(crate) fn new(max_active: Option<usize>) -> Self {
        Self {
            limit: max_active.map(|cap| Arc::new(Semaphore::new(cap))),
        }
    }

    /// Spawn the work, acquiring a permit inside the task so the caller never
    /// blocks on admission.
    pub(crate) fn spawn<F>(&self, work: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match &self.limit {
            None => tokio::spawn(work),
            Some(semaphore) => {
                let semaphore = Arc::clone(semaphore);
                tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await;
                    work.await;
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn unbounded_workers_run_everything() {
        let workers = BuildWorkers::new(None);
        let completed = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let completed = Arc::clone(&completed);
                workers.spawn(async move {
                    completed.fetch_add(1, Ordering::SeqCst);
                })
            })
            .collect();
        for handle in handles {
            handle.await.expect("worker task");
        }
        assert_eq!(completed.load(Ordering::SeqCst), 8);
    }

    #[tokio::test]
    async fn bounded_workers_never_exceed_the_cap() {
        let workers = BuildWorkers::new(Some(1));
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let running = Arc::clone(&running);
                let peak = Arc::clone(&peak);
                workers.spawn(async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();
        for handle in handles {
            handle.await.expect("worker task");
        }
        assert_eq!(peak.load(Ordering::SeqCst), 1, "cap of one must serialise");
    }
}
