//! Bounded pool of async workers draining a FIFO job queue.
//!
//! The transport hands each fragment to the pool and returns immediately.
//! At most `size` jobs run at once; the rest wait in submission order.

use futures::FutureExt;
use futures::future::BoxFuture;
use recgather_core::error::{RecgatherError, Result};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

type Job = BoxFuture<'static, ()>;

/// Fixed-size worker pool.
///
/// Must be created inside a tokio runtime.
pub struct WorkerPool {
    sender: mpsc::UnboundedSender<Job>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `size` workers (at least one).
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        let (sender, receiver) = mpsc::unbounded_channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..size)
            .map(|worker_id| {
                let receiver = Arc::clone(&receiver);
                tokio::spawn(async move {
                    loop {
                        // The lock is held only while taking the next job.
                        let job = { receiver.lock().await.recv().await };
                        let Some(job) = job else {
                            break;
                        };
                        if AssertUnwindSafe(job).catch_unwind().await.is_err() {
                            tracing::error!("[WorkerPool] Job panicked on worker {}", worker_id);
                        }
                    }
                    tracing::debug!("[WorkerPool] Worker {} stopped", worker_id);
                })
            })
            .collect();

        tracing::debug!("[WorkerPool] Started {} workers", size);
        Self { sender, workers }
    }

    /// Number of workers.
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Queues `job` without waiting for it to start.
    ///
    /// # Errors
    ///
    /// Returns an `Internal` error if every worker has stopped.
    pub fn submit<F>(&self, job: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.sender
            .send(job.boxed())
            .map_err(|_| RecgatherError::internal("worker pool is shut down"))
    }

    /// Stops accepting jobs and waits until every queued job has run.
    pub async fn shutdown(self) {
        let Self { sender, workers } = self;
        drop(sender);
        for worker in workers {
            if let Err(e) = worker.await {
                tracing::error!("[WorkerPool] Worker failed to stop cleanly: {}", e);
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
    async fn test_runs_all_jobs_before_shutdown_returns() {
        let pool = WorkerPool::new(3);
        let done = Arc::new(AtomicUsize::new(0));

        for _ in 0..20 {
            let done = Arc::clone(&done);
            pool.submit(async move {
                done.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }
        pool.shutdown().await;

        assert_eq!(done.load(Ordering::SeqCst), 20);
    }

    #[tokio::test]
    async fn test_single_worker_runs_in_submission_order() {
        let pool = WorkerPool::new(1);
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));

        for i in 0..10 {
            let order = Arc::clone(&order);
            pool.submit(async move {
                tokio::task::yield_now().await;
                order.lock().unwrap().push(i);
            })
            .unwrap();
        }
        pool.shutdown().await;

        assert_eq!(*order.lock().unwrap(), (0..10).collect::<Vec<_>>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_is_bounded_by_size() {
        let pool = WorkerPool::new(2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        for _ in 0..8 {
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            pool.submit(async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                running.fetch_sub(1, Ordering::SeqCst);
            })
            .unwrap();
        }
        pool.shutdown().await;

        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_panicking_job_does_not_kill_worker() {
        let pool = WorkerPool::new(1);
        let done = Arc::new(AtomicUsize::new(0));

        pool.submit(async {
            if true {
                panic!("boom");
            }
        })
        .unwrap();
        let counter = Arc::clone(&done);
        pool.submit(async move {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        pool.shutdown().await;

        assert_eq!(done.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_size_gets_one_worker() {
        let pool = WorkerPool::new(0);
        assert_eq!(pool.size(), 1);
        pool.shutdown().await;
    }
}
