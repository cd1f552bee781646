//! Fixed-interval write throttler.
//!
//! Zendesk enforces a per-second write quota, so bulk migrations funnel their
//! submissions through a single worker that dispatches queued tasks FIFO with
//! a minimum delay between them. Nothing is dropped: every scheduled task
//! eventually runs, and a failing task never stops the ones behind it.

use futures::FutureExt;
use futures::future::BoxFuture;
use log::{debug, warn};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Notify, mpsc};
use tokio::time::sleep;

/// Pacing configuration for bulk write operations.
#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    pub min_delay: Duration,
    pub enabled: bool,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_secs(1),
            enabled: true,
        }
    }
}

/// Serialized, paced task executor.
///
/// Tasks run on one worker in submission order; the n-th task is dispatched
/// no earlier than n × `min_delay` after the first. There is no cancellation:
/// once scheduled, a task will run.
#[derive(Clone)]
pub struct Throttler {
    tx: mpsc::UnboundedSender<BoxFuture<'static, ()>>,
    pending: Arc<AtomicUsize>,
    drained: Arc<Notify>,
}

impl Throttler {
    pub fn new(config: ThrottleConfig) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<BoxFuture<'static, ()>>();
        let pending = Arc::new(AtomicUsize::new(0));
        let drained = Arc::new(Notify::new());

        let delay = if config.enabled {
            config.min_delay
        } else {
            Duration::ZERO
        };
        let worker_pending = Arc::clone(&pending);
        let worker_drained = Arc::clone(&drained);

        tokio::spawn(async move {
            while let Some(task) = rx.recv().await {
                // A panicking task must not take the worker down with it.
                if std::panic::AssertUnwindSafe(task)
                    .catch_unwind()
                    .await
                    .is_err()
                {
                    warn!("throttled task panicked; continuing with the queue");
                }

                if worker_pending.fetch_sub(1, Ordering::SeqCst) == 1 {
                    worker_drained.notify_waiters();
                }

                if !delay.is_zero() {
                    sleep(delay).await;
                }
            }
            debug!("throttler worker shutting down");
        });

        Self {
            tx,
            pending,
            drained,
        }
    }

    /// Enqueue a task for eventual execution. Tasks report their own
    /// failures; the throttler only guarantees ordering and pacing.
    pub fn schedule<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.pending.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(Box::pin(task)).is_err() {
            // Worker is gone; only possible during runtime shutdown.
            self.pending.fetch_sub(1, Ordering::SeqCst);
        }
    }

    /// Number of scheduled tasks that have not finished yet.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Resolve once every scheduled task has finished.
    pub async fn idle(&self) {
        loop {
            let notified = self.drained.notified();
            if self.pending.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Instant;

    fn throttler(delay_ms: u64, enabled: bool) -> Throttler {
        Throttler::new(ThrottleConfig {
            min_delay: Duration::from_millis(delay_ms),
            enabled,
        })
    }

    #[tokio::test]
    async fn tasks_run_fifo_with_minimum_spacing() {
        let throttler = throttler(100, true);
        let timestamps: Arc<Mutex<Vec<(usize, Instant)>>> = Arc::new(Mutex::new(Vec::new()));

        for n in 0..3 {
            let timestamps = Arc::clone(&timestamps);
            throttler.schedule(async move {
                timestamps.lock().unwrap().push((n, Instant::now()));
            });
        }
        throttler.idle().await;

        let timestamps = timestamps.lock().unwrap();
        assert_eq!(
            timestamps.iter().map(|(n, _)| *n).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        // Allow scheduler jitter but require the pacing gap.
        for pair in timestamps.windows(2) {
            let gap = pair[1].1.duration_since(pair[0].1);
            assert!(gap >= Duration::from_millis(90), "gap too small: {gap:?}");
        }
    }

    #[tokio::test]
    async fn tight_loop_scheduling_executes_everything() {
        let throttler = throttler(1, true);
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..20 {
            let counter = Arc::clone(&counter);
            throttler.schedule(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        throttler.idle().await;

        assert_eq!(counter.load(Ordering::SeqCst), 20);
        assert_eq!(throttler.pending(), 0);
    }

    #[tokio::test]
    async fn disabled_throttle_runs_without_delay() {
        let throttler = throttler(10_000, false);
        let counter = Arc::new(AtomicUsize::new(0));

        let start = Instant::now();
        for _ in 0..5 {
            let counter = Arc::clone(&counter);
            throttler.schedule(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        throttler.idle().await;

        assert_eq!(counter.load(Ordering::SeqCst), 5);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn panicking_task_does_not_halt_the_queue() {
        let throttler = throttler(1, true);
        let counter = Arc::new(AtomicUsize::new(0));

        throttler.schedule(async {
            panic!("boom");
        });
        let survivor = Arc::clone(&counter);
        throttler.schedule(async move {
            survivor.fetch_add(1, Ordering::SeqCst);
        });
        throttler.idle().await;

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn idle_returns_immediately_when_nothing_is_queued() {
        let throttler = throttler(1000, true);
        let start = Instant::now();
        throttler.idle().await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }
}
