//! Deferred execution of reply tasks.
//!
//! The orchestrator never awaits replies. It hands each one to a
//! [`ReplyScheduler`] together with a delay. In production that is
//! [`TokioScheduler`]; tests use [`ManualScheduler`] and drive the queue
//! themselves.

use std::sync::Mutex;
use std::time::Duration;

use futures_util::future::BoxFuture;
use parley_types::config::DelayRange;
use rand::Rng;
use tokio_util::task::TaskTracker;
use tracing::debug;

/// Runs a reply task after a delay. Fire-and-forget: no handle, no cancel.
pub trait ReplyScheduler: Send + Sync {
    fn schedule(&self, delay: Duration, task: BoxFuture<'static, ()>);
}

/// Spawns each task on the Tokio runtime after sleeping for its delay.
///
/// Tasks are tracked so shutdown can wait for already-scheduled replies.
#[derive(Debug, Clone, Default)]
pub struct TokioScheduler {
    tracker: TaskTracker,
}

impl TokioScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of replies still waiting or running.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Close the tracker and wait for every scheduled reply to finish.
    pub async fn drain(&self) {
        self.tracker.close();
        debug!(pending = self.tracker.len(), "draining scheduled replies");
        self.tracker.wait().await;
    }
}

impl ReplyScheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: BoxFuture<'static, ()>) {
        self.tracker.spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });
    }
}

/// Queues tasks in memory until a test runs them.
#[derive(Default)]
pub struct ManualScheduler {
    queue: Mutex<Vec<(Duration, BoxFuture<'static, ()>)>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued tasks.
    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    /// Delays of the queued tasks, in scheduling order.
    pub fn delays(&self) -> Vec<Duration> {
        self.lock().iter().map(|(delay, _)| *delay).collect()
    }

    /// Run every queued task to completion in scheduling order, ignoring delays.
    /// Returns how many ran.
    pub async fn run_all(&self) -> usize {
        let tasks: Vec<_> = std::mem::take(&mut *self.lock());
        let count = tasks.len();
        for (_, task) in tasks {
            task.await;
        }
        count
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(Duration, BoxFuture<'static, ()>)>> {
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ReplyScheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: BoxFuture<'static, ()>) {
        self.lock().push((delay, task));
    }
}

impl std::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("pending", &self.pending())
            .finish()
    }
}

/// Draw a delay uniformly from `range` (inclusive). Never zero.
pub fn sample_delay<R: Rng + ?Sized>(range: &DelayRange, rng: &mut R) -> Duration {
    let (min, max) = range.normalized();
    Duration::from_millis(rng.gen_range(min..=max))
}
