//! Task scheduler (§4.C): registers `(interval, callback)` pairs, launches
//! each on its own worker at startup, and never runs two instances of the
//! same callback concurrently. A zero interval means the callback owns its
//! own long-running loop (e.g. the matcher, which already ticks internally);
//! a non-zero interval means the scheduler itself invokes the callback every
//! `interval` and awaits completion before the next tick.
//!
//! Cancellation is a single root `CancellationToken` (§5, §9) threaded into
//! every callback, the same cooperative-shutdown shape `EventListener::start`
//! selects on, generalized from one bespoke loop into a registry of many.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A schedulable unit of work.
#[async_trait]
pub trait ScheduledTask: Send + Sync {
    /// Human-readable name, used only for logging.
    fn name(&self) -> &str;

    /// Run one invocation (interval != 0) or the whole long-running loop
    /// (interval == 0). Must return promptly once `cancel` fires.
    async fn run(&self, cancel: CancellationToken);
}

struct Registration {
    interval: Duration,
    task: Arc<dyn ScheduledTask>,
}

/// Registry of scheduled tasks, launched together and torn down together.
#[derive(Default)]
pub struct TaskScheduler {
    registrations: Vec<Registration>,
}

impl TaskScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback to run every `interval`, or — if `interval` is
    /// `Duration::ZERO` — as a single long-running task launched once at
    /// startup.
    pub fn register(&mut self, interval: Duration, task: Arc<dyn ScheduledTask>) {
        self.registrations.push(Registration { interval, task });
    }

    /// Launch every registered task concurrently, each on its own worker,
    /// sharing `root`. Returns the join handles so the caller can await
    /// graceful shutdown after cancelling `root`.
    pub fn start(self, root: CancellationToken) -> Vec<JoinHandle<()>> {
        self.registrations
            .into_iter()
            .map(|reg| {
                let cancel = root.clone();
                tokio::spawn(async move {
                    if reg.interval.is_zero() {
                        tracing::info!(task = reg.task.name(), "starting long-running task");
                        reg.task.run(cancel).await;
                        return;
                    }

                    tracing::info!(
                        task = reg.task.name(),
                        interval_secs = reg.interval.as_secs(),
                        "starting periodic task"
                    );
                    let mut ticker = tokio::time::interval(reg.interval);
                    loop {
                        tokio::select! {
                            _ = cancel.cancelled() => {
                                tracing::info!(task = reg.task.name(), "task cancelled");
                                return;
                            }
                            _ = ticker.tick() => {
                                // Awaited in place: the next tick can't fire
                                // until this invocation returns, so the same
                                // callback never runs concurrently with itself.
                                reg.task.run(cancel.clone()).await;
                            }
                        }
                    }
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingTask {
        name: String,
        count: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ScheduledTask for CountingTask {
        fn name(&self) -> &str {
            &self.name
        }

        async fn run(&self, _cancel: CancellationToken) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn periodic_task_runs_more_than_once_then_stops_on_cancel() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut scheduler = TaskScheduler::new();
        scheduler.register(
            Duration::from_millis(10),
            Arc::new(CountingTask {
                name: "counter".to_string(),
                count: count.clone(),
            }),
        );

        let root = CancellationToken::new();
        let handles = scheduler.start(root.clone());

        tokio::time::sleep(Duration::from_millis(45)).await;
        root.cancel();
        for h in handles {
            let _ = h.await;
        }

        assert!(count.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn zero_interval_task_runs_exactly_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut scheduler = TaskScheduler::new();
        scheduler.register(
            Duration::ZERO,
            Arc::new(CountingTask {
                name: "once".to_string(),
                count: count.clone(),
            }),
        );

        let root = CancellationToken::new();
        let handles = scheduler.start(root.clone());
        for h in handles {
            let _ = h.await;
        }

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
