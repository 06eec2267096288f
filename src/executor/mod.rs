//! Bounded worker pool for the process-driving stages.
//!
//! A stage hands the executor a list of independent items and an operation
//! that turns one item into a success flag. Items are pulled by a fixed
//! number of scoped worker threads; completions flow back over a channel
//! and are observed on the calling thread in the order they finish.

pub mod cancel;
pub mod gate;

pub use cancel::CancelToken;
pub use gate::{AdmissionGate, GatePermit};

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::{Duration, Instant};

use crossbeam::channel;

/// Completion notice for one item, delivered in completion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemCompletion {
    /// Position of the item in the stage's input list
    pub index: usize,
    pub success: bool,
}

/// Aggregate result of one stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageSummary {
    pub name: String,
    pub total: usize,
    pub attempted: usize,
    pub succeeded: usize,
    /// Items never dispatched because the run was cancelled
    pub skipped: usize,
    pub elapsed: Duration,
}

impl StageSummary {
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            total: 0,
            attempted: 0,
            succeeded: 0,
            skipped: 0,
            elapsed: Duration::ZERO,
        }
    }

    pub fn failed(&self) -> usize {
        self.attempted - self.succeeded
    }

    /// Fraction of attempted items that succeeded; 1.0 for an empty stage.
    pub fn success_rate(&self) -> f64 {
        if self.attempted == 0 {
            1.0
        } else {
            self.succeeded as f64 / self.attempted as f64
        }
    }
}

/// Runs stage items on a fixed number of worker threads.
#[derive(Debug, Clone)]
pub struct StageExecutor {
    workers: usize,
    cancel: CancelToken,
}

impl StageExecutor {
    pub fn new(workers: usize, cancel: CancelToken) -> Self {
        Self {
            workers: workers.max(1),
            cancel,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn run_stage<T, F>(&self, name: &str, items: Vec<T>, op: F) -> StageSummary
    where
        T: Send,
        F: Fn(T) -> bool + Sync,
    {
        self.run_stage_with(name, items, op, |_| {})
    }

    /// Run `op` over every item, calling `on_complete` as each one finishes.
    ///
    /// A failing or panicking item never stops its siblings. Once the cancel
    /// token is set no further items are handed out; those are reported as
    /// skipped.
    pub fn run_stage_with<T, F, C>(
        &self,
        name: &str,
        items: Vec<T>,
        op: F,
        mut on_complete: C,
    ) -> StageSummary
    where
        T: Send,
        F: Fn(T) -> bool + Sync,
        C: FnMut(ItemCompletion),
    {
        let started = Instant::now();
        let total = items.len();
        let mut summary = StageSummary::empty(name);
        summary.total = total;
        if total == 0 {
            return summary;
        }

        let worker_count = self.workers.min(total);
        // Rendezvous channel: an item is dispatched only when a worker is idle
        let (job_tx, job_rx) = channel::bounded::<(usize, T)>(0);
        let (done_tx, done_rx) = channel::unbounded::<ItemCompletion>();
        let cancel = &self.cancel;
        let op = &op;

        std::thread::scope(|s| {
            s.spawn(move || {
                for (index, item) in items.into_iter().enumerate() {
                    if cancel.is_cancelled() {
                        log::debug!("{name}: cancelled, {} items not dispatched", total - index);
                        break;
                    }
                    if job_tx.send((index, item)).is_err() {
                        break;
                    }
                }
            });

            for _ in 0..worker_count {
                let job_rx = job_rx.clone();
                let done_tx = done_tx.clone();
                s.spawn(move || {
                    for (index, item) in job_rx.iter() {
                        let success = catch_unwind(AssertUnwindSafe(|| op(item))).unwrap_or_else(|_| {
                            log::warn!("{name}: item {index} panicked");
                            false
                        });
                        if done_tx.send(ItemCompletion { index, success }).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(job_rx);
            drop(done_tx);

            for completion in done_rx.iter() {
                summary.attempted += 1;
                if completion.success {
                    summary.succeeded += 1;
                }
                on_complete(completion);
            }
        });

        summary.skipped = total - summary.attempted;
        summary.elapsed = started.elapsed();
        log::debug!(
            "{name}: {}/{} succeeded, {} skipped in {:.2?}",
            summary.succeeded,
            summary.attempted,
            summary.skipped,
            summary.elapsed
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_all_items_observed() {
        let executor = StageExecutor::new(4, CancelToken::new());
        let mut seen = Vec::new();
        let summary = executor.run_stage_with(
            "square",
            (0..20).collect(),
            |n: usize| n % 3 != 0,
            |c| seen.push(c.index),
        );

        assert_eq!(summary.total, 20);
        assert_eq!(summary.attempted, 20);
        assert_eq!(summary.succeeded, 13);
        assert_eq!(summary.failed(), 7);
        assert_eq!(summary.skipped, 0);
        seen.sort_unstable();
        assert_eq!(seen, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_panicking_item_is_a_failure() {
        let executor = StageExecutor::new(2, CancelToken::new());
        let summary = executor.run_stage("explode", vec![1, 2, 3], |n: i32| {
            if n == 2 {
                panic!("boom");
            }
            true
        });
        assert_eq!(summary.attempted, 3);
        assert_eq!(summary.succeeded, 2);
    }

    #[test]
    fn test_cancelled_before_start_skips_everything() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let executor = StageExecutor::new(2, cancel);
        let calls = AtomicUsize::new(0);
        let summary = executor.run_stage("noop", vec![(); 5], |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            true
        });
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(summary.skipped, 5);
        assert_eq!(summary.attempted, 0);
    }

    #[test]
    fn test_cancel_mid_stage_stops_dispatch() {
        let cancel = CancelToken::new();
        let executor = StageExecutor::new(1, cancel.clone());
        let summary = executor.run_stage("stop", (0..10).collect(), |n: usize| {
            if n == 2 {
                cancel.cancel();
            }
            true
        });
        assert!(summary.attempted >= 3);
        assert!(summary.attempted < 10);
        assert_eq!(summary.attempted + summary.skipped, 10);
    }

    #[test]
    fn test_empty_stage() {
        let executor = StageExecutor::new(3, CancelToken::new());
        let summary = executor.run_stage("empty", Vec::<u8>::new(), |_| true);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.success_rate(), 1.0);
    }

    #[test]
    fn test_worker_floor() {
        assert_eq!(StageExecutor::new(0, CancelToken::new()).workers(), 1);
    }
}
