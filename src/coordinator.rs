// src/coordinator.rs

//! Concurrent run coordinator.
//!
//! Fans out one task per resolved executable (bounded by a semaphore),
//! consumes completions as they arrive, and folds them into a single
//! process exit code:
//!
//! - spawn failure       -> 127, never downgraded afterwards
//! - first non-zero exit -> becomes the aggregate while it is still 0
//! - exit 0              -> never overwrites a failure
//!
//! A task fault (harness error, not a process outcome) does not abort the
//! run: every outstanding task is drained first, then the first fault is
//! returned instead of an exit code.

use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, error, info};

use crate::errors::Result;
use crate::exec::runner::ProcessRunner;
use crate::exec::task::{RunTask, TaskOutcome, run_one};

/// Exit code reported when an executable could not be started at all.
pub const SPAWN_FAILURE_CODE: i32 = 127;

/// Streaming fold over task outcomes, in completion order.
///
/// Guarded compare-and-set rather than sort-then-pick, so the precedence
/// rules hold no matter which order completions arrive in.
#[derive(Debug, Default)]
pub struct Aggregate {
    code: i32,
}

impl Aggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one outcome in.
    pub fn observe(&mut self, outcome: TaskOutcome) {
        match outcome {
            TaskOutcome::SpawnFailed => {
                self.code = SPAWN_FAILURE_CODE;
            }
            TaskOutcome::Exited(code) if code != 0 && self.code == 0 => {
                self.code = code;
            }
            TaskOutcome::Exited(_) => {}
        }
    }

    pub fn code(&self) -> i32 {
        self.code
    }
}

/// Run every task to completion, at most `parallelism` at a time, and
/// reduce the outcomes into one exit code.
///
/// Dispatch order is input order; completion order is whatever the
/// processes make of it. There are no retries, timeouts or cancellation:
/// once dispatched, each task runs its process to natural termination.
pub async fn run_all(
    runner: Arc<dyn ProcessRunner>,
    tasks: Vec<RunTask>,
    parallelism: usize,
) -> Result<i32> {
    let total = tasks.len();
    if total == 0 {
        return Ok(0);
    }

    let parallelism = parallelism.max(1);
    info!(targets = total, parallelism, "dispatching run tasks");

    let semaphore = Arc::new(Semaphore::new(parallelism));
    let (tx, mut rx) = mpsc::channel::<anyhow::Result<TaskOutcome>>(total);

    for task in tasks {
        let runner = Arc::clone(&runner);
        let semaphore = Arc::clone(&semaphore);
        let tx = tx.clone();

        tokio::spawn(async move {
            let result = match semaphore.acquire_owned().await {
                Ok(_permit) => run_one(runner.as_ref(), task).await,
                Err(err) => Err(anyhow::Error::new(err).context("acquiring run slot")),
            };
            // The receiver outlives every sender; if this fails there is
            // no coordinator left to report to.
            let _ = tx.send(result).await;
        });
    }

    // The channel closes once the last worker drops its sender clone;
    // that is what tells us every task has been drained.
    drop(tx);

    let mut aggregate = Aggregate::new();
    let mut fault: Option<anyhow::Error> = None;

    while let Some(result) = rx.recv().await {
        match result {
            Ok(outcome) => {
                debug!(?outcome, "task completed");
                aggregate.observe(outcome);
            }
            Err(err) => {
                error!(error = %err, "task fault; draining remaining tasks");
                if fault.is_none() {
                    fault = Some(err);
                }
            }
        }
    }

    if let Some(err) = fault {
        return Err(err.into());
    }
    Ok(aggregate.code())
}
