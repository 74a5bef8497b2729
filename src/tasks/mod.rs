use crate::context::Context;
use crate::prelude::{Error, Result};
use crate::proxmox::JobStatusFetcher;
use crate::proxmox::types::{TaskStatus, UniqueProcessId};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Final state of a wait on a remote task.
///
#[derive(Debug)]
pub enum WaitOutcome {
    /// Task stopped with the `"OK"` exit code.
    Completed,
    /// Task stopped with any other exit code.
    Failed(String),
    /// Deadline reached while the task was still running.
    TimedOut(Duration),
    /// Ambient context cancelled before the task finished.
    Cancelled(Duration),
    /// Status query itself failed.
    QueryError(Error),
}

impl WaitOutcome {
    /// Converts the outcome into the crate-wide `Result`, attaching the task
    /// identifier to every error.
    ///
    pub fn into_result(self, job: &UniqueProcessId) -> Result<()> {
        let job = job.clone();
        match self {
            WaitOutcome::Completed => Ok(()),
            WaitOutcome::Failed(exit_code) => Err(Error::JobFailed { job, exit_code }),
            WaitOutcome::TimedOut(elapsed) => Err(Error::TimedOut { job, elapsed }),
            WaitOutcome::Cancelled(elapsed) => Err(Error::Cancelled { job, elapsed }),
            WaitOutcome::QueryError(source) => Err(Error::Query {
                job,
                source: Box::new(source),
            }),
        }
    }
}

/// Polling state machine. `Fetching` and `Sleeping` together form the
/// polling phase, `Done` holds one of the terminal states.
///
enum WaitState {
    Fetching,
    Sleeping,
    Done(WaitOutcome),
}

/// Blocks until a remote task reaches a terminal state, the deadline elapses,
/// or the ambient context is cancelled.
///
/// Status queries run strictly one after another with a constant pause
/// between the end of one query and the start of the next. Only a "still
/// running" status is retried; a failed query ends the wait immediately.
///
#[derive(Clone)]
pub struct TaskWaiter {
    fetcher: Arc<dyn JobStatusFetcher + Send + Sync>,
}

impl TaskWaiter {
    pub fn new(fetcher: Arc<dyn JobStatusFetcher + Send + Sync>) -> Self {
        Self { fetcher }
    }

    /// Waits for `job` to complete.
    ///
    /// # Arguments
    ///
    /// * `ctx`: Ambient context. Its cancellation and deadline both apply.
    /// * `job`: Task to wait for.
    /// * `timeout`: Maximum duration of the wait, must be non-zero.
    /// * `poll_interval`: Pause between two status queries, must be non-zero.
    ///
    /// # Returns
    ///
    /// An empty `Result` once the task completed successfully. Otherwise one
    /// of `Error::JobFailed`, `Error::TimedOut`, `Error::Cancelled` or
    /// `Error::Query`.
    ///
    pub async fn wait(
        &self,
        ctx: &Context,
        job: &UniqueProcessId,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<()> {
        self.wait_outcome(ctx, job, timeout, poll_interval)
            .await?
            .into_result(job)
    }

    /// Same as [`TaskWaiter::wait`], but returns the classified outcome
    /// instead of an error. Fails only on invalid arguments.
    ///
    #[tracing::instrument(
        level = "debug",
        target = "task",
        skip_all,
        fields(%job, ?timeout, ?poll_interval)
    )]
    pub async fn wait_outcome(
        &self,
        ctx: &Context,
        job: &UniqueProcessId,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<WaitOutcome> {
        if timeout.is_zero() {
            return Err(Error::InvalidArgument("timeout must be positive".to_owned()));
        }
        if poll_interval.is_zero() {
            return Err(Error::InvalidArgument(
                "poll interval must be positive".to_owned(),
            ));
        }

        // Elapsed time and deadline share one origin, so a timed out wait
        // never reports less than `timeout`.
        let start = Instant::now();
        let ctx = match start.checked_add(timeout) {
            Some(deadline) => ctx.with_deadline(deadline),
            None => ctx.with_timeout(timeout),
        };
        let mut fetches = 0_u32;
        let mut state = WaitState::Fetching;

        let outcome = loop {
            state = match state {
                WaitState::Fetching => {
                    fetches += 1;
                    self.fetch(&ctx, job, start).await
                }
                WaitState::Sleeping => Self::sleep(&ctx, start, poll_interval).await,
                WaitState::Done(outcome) => break outcome,
            };
        };

        match &outcome {
            WaitOutcome::Completed => {
                tracing::info!(target: "task", fetches, "Task completed")
            }
            WaitOutcome::Failed(exit_code) => {
                tracing::error!(target: "task", fetches, %exit_code, "Task failed")
            }
            WaitOutcome::TimedOut(elapsed) => {
                tracing::warn!(target: "task", fetches, ?elapsed, "Timed out waiting for task")
            }
            WaitOutcome::Cancelled(elapsed) => {
                tracing::warn!(target: "task", fetches, ?elapsed, "Wait for task cancelled")
            }
            WaitOutcome::QueryError(error) => {
                tracing::error!(target: "task", fetches, %error, "Failed to query task status")
            }
        }

        Ok(outcome)
    }

    /// Issues one status query and classifies the answer.
    ///
    /// A query that completes is preferred over a deadline that expires while
    /// it is in flight, so even a tiny timeout observes at least one status.
    ///
    async fn fetch(&self, ctx: &Context, job: &UniqueProcessId, start: Instant) -> WaitState {
        let result = tokio::select! {
            biased;
            _ = ctx.cancelled() => return WaitState::Done(WaitOutcome::Cancelled(start.elapsed())),
            result = self.fetcher.fetch(job) => result,
            _ = ctx.expired() => return WaitState::Done(WaitOutcome::TimedOut(start.elapsed())),
        };

        let status = match result {
            Ok(status) => status,
            Err(error) => return WaitState::Done(WaitOutcome::QueryError(error)),
        };

        match status.classify() {
            TaskStatus::Pending => {
                tracing::debug!(target: "task", at = %status.timestamp, "Task still running");
                WaitState::Sleeping
            }
            TaskStatus::Completed => WaitState::Done(WaitOutcome::Completed),
            TaskStatus::Failed(exit_code) => WaitState::Done(WaitOutcome::Failed(exit_code)),
        }
    }

    /// Pauses between two queries. Cancellation and the deadline interrupt
    /// the pause right away.
    ///
    async fn sleep(ctx: &Context, start: Instant, poll_interval: Duration) -> WaitState {
        tokio::select! {
            biased;
            _ = ctx.cancelled() => WaitState::Done(WaitOutcome::Cancelled(start.elapsed())),
            _ = ctx.expired() => WaitState::Done(WaitOutcome::TimedOut(start.elapsed())),
            _ = tokio::time::sleep(poll_interval) => WaitState::Fetching,
        }
    }
}
