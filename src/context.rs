use std::future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation signal and optional deadline shared by a chain of operations.
///
/// Child contexts observe the cancellation of their parent, and their deadline
/// is never later than the parent's. Cancelling a child does not affect the
/// parent.
///
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// Root context, never cancelled unless `cancel` is called and without a
    /// deadline.
    ///
    pub fn background() -> Self {
        Self::default()
    }

    /// Derives a child context that expires at `deadline`, or at the parent's
    /// deadline if that comes first.
    ///
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(parent) => parent.min(deadline),
            None => deadline,
        };

        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    /// Derives a child context that expires after `timeout` from now.
    ///
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            // Too far in the future to represent, only the parent can expire.
            None => Self {
                token: self.token.child_token(),
                deadline: self.deadline,
            },
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancels this context and every context derived from it.
    ///
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes once the context is cancelled.
    ///
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// Completes once the deadline is reached. Never completes for contexts
    /// without a deadline.
    ///
    pub async fn expired(&self) {
        match self.deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => future::pending::<()>().await,
        }
    }
}
