//! Caller-supplied cancellation and deadlines for store operations.
//!
//! Every operation that talks to the key-value store runs under a
//! [`CallContext`]. When the context is cancelled, or its deadline passes,
//! the in-flight store future is dropped and the operation returns
//! [`StoreError::Cancelled`] or [`StoreError::DeadlineExceeded`].
//!
//! # Usage
//!
//! ```ignore
//! use tokenward::CallContext;
//!
//! let ctx = CallContext::background().with_timeout(Duration::from_millis(250));
//! let claims = manager.decode_token(&ctx, &key, TokenType::VerifyEmail).await?;
//! ```

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::store::{StoreError, StoreResult};

/// Cancellation signal plus an optional deadline.
///
/// Cloning is cheap; clones share the same cancellation token.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// A context that is never cancelled and has no deadline.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// Uses `token` as the cancellation signal.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Sets an absolute deadline, keeping the earlier one if already set.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// Sets a deadline `timeout` from now.
    ///
    /// A timeout too large to be represented as a deadline leaves the
    /// context unchanged.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    /// Returns the cancellation token, e.g. to cancel from another task.
    #[must_use]
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Returns the deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns `true` if the context has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Returns a copy that gets a deadline `timeout` from now if it has none.
    #[must_use]
    pub(crate) fn or_timeout(&self, timeout: Option<Duration>) -> Self {
        match (self.deadline, timeout) {
            (None, Some(timeout)) => self.clone().with_timeout(timeout),
            _ => self.clone(),
        }
    }

    /// Drives `operation` until it completes, the context is cancelled, or
    /// the deadline passes, whichever comes first.
    ///
    /// # Errors
    ///
    /// Returns the operation's own error, `StoreError::Cancelled`, or
    /// `StoreError::DeadlineExceeded`.
    pub async fn run<T, F>(&self, operation: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        if self.cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(StoreError::Cancelled),
            _ = wait_until(self.deadline) => Err(StoreError::DeadlineExceeded),
            result = operation => result,
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
