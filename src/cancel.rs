//! Cancellation and deadlines for object store calls
//!
//! A [`Cancellation`] travels with every log operation and is forwarded to
//! each store call. It resolves when its token is cancelled or when its
//! deadline passes, whichever happens first.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why an operation was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The token was cancelled by the caller.
    Cancelled,
    /// The deadline passed before the call completed.
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Cancelled => write!(f, "cancelled"),
            CancelReason::DeadlineExceeded => write!(f, "deadline exceeded"),
        }
    }
}

/// Cancellation signal plus an optional absolute deadline.
///
/// Cloning shares the underlying token: cancelling any clone cancels all.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Cancellation {
    /// A signal that never fires unless [`Cancellation::cancel`] is called.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing token, e.g. one shared with a shutdown handler.
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Set a deadline `timeout` from now. An earlier deadline is kept.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Set an absolute deadline. An earlier deadline is kept.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// The underlying token.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancel this signal and every clone of it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Fails immediately if the signal has already fired.
    pub fn check(&self) -> Result<(), CancelReason> {
        if self.token.is_cancelled() {
            return Err(CancelReason::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(CancelReason::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Drive `fut` to completion unless the signal fires first.
    ///
    /// When the signal wins, `fut` is dropped. Whatever side effect it had
    /// already started on the remote end may or may not have happened.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, CancelReason> {
        self.check()?;
        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                _ = self.token.cancelled() => Err(CancelReason::Cancelled),
                _ = tokio::time::sleep_until(deadline) => Err(CancelReason::DeadlineExceeded),
                out = fut => Ok(out),
            },
            None => tokio::select! {
                biased;
                _ = self.token.cancelled() => Err(CancelReason::Cancelled),
                out = fut => Ok(out),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_completes_without_signal() {
        let cancel = Cancellation::new();
        let out = cancel.run(async { 7 }).await;
        assert_eq!(out, Ok(7));
    }

    #[tokio::test]
    async fn test_cancelled_token_short_circuits() {
        let cancel = Cancellation::new();
        cancel.cancel();
        assert_eq!(cancel.check(), Err(CancelReason::Cancelled));
        let out = cancel.run(async { 7 }).await;
        assert_eq!(out, Err(CancelReason::Cancelled));
    }

    #[tokio::test]
    async fn test_clone_shares_token() {
        let cancel = Cancellation::new();
        let clone = cancel.clone();
        clone.cancel();
        assert!(cancel.token().is_cancelled());
    }

    #[tokio::test]
    async fn test_deadline_interrupts_pending_future() {
        let cancel = Cancellation::new().with_timeout(Duration::from_millis(20));
        let out = cancel.run(std::future::pending::<()>()).await;
        assert_eq!(out, Err(CancelReason::DeadlineExceeded));
    }

    #[tokio::test]
    async fn test_earlier_deadline_is_kept() {
        let now = Instant::now();
        let cancel = Cancellation::new()
            .with_deadline(now + Duration::from_secs(1))
            .with_deadline(now + Duration::from_secs(10));
        assert_eq!(cancel.deadline(), Some(now + Duration::from_secs(1)));
    }

    #[tokio::test]
    async fn test_cancel_interrupts_pending_future() {
        let cancel = Cancellation::new();
        let trigger = cancel.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });
        let out = cancel.run(std::future::pending::<()>()).await;
        assert_eq!(out, Err(CancelReason::Cancelled));
        handle.await.unwrap();
    }
}
