//! Execution context: deadline and cancellation for a single call.
//!
//! Clones share the cancellation flag, so a context handed to a worker thread
//! can be cancelled from the caller's side.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{ApiError, Result};

#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

impl Context {
    /// A context that never expires and is only cancelled explicitly.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Time left before the deadline, saturating at zero. `None` without a
    /// deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Fail if the context is cancelled or its deadline has passed.
    /// Cancellation wins when both hold.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(ApiError::Cancelled);
        }
        match self.remaining() {
            Some(left) if left.is_zero() => Err(ApiError::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_is_live() {
        let ctx = Context::background();
        assert!(ctx.check().is_ok());
        assert!(ctx.remaining().is_none());
        assert!(ctx.deadline().is_none());
    }

    #[test]
    fn cancel_is_shared_between_clones() {
        let ctx = Context::background();
        let handle = ctx.clone();
        handle.cancel();
        assert!(ctx.is_cancelled());
        assert_eq!(ctx.check(), Err(ApiError::Cancelled));
    }

    #[test]
    fn elapsed_deadline_fails_check() {
        let ctx = Context::with_deadline(Instant::now());
        assert_eq!(ctx.remaining(), Some(Duration::ZERO));
        assert_eq!(ctx.check(), Err(ApiError::DeadlineExceeded));
    }

    #[test]
    fn future_deadline_passes_check() {
        let ctx = Context::with_timeout(Duration::from_secs(60));
        assert!(ctx.check().is_ok());
        assert!(ctx.remaining().unwrap() > Duration::from_secs(50));
    }

    #[test]
    fn cancellation_takes_precedence_over_deadline() {
        let ctx = Context::with_deadline(Instant::now());
        ctx.cancel();
        assert_eq!(ctx.check(), Err(ApiError::Cancelled));
    }
}
