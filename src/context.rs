//! Per-call cancellation and deadlines
//!
//! Every service method takes a [`CallContext`] and hands it, unchanged, to
//! each repository call. Repositories check it before doing work and while
//! long statements run. Clones share the same cancellation flag, so a clone
//! kept by another thread can cancel an in-flight call.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::domain::TodoError;

/// Cancellation flag plus optional deadline for one logical operation
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CallContext {
    /// A context that never expires and is only cancelled explicitly
    pub fn background() -> Self {
        Self::default()
    }

    /// A context that expires `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// A context that expires at `deadline`
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: Some(deadline),
        }
    }

    /// Cancels this context and every clone of it
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `None` when there is no deadline
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Returns the error a caller should see if the operation must stop now
    pub fn err(&self) -> Option<TodoError> {
        if self.is_cancelled() {
            Some(TodoError::Cancelled)
        } else if self.is_expired() {
            Some(TodoError::DeadlineExceeded)
        } else {
            None
        }
    }

    /// Fails fast when the context is already cancelled or expired
    pub fn check(&self) -> Result<(), TodoError> {
        match self.err() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Returns true once the operation should stop
    pub fn should_abort(&self) -> bool {
        self.err().is_some()
    }
}
