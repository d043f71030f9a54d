//! Caller-supplied cancellation and deadline context.
//!
//! A [`Context`] is created by whoever receives the request and is handed,
//! unmodified, to every storage call the engine makes on its behalf.  The
//! store checks it before each statement and before committing, so an
//! abandoned request stops at the next I/O boundary and any open
//! transaction is rolled back.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::ContextError;

#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancelled: Option<Arc<AtomicBool>>,
}

/// Handle used by the caller to cancel every clone of a [`Context`].
#[derive(Debug, Clone)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }
}

impl Context {
    /// A context that never expires and cannot be cancelled.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derive a context that expires `timeout` from now.
    ///
    /// An existing earlier deadline is kept.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(existing) if existing < candidate => existing,
            _ => candidate,
        };
        Self {
            deadline: Some(deadline),
            cancelled: self.cancelled.clone(),
        }
    }

    /// Derive a cancellable context.
    pub fn with_cancel(&self) -> (Self, CancelHandle) {
        let flag = self
            .cancelled
            .clone()
            .unwrap_or_else(|| Arc::new(AtomicBool::new(false)));
        let ctx = Self {
            deadline: self.deadline,
            cancelled: Some(flag.clone()),
        };
        (ctx, CancelHandle { flag })
    }

    /// Time left before the deadline, if one is set.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Fail if the context has been cancelled or its deadline has passed.
    pub fn check(&self) -> Result<(), ContextError> {
        if let Some(flag) = &self.cancelled {
            if flag.load(Ordering::SeqCst) {
                return Err(ContextError::Cancelled);
            }
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(ContextError::DeadlineExceeded);
            }
        }
        Ok(())
    }
}
