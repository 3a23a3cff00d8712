//! Error types for pool lifecycle and per-task outcomes.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Reason a submission was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unavailable {
    /// The pool is paused; submission is gated until resumed.
    Paused,
    /// The pool has been closed; terminal.
    Closed,
    /// The task queue is at capacity and the caller asked not to wait.
    QueueFull,
}

impl fmt::Display for Unavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Paused => write!(f, "pool is paused"),
            Self::Closed => write!(f, "pool is closed"),
            Self::QueueFull => write!(f, "task queue is full"),
        }
    }
}

/// Outcome stored into a task's result handle when execution did not
/// produce a value.
///
/// These are per-task failures: they stay local to the offending task's
/// handle and never affect the worker or the pool.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The job kind cannot be run on this pool (a blocking job was
    /// submitted but no blocking executor is configured).
    #[error("unsupported task kind for this pool")]
    UnknownTaskType,
    /// The task function panicked; the payload message is captured.
    #[error("task panicked: {0}")]
    Panicked(String),
    /// The worker executing the task was hard-cancelled before it could
    /// complete the handle.
    #[error("task abandoned by a cancelled worker")]
    Abandoned,
}

/// Errors raised at the call site of pool lifecycle operations.
#[derive(Debug, Error)]
pub enum PoolError {
    /// Submission rejected because the pool is paused, closed, or full.
    #[error("pool not available: {0}")]
    NotAvailable(Unavailable),
    /// Graceful close did not finish draining within its timeout.
    /// Surfaced only when the caller opted out of safe close.
    #[error("pool close timed out after {0:?}")]
    CloseTimeout(Duration),
    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A blocking-style submission re-raises the captured task failure.
    #[error(transparent)]
    Task(#[from] TaskError),
}

impl PoolError {
    /// True when this error is a `NotAvailable` rejection, whatever the reason.
    #[must_use]
    pub const fn is_not_available(&self) -> bool {
        matches!(self, Self::NotAvailable(_))
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_display() {
        assert_eq!(format!("{}", Unavailable::Paused), "pool is paused");
        assert_eq!(format!("{}", Unavailable::Closed), "pool is closed");
        assert_eq!(format!("{}", Unavailable::QueueFull), "task queue is full");
    }

    #[test]
    fn test_pool_error_display() {
        let err = PoolError::NotAvailable(Unavailable::Closed);
        assert_eq!(format!("{err}"), "pool not available: pool is closed");
        assert!(err.is_not_available());

        let err = PoolError::CloseTimeout(Duration::from_secs(3));
        assert_eq!(format!("{err}"), "pool close timed out after 3s");
        assert!(!err.is_not_available());
    }

    #[test]
    fn test_task_error_propagates_into_pool_error() {
        let err: PoolError = TaskError::Panicked("boom".into()).into();
        assert_eq!(format!("{err}"), "task panicked: boom");
    }
}
