//! Execution seams consumed by the pool: cancellable spawning and
//! blocking-work delegation.

use std::future::Future;

use async_trait::async_trait;

use crate::core::error::TaskError;
use crate::core::task::BlockingJob;

/// Handle to one running worker, able to cancel it from outside.
///
/// Cancellation is immediate and unconditional: a task in flight on the
/// cancelled worker is abandoned, its result handle never completed with
/// a value.
pub trait CancelHandle: Send + 'static {
    /// Request cancellation of the execution unit.
    fn cancel(&self);
    /// True once the unit has finished, by any path.
    fn is_finished(&self) -> bool;
}

/// Abstraction for creating cancellable concurrent execution units.
///
/// The pool spawns one unit per worker. Any scheduler able to run a
/// `'static` future and hand back a [`CancelHandle`] works; the default
/// is [`TokioSpawner`](crate::runtime::TokioSpawner).
pub trait Spawn: Send + Sync + 'static {
    /// Handle type returned for each spawned unit.
    type Handle: CancelHandle;

    /// Spawn a future as an independent execution unit.
    fn spawn<F>(&self, fut: F) -> Self::Handle
    where
        F: Future<Output = ()> + Send + 'static;
}

/// Abstraction for running a blocking function without stalling workers
/// that share the scheduler.
///
/// Workers delegate [`Job::Blocking`](crate::core::task::Job) payloads
/// here instead of running them inline.
#[async_trait]
pub trait BlockingExecutor: Send + Sync + 'static {
    /// Run `f` to completion off the cooperative scheduler.
    ///
    /// A panic inside `f` must be captured and returned as
    /// [`TaskError::Panicked`], never propagated.
    async fn run_blocking<R>(&self, f: BlockingJob<R>) -> Result<R, TaskError>
    where
        R: Send + 'static;
}
