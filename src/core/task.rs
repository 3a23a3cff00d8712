//! Task representation and result-handle correlation.

use std::any::Any;
use std::future::Future;
use std::pin::Pin;

use tokio::sync::oneshot;

use crate::core::error::{PoolError, TaskError};

/// Unique identifier assigned to each submitted task.
pub type TaskId = u64;

/// Boxed future job payload.
pub type FutureJob<R> = Pin<Box<dyn Future<Output = R> + Send + 'static>>;

/// Boxed blocking-closure job payload.
pub type BlockingJob<R> = Box<dyn FnOnce() -> R + Send + 'static>;

/// A unit of work submitted to the pool.
///
/// Two kinds are supported: a cooperative future, executed inline on the
/// worker, and a blocking closure, delegated to the pool's blocking
/// executor so it cannot stall other workers sharing the runtime.
pub enum Job<R> {
    /// Cooperative job; awaited on the worker itself.
    Future(FutureJob<R>),
    /// Blocking job; handed to the configured [`BlockingExecutor`].
    ///
    /// [`BlockingExecutor`]: crate::core::executor::BlockingExecutor
    Blocking(BlockingJob<R>),
}

impl<R> Job<R> {
    /// Wrap a future as a cooperative job.
    pub fn future<F>(fut: F) -> Self
    where
        F: Future<Output = R> + Send + 'static,
    {
        Self::Future(Box::pin(fut))
    }

    /// Wrap a closure as a blocking job.
    pub fn blocking<F>(f: F) -> Self
    where
        F: FnOnce() -> R + Send + 'static,
    {
        Self::Blocking(Box::new(f))
    }
}

impl<R> std::fmt::Debug for Job<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Future(_) => f.write_str("Job::Future"),
            Self::Blocking(_) => f.write_str("Job::Blocking"),
        }
    }
}

/// Result delivered through a task's handle.
pub type TaskResult<R> = Result<R, TaskError>;

/// A task in flight: job plus the write half of its result handle.
///
/// Ownership of the write half transfers to the worker at dequeue time;
/// the worker completes it exactly once. If the worker is hard-cancelled
/// mid-task, the write half is dropped and the handle resolves as
/// [`TaskError::Abandoned`].
pub(crate) struct Task<R> {
    pub id: TaskId,
    pub job: Job<R>,
    pub reply: oneshot::Sender<TaskResult<R>>,
}

/// An item travelling through the task queue.
///
/// Control messages share the queue with work so that graceful shrink
/// obeys FIFO fairness: a close signal takes effect only after every
/// task enqueued before it has been dequeued. The tagged union removes
/// any ambiguity about sentinel identity.
pub(crate) enum QueueItem<R> {
    /// A task to execute.
    Run(Task<R>),
    /// Stop the worker that dequeues this item.
    Close,
}

/// Read half of a submitted task's result.
///
/// Resolves exactly once with the task's return value or its captured
/// failure. Dropping the handle does not cancel the task.
#[derive(Debug)]
pub struct TaskHandle<R> {
    id: TaskId,
    rx: oneshot::Receiver<TaskResult<R>>,
}

impl<R> TaskHandle<R> {
    pub(crate) fn new(id: TaskId, rx: oneshot::Receiver<TaskResult<R>>) -> Self {
        Self { id, rx }
    }

    /// Identifier of the task this handle tracks.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Wait for the task to finish and return its value, or the captured
    /// failure.
    ///
    /// # Errors
    ///
    /// - `PoolError::Task(TaskError::Panicked)` if the task panicked
    /// - `PoolError::Task(TaskError::UnknownTaskType)` if the job kind is
    ///   unsupported on this pool
    /// - `PoolError::Task(TaskError::Abandoned)` if the executing worker
    ///   was hard-cancelled
    pub async fn join(self) -> Result<R, PoolError> {
        match self.rx.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(task_err)) => Err(PoolError::Task(task_err)),
            // Write half dropped without completing: the worker holding
            // this task was cancelled.
            Err(_) => Err(PoolError::Task(TaskError::Abandoned)),
        }
    }

    /// Non-blocking probe: `Some` once the task has finished.
    pub fn try_join(&mut self) -> Option<TaskResult<R>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(TaskError::Abandoned)),
        }
    }
}

/// Best-effort extraction of a panic payload message.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
