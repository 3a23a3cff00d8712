//! Core pool engine: tasks, queue, workers, controller.

pub mod error;
pub mod executor;
pub mod pool;
pub(crate) mod queue;
pub mod task;
pub(crate) mod worker;

pub use error::{AppResult, PoolError, TaskError, Unavailable};
pub use executor::{BlockingExecutor, CancelHandle, Spawn};
pub use pool::{PoolStats, TaskPool};
pub use task::{BlockingJob, FutureJob, Job, TaskHandle, TaskId, TaskResult};
