//! Blocking-work delegation onto tokio's blocking thread pool.

use async_trait::async_trait;

use crate::core::error::TaskError;
use crate::core::task::{panic_message, BlockingJob};
use crate::core::BlockingExecutor;

/// Blocking executor backed by `tokio::task::spawn_blocking`.
///
/// Keeps blocking jobs off the cooperative scheduler so workers sharing
/// the runtime are never starved.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioBlocking;

#[async_trait]
impl BlockingExecutor for TokioBlocking {
    async fn run_blocking<R>(&self, f: BlockingJob<R>) -> Result<R, TaskError>
    where
        R: Send + 'static,
    {
        match tokio::task::spawn_blocking(f).await {
            Ok(value) => Ok(value),
            Err(err) if err.is_panic() => {
                let payload = err.into_panic();
                Err(TaskError::Panicked(panic_message(payload.as_ref())))
            }
            // The blocking task was cancelled out from under us.
            Err(_) => Err(TaskError::Abandoned),
        }
    }
}
