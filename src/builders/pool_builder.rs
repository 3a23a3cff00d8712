//! Builders to construct pools from configuration.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::config::{PoolConfig, PoolsConfig};
use crate::core::{BlockingExecutor, PoolError, Spawn, TaskPool};
use crate::runtime::{TokioBlocking, TokioSpawner};

/// Builder for a [`TaskPool`].
///
/// Defaults to the tokio spawner and tokio blocking executor; both seams
/// can be swapped for custom runtimes. A pool built
/// [`without_blocking`](PoolBuilder::without_blocking) rejects blocking
/// jobs with `UnknownTaskType` through the task's own handle.
pub struct PoolBuilder<R, S = TokioSpawner, X = TokioBlocking>
where
    R: Send + 'static,
    S: Spawn,
    X: BlockingExecutor,
{
    config: PoolConfig,
    spawner: S,
    blocking: Option<Arc<X>>,
    _result: PhantomData<fn() -> R>,
}

impl<R> PoolBuilder<R>
where
    R: Send + 'static,
{
    /// Start from defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: PoolConfig::default(),
            spawner: TokioSpawner::new(),
            blocking: Some(Arc::new(TokioBlocking)),
            _result: PhantomData,
        }
    }
}

impl<R> Default for PoolBuilder<R>
where
    R: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<R, S, X> PoolBuilder<R, S, X>
where
    R: Send + 'static,
    S: Spawn,
    X: BlockingExecutor,
{
    /// Use the given configuration.
    #[must_use]
    pub fn with_config(mut self, config: PoolConfig) -> Self {
        self.config = config;
        self
    }

    /// Swap the worker spawner.
    #[must_use]
    pub fn with_spawner<S2: Spawn>(self, spawner: S2) -> PoolBuilder<R, S2, X> {
        PoolBuilder {
            config: self.config,
            spawner,
            blocking: self.blocking,
            _result: PhantomData,
        }
    }

    /// Swap the blocking executor.
    #[must_use]
    pub fn with_blocking_executor<X2: BlockingExecutor>(
        self,
        executor: X2,
    ) -> PoolBuilder<R, S, X2> {
        PoolBuilder {
            config: self.config,
            spawner: self.spawner,
            blocking: Some(Arc::new(executor)),
            _result: PhantomData,
        }
    }

    /// Build a pool that rejects blocking jobs.
    #[must_use]
    pub fn without_blocking(mut self) -> Self {
        self.blocking = None;
        self
    }

    /// Build the pool. Workers are not started.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::InvalidConfig` if the configuration is invalid.
    pub fn build(self) -> Result<TaskPool<R, S, X>, PoolError> {
        TaskPool::new(self.config, self.spawner, self.blocking)
    }
}

/// Build one pool per entry in a [`PoolsConfig`].
///
/// # Errors
///
/// Returns `PoolError::InvalidConfig` if the configuration is invalid.
pub fn build_pools<R, S>(
    cfg: &PoolsConfig,
    spawner: S,
) -> Result<HashMap<String, TaskPool<R, S, TokioBlocking>>, PoolError>
where
    R: Send + 'static,
    S: Spawn + Clone,
{
    cfg.validate().map_err(PoolError::InvalidConfig)?;

    let mut pools = HashMap::new();
    for (name, pool_cfg) in &cfg.pools {
        let pool = TaskPool::new(
            pool_cfg.clone(),
            spawner.clone(),
            Some(Arc::new(TokioBlocking)),
        )?;
        pools.insert(name.clone(), pool);
    }
    Ok(pools)
}
