//! # Elastic Pool
//!
//! A dynamically resizable worker pool with bounded queueing, graceful
//! draining, and hard cancellation.
//!
//! Producers submit jobs into a bounded FIFO queue; a live set of workers
//! pulls from the queue one item at a time. The pool can grow and shrink
//! while running, and shutdown distinguishes *drain* (workers stop after
//! already-queued work finishes) from *abort* (workers are cancelled
//! immediately, abandoning in-flight work).
//!
//! ## Core Problem Solved
//!
//! Long-lived services rarely have a fixed right-size for background work:
//!
//! - **Bursty load**: the worker count must follow demand without
//!   restarting the pool
//! - **Backpressure**: a bounded queue throttles producers instead of
//!   buffering without limit
//! - **Two shutdowns**: deploys want draining, failure paths want abort
//! - **Failure isolation**: one panicking task must never take down a
//!   worker, let alone the pool
//!
//! ## Key Features
//!
//! - **Live resizing**: `scale`/`scale_nowait` grow by spawning and shrink
//!   by appending close signals at the queue tail, so FIFO fairness is
//!   preserved (queued tasks run before the shrink takes effect)
//! - **Result handles**: every submission is correlated to a handle that
//!   resolves exactly once with the value or the captured failure
//! - **Panic capture**: per-task panics are stored into that task's own
//!   handle; workers keep looping
//! - **Pluggable seams**: workers are cancellable units created through
//!   the [`Spawn`] trait; blocking jobs are delegated through
//!   [`BlockingExecutor`] so they never starve the scheduler
//!
//! ## Example
//!
//! ```rust,ignore
//! use elastic_pool::{CloseOptions, Job, PoolBuilder, PoolConfig};
//!
//! let pool = PoolBuilder::new()
//!     .with_config(
//!         PoolConfig::new()
//!             .with_initial_workers(3)
//!             .with_max_queued_tasks(100),
//!     )
//!     .build()?;
//! pool.start()?;
//!
//! // Blocking-style submission: wait for the value.
//! let value = pool.submit(Job::future(async { 21 * 2 })).await?;
//! assert_eq!(value, 42);
//!
//! // Handle-style submission: fire now, join later.
//! let handle = pool.submit_nowait(Job::blocking(|| expensive_io()))?;
//! let value = handle.join().await?;
//!
//! // Grow under load, shrink when it passes.
//! pool.scale(2).await?;
//! pool.scale(-2).await?;
//!
//! pool.close(CloseOptions::default()).await?;
//! ```
//!
//! For complete examples, see `tests/pool_test.rs`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]

/// Core pool engine: tasks, queue, workers, controller.
pub mod core;
/// Configuration models for pools and shutdown behavior.
pub mod config;
/// Builders to construct pools from configuration.
pub mod builders;
/// Runtime adapters implementing the pool's execution seams.
pub mod runtime;
/// Shared utilities.
pub mod util;

pub use crate::builders::{build_pools, PoolBuilder};
pub use crate::config::{CloseOptions, PoolConfig, PoolsConfig};
pub use crate::core::{
    AppResult, BlockingExecutor, CancelHandle, Job, PoolError, PoolStats, Spawn, TaskError,
    TaskHandle, TaskId, TaskPool, TaskResult, Unavailable,
};
pub use crate::runtime::{TokioBlocking, TokioSpawner};
