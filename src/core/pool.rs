//! Pool controller: public submit/scale/pause/close surface.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::config::{CloseOptions, PoolConfig};
use crate::core::error::{PoolError, Unavailable};
use crate::core::executor::{BlockingExecutor, Spawn};
use crate::core::queue::TaskQueue;
use crate::core::task::{Job, QueueItem, Task, TaskHandle, TaskId};
use crate::core::worker::{run_worker, WorkerSet};
use crate::runtime::{TokioBlocking, TokioSpawner};

/// Snapshot of pool state and lifetime counters.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Count of live workers.
    pub size: usize,
    /// Whether submission is currently gated.
    pub paused: bool,
    /// Whether the pool has been closed (terminal).
    pub closed: bool,
    /// Tasks (and close signals) currently queued.
    pub waiting_tasks: usize,
    /// Queue capacity.
    pub max_tasks: usize,
    /// Total tasks accepted for execution.
    pub submitted_tasks: u64,
    /// Total tasks that produced a value.
    pub completed_tasks: u64,
    /// Total tasks that resolved with a captured failure.
    pub failed_tasks: u64,
}

/// Lifetime counters shared with workers (lock-free atomics).
#[derive(Debug, Default)]
pub(crate) struct PoolCounters {
    pub submitted_tasks: AtomicU64,
    pub completed_tasks: AtomicU64,
    pub failed_tasks: AtomicU64,
}

/// Dynamically resizable worker pool over a bounded FIFO queue.
///
/// Workers are cancellable execution units created through the `S`
/// spawner; blocking jobs are delegated to the `X` executor. The pool
/// state machine is `NEW -> RUNNING` (after [`start`]) with `size`
/// fluctuating under [`scale`]/[`scale_nowait`], then
/// `CLOSING -> CLOSED` (terminal) under [`close`]/[`close_hard`].
///
/// # Example
///
/// ```rust,ignore
/// use elastic_pool::{Job, PoolBuilder, PoolConfig};
///
/// let pool = PoolBuilder::new()
///     .with_config(PoolConfig::new().with_initial_workers(4))
///     .build()?;
/// pool.start()?;
///
/// let doubled = pool.submit(Job::future(async { 21 * 2 })).await?;
/// assert_eq!(doubled, 42);
/// pool.close(Default::default()).await?;
/// ```
///
/// [`start`]: TaskPool::start
/// [`scale`]: TaskPool::scale
/// [`scale_nowait`]: TaskPool::scale_nowait
/// [`close`]: TaskPool::close
/// [`close_hard`]: TaskPool::close_hard
pub struct TaskPool<R, S = TokioSpawner, X = TokioBlocking>
where
    R: Send + 'static,
    S: Spawn,
    X: BlockingExecutor,
{
    config: PoolConfig,
    queue: TaskQueue<R>,
    workers: Arc<WorkerSet<S::Handle>>,
    spawner: S,
    blocking: Option<Arc<X>>,
    counters: Arc<PoolCounters>,
    paused: AtomicBool,
    closed: AtomicBool,
    next_task_id: AtomicU64,
}

impl<R, S, X> TaskPool<R, S, X>
where
    R: Send + 'static,
    S: Spawn,
    X: BlockingExecutor,
{
    /// Create a pool from validated configuration. No workers run until
    /// [`start`](TaskPool::start) or [`scale`](TaskPool::scale).
    ///
    /// # Errors
    ///
    /// Returns `PoolError::InvalidConfig` if the configuration is invalid.
    pub fn new(config: PoolConfig, spawner: S, blocking: Option<Arc<X>>) -> Result<Self, PoolError> {
        config.validate().map_err(PoolError::InvalidConfig)?;
        let queue = TaskQueue::new(config.max_queued_tasks);
        Ok(Self {
            config,
            queue,
            workers: Arc::new(WorkerSet::new()),
            spawner,
            blocking,
            counters: Arc::new(PoolCounters::default()),
            paused: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            next_task_id: AtomicU64::new(0),
        })
    }

    /// Bring the pool up to its configured initial size.
    ///
    /// No-op if the pool is already at or above that size.
    ///
    /// # Errors
    ///
    /// Fails with `NotAvailable` if the pool is closed.
    pub fn start(&self) -> Result<(), PoolError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(PoolError::NotAvailable(Unavailable::Closed));
        }
        let current = self.workers.len();
        let target = self.config.initial_workers;
        if current < target {
            self.spawn_workers(target - current);
            info!(size = target, "pool started");
        }
        Ok(())
    }

    /// Submit a job and wait for its result, honoring queue backpressure.
    ///
    /// Re-raises the task's captured failure as `PoolError::Task`.
    ///
    /// # Errors
    ///
    /// Fails with `NotAvailable` when the pool is paused or closed, and
    /// with `PoolError::Task` when the job itself fails. A pool that may
    /// be hard-cancelled resolves in-flight handles as abandoned; callers
    /// needing stronger guarantees should wrap this in their own timeout.
    pub async fn submit(&self, job: Job<R>) -> Result<R, PoolError> {
        self.dispatch(job).await?.join().await
    }

    /// Submit a job with backpressure and return its handle immediately.
    ///
    /// # Errors
    ///
    /// Fails with `NotAvailable` when the pool is paused or closed.
    pub async fn dispatch(&self, job: Job<R>) -> Result<TaskHandle<R>, PoolError> {
        self.ensure_accepting()?;
        let (task, handle) = self.make_task(job);
        self.queue.put(QueueItem::Run(task)).await?;
        self.counters.submitted_tasks.fetch_add(1, Ordering::Relaxed);
        debug!(task_id = handle.id(), "task submitted");
        Ok(handle)
    }

    /// Submit a job with a bounded wait for queue space, returning its
    /// handle.
    ///
    /// # Errors
    ///
    /// Fails with `NotAvailable` when the pool is paused or closed, or
    /// when no queue space opened up within `timeout`.
    pub async fn dispatch_timeout(
        &self,
        job: Job<R>,
        timeout: std::time::Duration,
    ) -> Result<TaskHandle<R>, PoolError> {
        self.ensure_accepting()?;
        let (task, handle) = self.make_task(job);
        self.queue.put_timeout(QueueItem::Run(task), timeout).await?;
        self.counters.submitted_tasks.fetch_add(1, Ordering::Relaxed);
        debug!(task_id = handle.id(), "task submitted (timed)");
        Ok(handle)
    }

    /// Submit a job without waiting; fails immediately when the queue is
    /// full.
    ///
    /// # Errors
    ///
    /// Fails with `NotAvailable` when the pool is paused or closed, or
    /// when the queue is at capacity.
    pub fn submit_nowait(&self, job: Job<R>) -> Result<TaskHandle<R>, PoolError> {
        self.ensure_accepting()?;
        let (task, handle) = self.make_task(job);
        self.queue.try_put(QueueItem::Run(task))?;
        self.counters.submitted_tasks.fetch_add(1, Ordering::Relaxed);
        debug!(task_id = handle.id(), "task submitted (nowait)");
        Ok(handle)
    }

    /// Grow or shrink the pool by `delta`, returning the target size
    /// clamped at zero.
    ///
    /// Shrinking enqueues close signals at the queue tail: already-queued
    /// tasks run before the signals take effect, and this call returns
    /// once the signals are accepted, not once workers actually stop.
    ///
    /// # Errors
    ///
    /// Fails with `NotAvailable` if the pool is closed.
    pub async fn scale(&self, delta: i64) -> Result<usize, PoolError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(PoolError::NotAvailable(Unavailable::Closed));
        }
        let size = self.workers.len() as i64;
        let target = size.saturating_add(delta).max(0);
        if delta >= 0 {
            self.spawn_workers(delta as usize);
        } else {
            let to_remove = delta.unsigned_abs().min(size as u64) as usize;
            for _ in 0..to_remove {
                self.queue.put(QueueItem::Close).await?;
            }
        }
        info!(delta, new_size = target, "pool scaled");
        Ok(target as usize)
    }

    /// Non-blocking [`scale`](TaskPool::scale).
    ///
    /// A soft shrink enqueues close signals without waiting and may fail
    /// mid-way with `QueueFull`, having accepted only part of the
    /// requested shrink. A hard shrink (`soft = false`) cancels arbitrary
    /// workers directly, bypassing the queue; any task in flight on a
    /// cancelled worker is abandoned and its handle never completed with
    /// a value.
    ///
    /// # Errors
    ///
    /// Fails with `NotAvailable` if the pool is closed, or on a soft
    /// shrink when the queue is full.
    pub fn scale_nowait(&self, delta: i64, soft: bool) -> Result<usize, PoolError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(PoolError::NotAvailable(Unavailable::Closed));
        }
        let size = self.workers.len() as i64;
        let target = size.saturating_add(delta).max(0);
        if delta >= 0 {
            self.spawn_workers(delta as usize);
        } else {
            let to_remove = delta.unsigned_abs().min(size as u64) as usize;
            if soft {
                for _ in 0..to_remove {
                    self.queue.try_put(QueueItem::Close)?;
                }
            } else {
                self.workers.cancel_arbitrary(to_remove);
            }
        }
        info!(delta, soft, new_size = target, "pool scaled (nowait)");
        Ok(target as usize)
    }

    /// Gate submission. Returns `true` if the pool was running and is now
    /// paused. Workers keep draining already-queued tasks.
    pub fn pause(&self) -> bool {
        let was_paused = self.paused.swap(true, Ordering::AcqRel);
        if !was_paused {
            info!("pool paused");
        }
        !was_paused
    }

    /// Lift the submission gate. Returns `true` if the pool was paused
    /// and is now accepting again; always `false` (and the pool stays
    /// paused) when [`PoolConfig::terminal_pause`] is set.
    pub fn resume(&self) -> bool {
        if self.config.terminal_pause {
            return false;
        }
        let was_paused = self.paused.swap(false, Ordering::AcqRel);
        if was_paused {
            info!("pool resumed");
        }
        was_paused
    }

    /// Gracefully close the pool: stop accepting, signal every worker to
    /// exit after the queue drains, and wait for the live set to empty.
    ///
    /// The pool is closed from the moment this is called, whatever the
    /// outcome. Each individual worker exit is bounded by
    /// `opts.worker_timeout` when set; the whole drain is bounded by
    /// `opts.pool_timeout`. Workers still alive after the deadline are
    /// hard-cancelled so that a closed pool is always empty.
    ///
    /// # Errors
    ///
    /// Returns `CloseTimeout` when the drain deadline passes and
    /// `opts.safe` is `false`; with `opts.safe` the timeout is logged and
    /// swallowed.
    pub async fn close(&self, opts: CloseOptions) -> Result<(), PoolError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let pending = self.workers.len();
        info!(workers = pending, "closing pool");

        let mut size_rx = self.workers.watch_size();
        let drain = async {
            for _ in 0..pending {
                if self.queue.put(QueueItem::Close).await.is_err() {
                    return false;
                }
            }
            loop {
                if *size_rx.borrow_and_update() == 0 {
                    return true;
                }
                let changed = size_rx.changed();
                let ok = match opts.worker_timeout {
                    Some(limit) => {
                        matches!(tokio::time::timeout(limit, changed).await, Ok(Ok(())))
                    }
                    None => changed.await.is_ok(),
                };
                if !ok {
                    return false;
                }
            }
        };

        let drained = tokio::time::timeout(opts.pool_timeout, drain)
            .await
            .unwrap_or(false);

        // Anything that raced into the queue behind the close signals
        // will never run; dropping it resolves its handle as abandoned.
        self.queue.close();
        self.queue.drain();

        if drained {
            info!("pool closed");
            return Ok(());
        }

        // A closed pool must be empty; cancel whatever is still running.
        let cancelled = self.workers.cancel_all();
        if opts.safe {
            warn!(cancelled, "close timed out; cancelled remaining workers");
            Ok(())
        } else {
            Err(PoolError::CloseTimeout(opts.pool_timeout))
        }
    }

    /// Cancel every worker immediately, ignoring in-flight tasks, and
    /// discard whatever is still queued. Queued and in-flight tasks
    /// resolve their handles as abandoned.
    pub fn close_hard(&self) {
        self.closed.store(true, Ordering::Release);
        let cancelled = self.workers.cancel_all();
        self.queue.close();
        let dropped = self.queue.drain();
        info!(cancelled, dropped_tasks = dropped, "pool hard-closed");
    }

    /// Count of live workers.
    #[must_use]
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Whether submission is currently gated.
    #[must_use]
    pub fn paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Whether the pool has been closed (terminal).
    #[must_use]
    pub fn closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Number of items currently queued, close signals included.
    #[must_use]
    pub fn waiting_tasks(&self) -> usize {
        self.queue.len()
    }

    /// Queue capacity.
    #[must_use]
    pub fn max_tasks(&self) -> usize {
        self.queue.capacity()
    }

    /// Snapshot of state and lifetime counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            size: self.size(),
            paused: self.paused(),
            closed: self.closed(),
            waiting_tasks: self.waiting_tasks(),
            max_tasks: self.max_tasks(),
            submitted_tasks: self.counters.submitted_tasks.load(Ordering::Relaxed),
            completed_tasks: self.counters.completed_tasks.load(Ordering::Relaxed),
            failed_tasks: self.counters.failed_tasks.load(Ordering::Relaxed),
        }
    }

    fn ensure_accepting(&self) -> Result<(), PoolError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(PoolError::NotAvailable(Unavailable::Closed));
        }
        if self.paused.load(Ordering::Acquire) {
            return Err(PoolError::NotAvailable(Unavailable::Paused));
        }
        Ok(())
    }

    fn make_task(&self, job: Job<R>) -> (Task<R>, TaskHandle<R>) {
        let id: TaskId = self.next_task_id.fetch_add(1, Ordering::Relaxed);
        let (reply, rx) = oneshot::channel();
        (Task { id, job, reply }, TaskHandle::new(id, rx))
    }

    fn spawn_workers(&self, n: usize) {
        for _ in 0..n {
            let queue = self.queue.clone();
            let workers = Arc::clone(&self.workers);
            let blocking = self.blocking.clone();
            let counters = Arc::clone(&self.counters);
            self.workers.spawn_one(&self.spawner, move |id| {
                run_worker(id, queue, workers, blocking, counters)
            });
        }
    }
}

impl<R, S, X> Drop for TaskPool<R, S, X>
where
    R: Send + 'static,
    S: Spawn,
    X: BlockingExecutor,
{
    fn drop(&mut self) {
        // No joining here; closing the queue lets workers drain what is
        // left and exit on their own.
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.queue.close();
            debug!("pool dropped without explicit close");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_pool(config: PoolConfig) -> TaskPool<u64> {
        TaskPool::new(config, TokioSpawner::new(), Some(Arc::new(TokioBlocking))).unwrap()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = PoolConfig::new().with_initial_workers(0);
        let result: Result<TaskPool<u64>, _> =
            TaskPool::new(config, TokioSpawner::new(), Some(Arc::new(TokioBlocking)));
        assert!(matches!(result, Err(PoolError::InvalidConfig(_))));
    }

    #[test]
    fn test_pause_resume_transitions() {
        let pool = make_pool(PoolConfig::new());
        assert!(!pool.paused());
        assert!(pool.pause());
        assert!(!pool.pause());
        assert!(pool.paused());
        assert!(pool.resume());
        assert!(!pool.resume());
        assert!(!pool.paused());
    }

    #[test]
    fn test_terminal_pause_cannot_resume() {
        let pool = make_pool(PoolConfig::new().with_terminal_pause(true));
        assert!(pool.pause());
        assert!(!pool.resume());
        assert!(pool.paused());
    }

    #[test]
    fn test_stats_before_start() {
        let pool = make_pool(PoolConfig::new().with_max_queued_tasks(32));
        let stats = pool.stats();
        assert_eq!(stats.size, 0);
        assert_eq!(stats.max_tasks, 32);
        assert_eq!(stats.submitted_tasks, 0);
        assert!(!stats.closed);
    }
}
