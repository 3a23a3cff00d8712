//! Worker loop and live-set bookkeeping.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::debug;

use crate::core::error::TaskError;
use crate::core::executor::{BlockingExecutor, CancelHandle, Spawn};
use crate::core::pool::PoolCounters;
use crate::core::queue::TaskQueue;
use crate::core::task::{panic_message, Job, QueueItem, Task, TaskResult};

/// Identifier assigned to each spawned worker.
pub(crate) type WorkerId = u64;

/// Live set of worker cancel handles.
///
/// Mutated concurrently by the controller (spawn, hard cancel) and by
/// each worker's own exit path (graceful self-removal), so every
/// mutation goes through one mutex. A watch channel mirrors the live
/// count so closers can wait for drain without polling.
pub(crate) struct WorkerSet<H> {
    next_id: AtomicU64,
    live: Mutex<HashMap<WorkerId, H>>,
    size_tx: watch::Sender<usize>,
}

impl<H: CancelHandle> WorkerSet<H> {
    pub fn new() -> Self {
        let (size_tx, _size_rx) = watch::channel(0);
        Self {
            next_id: AtomicU64::new(0),
            live: Mutex::new(HashMap::new()),
            size_tx,
        }
    }

    /// Spawn one worker and register its handle.
    ///
    /// The registry lock is held across the spawn so the worker cannot
    /// observe (and self-remove from) an empty slot before registration.
    pub fn spawn_one<S, F, Fut>(&self, spawner: &S, make: F) -> WorkerId
    where
        S: Spawn<Handle = H>,
        F: FnOnce(WorkerId) -> Fut,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut live = self.live.lock();
        let handle = spawner.spawn(make(id));
        live.insert(id, handle);
        self.size_tx.send_replace(live.len());
        id
    }

    /// Graceful self-removal on worker exit.
    pub fn remove(&self, id: WorkerId) -> bool {
        let mut live = self.live.lock();
        let removed = live.remove(&id).is_some();
        self.size_tx.send_replace(live.len());
        removed
    }

    /// Cancel up to `n` workers, chosen arbitrarily (no fairness
    /// guarantee). Handles that already finished but have not yet
    /// self-removed are skipped, so the shrink lands on workers that
    /// are actually running. Returns how many were cancelled.
    pub fn cancel_arbitrary(&self, n: usize) -> usize {
        let mut live = self.live.lock();
        let victims: Vec<WorkerId> = live
            .iter()
            .filter(|(_, handle)| !handle.is_finished())
            .map(|(id, _)| *id)
            .take(n)
            .collect();
        for id in &victims {
            if let Some(handle) = live.remove(id) {
                handle.cancel();
            }
        }
        self.size_tx.send_replace(live.len());
        victims.len()
    }

    /// Cancel every live worker. Returns how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        let mut live = self.live.lock();
        let cancelled = live.len();
        for (_, handle) in live.drain() {
            handle.cancel();
        }
        self.size_tx.send_replace(0);
        cancelled
    }

    /// Count of live workers.
    pub fn len(&self) -> usize {
        self.live.lock().len()
    }

    /// Subscribe to live-count changes.
    pub fn watch_size(&self) -> watch::Receiver<usize> {
        self.size_tx.subscribe()
    }
}

/// One worker: dequeue, execute, repeat, until a close signal arrives or
/// the queue itself closes. An in-task failure never escapes the loop.
pub(crate) async fn run_worker<R, X, H>(
    worker_id: WorkerId,
    queue: TaskQueue<R>,
    workers: Arc<WorkerSet<H>>,
    blocking: Option<Arc<X>>,
    counters: Arc<PoolCounters>,
) where
    R: Send + 'static,
    X: BlockingExecutor,
    H: CancelHandle,
{
    debug!(worker_id, "worker started");
    loop {
        match queue.get().await {
            Some(QueueItem::Run(task)) => {
                debug!(worker_id, task_id = task.id, "executing task");
                execute_task(task, blocking.as_deref(), &counters).await;
            }
            Some(QueueItem::Close) => {
                debug!(worker_id, "close signal received");
                break;
            }
            None => {
                debug!(worker_id, "queue closed");
                break;
            }
        }
    }
    workers.remove(worker_id);
    debug!(worker_id, "worker stopped");
}

/// Run one task and complete its handle exactly once.
async fn execute_task<R, X>(task: Task<R>, blocking: Option<&X>, counters: &PoolCounters)
where
    R: Send + 'static,
    X: BlockingExecutor,
{
    let Task { id, job, reply } = task;

    let outcome: TaskResult<R> = match job {
        Job::Future(fut) => AssertUnwindSafe(fut)
            .catch_unwind()
            .await
            .map_err(|payload| TaskError::Panicked(panic_message(payload.as_ref()))),
        Job::Blocking(f) => match blocking {
            Some(executor) => executor.run_blocking(f).await,
            None => Err(TaskError::UnknownTaskType),
        },
    };

    match &outcome {
        Ok(_) => {
            counters.completed_tasks.fetch_add(1, Ordering::Relaxed);
        }
        Err(err) => {
            debug!(task_id = id, error = %err, "task failed");
            counters.failed_tasks.fetch_add(1, Ordering::Relaxed);
        }
    }

    // Err here means the caller dropped the handle; the outcome is
    // discarded on purpose.
    if reply.send(outcome).is_err() {
        debug!(task_id = id, "result handle dropped by caller");
    }
}
