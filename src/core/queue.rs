//! Bounded FIFO task queue shared by all workers.

use std::time::Duration;

use crate::core::error::{PoolError, Unavailable};
use crate::core::task::QueueItem;

/// Bounded multi-producer multi-consumer FIFO carrying tasks and close
/// signals.
///
/// `get` is the sole suspension point of an idle worker. Ordering is FIFO
/// across all producers, so close signals enqueued for a graceful shrink
/// take effect only after every task queued before them.
pub(crate) struct TaskQueue<R> {
    tx: async_channel::Sender<QueueItem<R>>,
    rx: async_channel::Receiver<QueueItem<R>>,
    capacity: usize,
}

// Derived Clone would require R: Clone; the channel halves are always
// cloneable.
impl<R> Clone for TaskQueue<R> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            rx: self.rx.clone(),
            capacity: self.capacity,
        }
    }
}

impl<R> TaskQueue<R> {
    /// Create a queue holding at most `capacity` items.
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = async_channel::bounded(capacity);
        Self { tx, rx, capacity }
    }

    /// Enqueue an item, waiting for space when the queue is full.
    ///
    /// This is the backpressure point: a full queue throttles producers.
    pub async fn put(&self, item: QueueItem<R>) -> Result<(), PoolError> {
        self.tx
            .send(item)
            .await
            .map_err(|_| PoolError::NotAvailable(Unavailable::Closed))
    }

    /// Enqueue an item, waiting at most `timeout` for space.
    pub async fn put_timeout(
        &self,
        item: QueueItem<R>,
        timeout: Duration,
    ) -> Result<(), PoolError> {
        match tokio::time::timeout(timeout, self.tx.send(item)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(PoolError::NotAvailable(Unavailable::Closed)),
            Err(_) => Err(PoolError::NotAvailable(Unavailable::QueueFull)),
        }
    }

    /// Enqueue an item without waiting; fails immediately when full.
    pub fn try_put(&self, item: QueueItem<R>) -> Result<(), PoolError> {
        self.tx.try_send(item).map_err(|err| match err {
            async_channel::TrySendError::Full(_) => {
                PoolError::NotAvailable(Unavailable::QueueFull)
            }
            async_channel::TrySendError::Closed(_) => {
                PoolError::NotAvailable(Unavailable::Closed)
            }
        })
    }

    /// Dequeue the next item in FIFO order.
    ///
    /// Returns `None` once the queue has been closed and emptied.
    pub async fn get(&self) -> Option<QueueItem<R>> {
        self.rx.recv().await.ok()
    }

    /// Number of items currently queued, close signals included.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Maximum number of items the queue holds.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Close the queue. Queued items remain receivable; further puts fail.
    pub fn close(&self) -> bool {
        self.tx.close()
    }

    /// Discard everything still queued. Dropped tasks resolve their
    /// handles as abandoned. Returns the number of items discarded.
    pub fn drain(&self) -> usize {
        let mut dropped = 0;
        while self.rx.try_recv().is_ok() {
            dropped += 1;
        }
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::task::{Job, Task};
    use tokio::sync::oneshot;

    fn make_task(id: u64) -> QueueItem<u64> {
        let (reply, _rx) = oneshot::channel();
        QueueItem::Run(Task {
            id,
            job: Job::future(async move { id }),
            reply,
        })
    }

    #[tokio::test]
    async fn test_fifo_ordering_across_tasks_and_close() {
        let queue: TaskQueue<u64> = TaskQueue::new(8);
        queue.put(make_task(1)).await.unwrap();
        queue.put(make_task(2)).await.unwrap();
        queue.put(QueueItem::Close).await.unwrap();

        assert!(matches!(queue.get().await, Some(QueueItem::Run(t)) if t.id == 1));
        assert!(matches!(queue.get().await, Some(QueueItem::Run(t)) if t.id == 2));
        assert!(matches!(queue.get().await, Some(QueueItem::Close)));
    }

    #[tokio::test]
    async fn test_try_put_fails_fast_when_full() {
        let queue: TaskQueue<u64> = TaskQueue::new(1);
        queue.try_put(make_task(1)).unwrap();

        let err = queue.try_put(make_task(2)).unwrap_err();
        assert!(matches!(
            err,
            PoolError::NotAvailable(Unavailable::QueueFull)
        ));
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn test_put_timeout_expires_when_full() {
        let queue: TaskQueue<u64> = TaskQueue::new(1);
        queue.put(make_task(1)).await.unwrap();

        let err = queue
            .put_timeout(make_task(2), Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PoolError::NotAvailable(Unavailable::QueueFull)
        ));
    }

    #[tokio::test]
    async fn test_close_then_drain() {
        let queue: TaskQueue<u64> = TaskQueue::new(4);
        queue.put(make_task(1)).await.unwrap();
        queue.put(make_task(2)).await.unwrap();

        assert!(queue.close());
        assert!(matches!(
            queue.try_put(make_task(3)).unwrap_err(),
            PoolError::NotAvailable(Unavailable::Closed)
        ));

        assert_eq!(queue.drain(), 2);
        assert!(queue.get().await.is_none());
    }

    #[tokio::test]
    async fn test_capacity_reporting() {
        let queue: TaskQueue<u64> = TaskQueue::new(16);
        assert_eq!(queue.capacity(), 16);
        assert_eq!(queue.len(), 0);
    }
}
