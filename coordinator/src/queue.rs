//! FIFO hand-off points between producers and consumers
//!
//! A [`Queue`] never blocks waiting for items. Dequeueing from an empty queue yields `Ok(None)`,
//! the empty sentinel, which is distinct from an error. Polling for new items is left to the
//! coordinators.

use crate::error::QueueError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Ordered asynchronous hand-off point
#[async_trait]
pub trait Queue<T>: Send + Sync {
    /// Appends an item to the tail, returning the queue length afterwards
    async fn enqueue(&self, item: T) -> Result<usize, QueueError>;

    /// Removes the item at the head, or returns `None` if there is none
    async fn dequeue(&self) -> Result<Option<T>, QueueError>;
}

#[async_trait]
impl<T, Q> Queue<T> for Arc<Q>
where
    T: Send + 'static,
    Q: Queue<T> + ?Sized,
{
    async fn enqueue(&self, item: T) -> Result<usize, QueueError> {
        (**self).enqueue(item).await
    }

    async fn dequeue(&self) -> Result<Option<T>, QueueError> {
        (**self).dequeue().await
    }
}

/// Volatile in-process queue
///
/// Safe for any number of concurrent producers and consumers. Items are lost when the process
/// exits, use a durable implementation for multi-process deployments.
#[derive(Debug)]
pub struct MemoryQueue<T> {
    items: Mutex<VecDeque<T>>,
}

impl<T> MemoryQueue<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

impl<T> Default for MemoryQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Send + 'static> Queue<T> for MemoryQueue<T> {
    async fn enqueue(&self, item: T) -> Result<usize, QueueError> {
        let mut items = self.items.lock();
        items.push_back(item);
        Ok(items.len())
    }

    async fn dequeue(&self) -> Result<Option<T>, QueueError> {
        Ok(self.items.lock().pop_front())
    }
}
