//! Bounded handoff between the capture producer and the decode consumer.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tokio::sync::Notify;
use tracing::warn;

/// Drop-oldest bounded queue of raw byte chunks.
///
/// `push` never blocks: when full, the oldest chunk is discarded so the
/// capture thread keeps up and the freshest data survives. Loss is counted,
/// not hidden.
pub struct ChunkQueue {
    inner: Mutex<VecDeque<Vec<u8>>>,
    notify: Notify,
    capacity: usize,
    dropped: AtomicU64,
}

impl ChunkQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            notify: Notify::new(),
            capacity: capacity.max(1),
            dropped: AtomicU64::new(0),
        }
    }

    pub fn push(&self, chunk: Vec<u8>) {
        if let Ok(mut queue) = self.inner.lock() {
            if queue.len() >= self.capacity {
                queue.pop_front();
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                if dropped.is_power_of_two() {
                    warn!(dropped, "chunk queue overflow, oldest chunk dropped");
                }
            }
            queue.push_back(chunk);
        }
        self.notify.notify_one();
    }

    /// Waits until a chunk is available.
    pub async fn pop(&self) -> Vec<u8> {
        loop {
            if let Some(chunk) = self.try_pop() {
                return chunk;
            }
            self.notify.notified().await;
        }
    }

    pub fn try_pop(&self) -> Option<Vec<u8>> {
        self.inner.lock().ok()?.pop_front()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|q| q.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn clear(&self) {
        if let Ok(mut queue) = self.inner.lock() {
            queue.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    #[test]
    fn overflow_drops_the_oldest() {
        let queue = ChunkQueue::new(2);
        queue.push(vec![1]);
        queue.push(vec![2]);
        queue.push(vec![3]);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.dropped_count(), 1);
        assert_eq!(queue.try_pop(), Some(vec![2]));
        assert_eq!(queue.try_pop(), Some(vec![3]));
        assert_eq!(queue.try_pop(), None);
    }

    #[tokio::test]
    async fn pop_wakes_on_push() {
        let queue = Arc::new(ChunkQueue::new(8));
        let consumer = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.pop().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.push(vec![7]);
        let chunk = tokio::time::timeout(Duration::from_secs(1), consumer)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(chunk, vec![7]);
    }
}
