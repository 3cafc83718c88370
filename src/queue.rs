//! Unbounded multi-producer single-consumer batch queue (§4.B).
//!
//! Producers never block; the consumer receives batches in submission
//! order. Backed by `tokio::sync::mpsc::unbounded_channel`, which already
//! gives FIFO delivery and O(1) amortized send, generalized with explicit
//! batch framing on top.

use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
#[error("queue has no live receiver")]
pub struct QueueClosed;

/// Producer-side handle. Cheap to clone — every poller gets its own handle
/// onto the same underlying channel.
#[derive(Clone)]
pub struct QueueSender<T> {
    tx: mpsc::UnboundedSender<Vec<T>>,
}

impl<T> QueueSender<T> {
    /// Submit a batch. Never blocks; returns an error only once the single
    /// consumer has been dropped (e.g. during shutdown).
    pub fn send(&self, batch: Vec<T>) -> Result<(), QueueClosed> {
        if batch.is_empty() {
            return Ok(());
        }
        self.tx.send(batch).map_err(|_| QueueClosed)
    }
}

/// Single-reader consumer side.
pub struct QueueReceiver<T> {
    rx: mpsc::UnboundedReceiver<Vec<T>>,
}

impl<T> QueueReceiver<T> {
    /// Receive the next batch, or `None` once every sender has been dropped
    /// (end-of-stream, used for cooperative shutdown).
    pub async fn recv(&mut self) -> Option<Vec<T>> {
        self.rx.recv().await
    }

    /// Drain everything currently buffered without waiting, for use during
    /// cancellation so a loop can flush its backlog instead of dropping it.
    pub fn drain_ready(&mut self) -> Vec<T> {
        let mut out = Vec::new();
        while let Ok(batch) = self.rx.try_recv() {
            out.extend(batch);
        }
        out
    }
}

/// Construct a fresh queue, returning the producer handle and the single
/// consumer.
pub fn unbounded<T>() -> (QueueSender<T>, QueueReceiver<T>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (QueueSender { tx }, QueueReceiver { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn preserves_fifo_order_across_producers() {
        let (tx, mut rx) = unbounded::<i32>();
        let tx2 = tx.clone();

        tx.send(vec![1, 2]).unwrap();
        tx2.send(vec![3]).unwrap();

        assert_eq!(rx.recv().await, Some(vec![1, 2]));
        assert_eq!(rx.recv().await, Some(vec![3]));
    }

    #[tokio::test]
    async fn empty_batches_are_not_enqueued() {
        let (tx, mut rx) = unbounded::<i32>();
        tx.send(vec![]).unwrap();
        tx.send(vec![1]).unwrap();
        assert_eq!(rx.recv().await, Some(vec![1]));
    }

    #[tokio::test]
    async fn recv_ends_when_all_senders_dropped() {
        let (tx, mut rx) = unbounded::<i32>();
        drop(tx);
        assert_eq!(rx.recv().await, None);
    }
}
