//! Bounded FIFO queue of versions waiting to be deployed

use thiserror::Error;
use tokio::sync::mpsc;

/// Default number of pending deployments accepted before rejecting
pub const DEFAULT_CAPACITY: usize = 10;

/// Reasons an enqueue attempt is rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("Deployment queue full, rejected {0}")]
    Full(String),

    #[error("Deployment queue closed, rejected {0}")]
    Closed(String),
}

/// Create a queue with room for `capacity` pending versions
pub fn channel(capacity: usize) -> (DeploymentQueue, DeploymentReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (DeploymentQueue { tx }, DeploymentReceiver { rx })
}

/// Producer handle, cloned into every request handler
#[derive(Debug, Clone)]
pub struct DeploymentQueue {
    tx: mpsc::Sender<String>,
}

impl DeploymentQueue {
    /// Try to append `version` without waiting.
    ///
    /// Fails immediately with [`QueueError::Full`] when at capacity.
    pub fn enqueue(&self, version: impl Into<String>) -> Result<(), QueueError> {
        self.tx.try_send(version.into()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(v) => QueueError::Full(v),
            mpsc::error::TrySendError::Closed(v) => QueueError::Closed(v),
        })
    }

    /// Number of versions waiting to be dequeued
    pub fn depth(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer handle, owned by the single deployment worker
#[derive(Debug)]
pub struct DeploymentReceiver {
    rx: mpsc::Receiver<String>,
}

impl DeploymentReceiver {
    /// Wait for the next version in insertion order.
    ///
    /// Returns `None` once the queue is closed and drained.
    pub async fn dequeue(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    /// Refuse further enqueues; already queued versions stay readable
    pub fn close(&mut self) {
        self.rx.close();
    }

    /// Number of versions waiting to be dequeued
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
