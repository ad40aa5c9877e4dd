//! Bounded FIFO between request handlers and the dispatch workers.
//!
//! A full queue makes [`DispatchQueue::enqueue`] and
//! [`DispatchQueue::reserve`] wait, so a burst of submissions slows the
//! submitters down rather than failing them. Workers
//! share one receiver; the queue closes when every [`DispatchQueue`] clone is
//! dropped, and the workers exit once it is drained.

use std::sync::Arc;
use std::time::Duration;

use notif_db::models::notification::Notification;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::engine::DispatchEngine;

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Dispatch queue is closed")]
    Closed,
}

/// Producer handle. Cheap to clone.
#[derive(Clone)]
pub struct DispatchQueue {
    sender: mpsc::Sender<Notification>,
}

impl DispatchQueue {
    /// Create a queue holding at most `capacity` pending notifications.
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<Notification>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Queue a notification, waiting for space if the queue is full.
    pub async fn enqueue(&self, notification: Notification) -> Result<(), QueueError> {
        self.sender
            .send(notification)
            .await
            .map_err(|_| QueueError::Closed)
    }

    /// Wait for a free slot and hold it.
    ///
    /// Reserve before persisting: once the write has committed, handing the
    /// notification over through [`DispatchPermit::send`] cannot wait or
    /// fail.
    pub async fn reserve(&self) -> Result<DispatchPermit, QueueError> {
        let permit = self
            .sender
            .clone()
            .reserve_owned()
            .await
            .map_err(|_| QueueError::Closed)?;
        Ok(DispatchPermit { permit })
    }

    /// Free slots right now.
    pub fn available(&self) -> usize {
        self.sender.capacity()
    }
}

/// A reserved queue slot. Dropping it unused releases the slot.
pub struct DispatchPermit {
    permit: mpsc::OwnedPermit<Notification>,
}

impl DispatchPermit {
    pub fn send(self, notification: Notification) {
        drop(self.permit.send(notification));
    }
}

// ---------------------------------------------------------------------------
// Worker pool
// ---------------------------------------------------------------------------

pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `workers` tasks draining `receiver` through `engine`.
    pub fn spawn(
        engine: Arc<DispatchEngine>,
        receiver: mpsc::Receiver<Notification>,
        workers: usize,
    ) -> Self {
        let receiver = Arc::new(Mutex::new(receiver));
        let handles = (0..workers.max(1))
            .map(|worker| {
                let engine = Arc::clone(&engine);
                let receiver = Arc::clone(&receiver);
                tokio::spawn(async move {
                    loop {
                        // The lock is held only while waiting for the next item.
                        let next = receiver.lock().await.recv().await;
                        let Some(notification) = next else {
                            break;
                        };
                        tracing::debug!(worker, notid = %notification.notid, "Dispatching");
                        engine.dispatch(&notification).await;
                    }
                    tracing::debug!(worker, "Dispatch queue closed, worker exiting");
                })
            })
            .collect();

        Self { handles }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for every worker to finish, up to `timeout` in total.
    ///
    /// Returns `false` if the timeout elapsed first; unfinished workers are
    /// aborted.
    pub async fn join(self, timeout: Duration) -> bool {
        let aborts: Vec<_> = self.handles.iter().map(|h| h.abort_handle()).collect();
        let all = async {
            for handle in self.handles {
                if let Err(e) = handle.await {
                    tracing::error!(error = %e, "Dispatch worker panicked");
                }
            }
        };

        match tokio::time::timeout(timeout, all).await {
            Ok(()) => true,
            Err(_) => {
                tracing::warn!("Dispatch workers did not drain in time, aborting");
                for abort in aborts {
                    abort.abort();
                }
                false
            }
        }
    }
}
