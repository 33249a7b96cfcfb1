// Correlation table: maps outstanding task ids to the futures waiting on them.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use super::task::TaskId;
use crate::error::StreamError;

/// What a pending result settles with.
pub type Outcome = Result<Bytes, StreamError>;

pub struct CorrelationTable {
    next_id: AtomicU64,
    pending: Mutex<HashMap<TaskId, oneshot::Sender<Outcome>>>,
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Allocate the next id and park a pending result under it.
    pub fn register(self: &Arc<Self>) -> PendingResult {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);
        debug!("task {} registered", id);

        PendingResult {
            id,
            rx,
            table: Arc::clone(self),
            finished: false,
        }
    }

    /// Resolve the entry for `id`. Returns `false` if no such entry exists,
    /// which happens when the reply arrives after the request was abandoned.
    pub fn settle(&self, id: TaskId, outcome: Outcome) -> bool {
        let sender = self.pending.lock().remove(&id);
        match sender {
            Some(tx) => {
                if tx.send(outcome).is_err() {
                    debug!("task {} settled but its waiter is already gone", id);
                }
                true
            }
            None => {
                warn!("reply for unknown task {}, dropping", id);
                false
            }
        }
    }

    /// Remove the entry for `id` without resolving it.
    pub fn abandon(&self, id: TaskId) -> bool {
        let removed = self.pending.lock().remove(&id).is_some();
        if removed {
            debug!("task {} abandoned", id);
        }
        removed
    }

    /// Number of outstanding entries.
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.pending.lock().contains_key(&id)
    }
}

impl Default for CorrelationTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Future side of a table entry.
///
/// Dropping it before it resolves abandons the entry, so a request that
/// loses its timeout race never leaves anything behind in the table.
pub struct PendingResult {
    id: TaskId,
    rx: oneshot::Receiver<Outcome>,
    table: Arc<CorrelationTable>,
    finished: bool,
}

impl PendingResult {
    pub fn id(&self) -> TaskId {
        self.id
    }
}

impl Future for PendingResult {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let polled = Pin::new(&mut self.rx).poll(cx);
        match polled {
            Poll::Ready(Ok(outcome)) => {
                self.finished = true;
                Poll::Ready(outcome)
            }
            Poll::Ready(Err(_)) => {
                self.finished = true;
                Poll::Ready(Err(StreamError::ChannelClosed))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for PendingResult {
    fn drop(&mut self) {
        if !self.finished {
            self.table.abandon(self.id);
        }
    }
}
