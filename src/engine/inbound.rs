// Inbound replies: settles pending results as the worker answers.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::correlation::CorrelationTable;
use super::stats::StatsCollector;
use super::task::ChunkTaskResult;
use crate::error::StreamError;

pub struct InboundHandler {
    table: Arc<CorrelationTable>,
    stats: Arc<StatsCollector>,
}

impl InboundHandler {
    pub fn new(table: Arc<CorrelationTable>, stats: Arc<StatsCollector>) -> Self {
        Self { table, stats }
    }

    /// Settle the entry matching `result.id`. Replies for ids that are no
    /// longer pending are counted and dropped.
    pub fn on_message(&self, result: ChunkTaskResult) {
        let id = result.id;
        let success = result.payload.is_some();
        let outcome = match result.payload {
            Some(bytes) => {
                debug!("task {} replied with {} bytes", id, bytes.len());
                Ok(bytes)
            }
            None => Err(StreamError::RemoteFetchFailure(id)),
        };

        if self.table.settle(id, outcome) {
            self.stats.record_settled(success);
        } else {
            self.stats.record_late_reply();
        }
    }

    /// Drain `replies` until the worker hangs up or `shutdown` fires.
    pub async fn run(
        self: Arc<Self>,
        mut replies: mpsc::UnboundedReceiver<ChunkTaskResult>,
        shutdown: CancellationToken,
    ) {
        loop {
            tokio::select! {
                msg = replies.recv() => match msg {
                    Some(result) => self.on_message(result),
                    None => {
                        debug!("reply channel closed");
                        break;
                    }
                },
                _ = shutdown.cancelled() => {
                    debug!("inbound handler shutting down");
                    break;
                }
            }
        }
    }
}
