// Task dispatch: registers a pending result and hands the chunk task to the worker.

use std::sync::Arc;

use tracing::{debug, warn};

use super::correlation::{CorrelationTable, PendingResult};
use super::stats::StatsCollector;
use super::task::{ChunkTask, FilePartRequest, TaskKind};
use crate::error::StreamError;
use crate::range::align::AlignedWindow;
use crate::server::descriptor::StreamDescriptor;
use crate::source::traits::ChunkChannel;

pub struct TaskDispatcher {
    table: Arc<CorrelationTable>,
    channel: Arc<dyn ChunkChannel>,
    stats: Arc<StatsCollector>,
}

impl TaskDispatcher {
    pub fn new(
        table: Arc<CorrelationTable>,
        channel: Arc<dyn ChunkChannel>,
        stats: Arc<StatsCollector>,
    ) -> Self {
        Self {
            table,
            channel,
            stats,
        }
    }

    /// Send one `requestFilePart` task for `window` and return the future
    /// that resolves with its reply.
    ///
    /// If the channel refuses the task, the returned future is already
    /// settled with [`StreamError::ChannelClosed`].
    pub fn dispatch(&self, descriptor: &StreamDescriptor, window: AlignedWindow) -> PendingResult {
        let pending = self.table.register();
        let id = pending.id();

        let task = ChunkTask {
            id,
            kind: TaskKind::RequestFilePart,
            payload: FilePartRequest(
                descriptor.source_id,
                descriptor.location.clone(),
                window.offset,
                window.limit,
            ),
        };

        debug!(
            "dispatch task={} source={} offset={} limit={}",
            id, descriptor.source_id, window.offset, window.limit
        );

        match self.channel.send(task) {
            Ok(()) => self.stats.record_dispatched(),
            Err(e) => {
                warn!("task {} could not be sent: {}", id, e);
                self.table.settle(id, Err(StreamError::ChannelClosed));
            }
        }

        pending
    }
}
