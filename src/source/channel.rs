// In-process worker link: task and reply channels between proxy and worker.

use tokio::sync::mpsc;

use super::traits::ChunkChannel;
use crate::engine::task::{ChunkTask, ChunkTaskResult};
use crate::error::StreamError;

/// `ChunkChannel` backed by an unbounded tokio channel.
#[derive(Clone)]
pub struct MpscChunkChannel {
    tx: mpsc::UnboundedSender<ChunkTask>,
}

impl ChunkChannel for MpscChunkChannel {
    fn send(&self, task: ChunkTask) -> Result<(), StreamError> {
        self.tx.send(task).map_err(|_| StreamError::ChannelClosed)
    }
}

/// Proxy half of the link.
pub struct ProxyEndpoint {
    pub tasks: MpscChunkChannel,
    pub replies: mpsc::UnboundedReceiver<ChunkTaskResult>,
}

/// Worker half of the link.
pub struct WorkerEndpoint {
    pub tasks: mpsc::UnboundedReceiver<ChunkTask>,
    pub replies: mpsc::UnboundedSender<ChunkTaskResult>,
}

impl WorkerEndpoint {
    /// Post a reply back to the proxy. Returns `false` once the proxy is gone.
    pub fn reply(&self, result: ChunkTaskResult) -> bool {
        self.replies.send(result).is_ok()
    }
}

pub fn worker_link() -> (ProxyEndpoint, WorkerEndpoint) {
    let (task_tx, task_rx) = mpsc::unbounded_channel();
    let (reply_tx, reply_rx) = mpsc::unbounded_channel();
    (
        ProxyEndpoint {
            tasks: MpscChunkChannel { tx: task_tx },
            replies: reply_rx,
        },
        WorkerEndpoint {
            tasks: task_rx,
            replies: reply_tx,
        },
    )
}
