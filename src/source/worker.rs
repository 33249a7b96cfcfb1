// Chunk worker loop: consumes tasks from the link, fetches parts, posts replies.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::channel::WorkerEndpoint;
use super::traits::PartFetcher;
use crate::engine::task::ChunkTaskResult;

pub struct ChunkWorker {
    fetcher: Arc<dyn PartFetcher>,
    semaphore: Arc<Semaphore>,
}

impl ChunkWorker {
    pub fn new(fetcher: Arc<dyn PartFetcher>, max_concurrency: u32) -> Self {
        Self {
            fetcher,
            semaphore: Arc::new(Semaphore::new((max_concurrency as usize).max(1))),
        }
    }

    /// Serve tasks until the proxy hangs up or `shutdown` fires. Every task
    /// gets exactly one reply, with no payload when the fetch failed.
    pub async fn run(self, endpoint: WorkerEndpoint, shutdown: CancellationToken) {
        let WorkerEndpoint {
            mut tasks,
            replies,
        } = endpoint;

        loop {
            let task = tokio::select! {
                task = tasks.recv() => match task {
                    Some(task) => task,
                    None => {
                        debug!("task channel closed, worker exiting");
                        break;
                    }
                },
                _ = shutdown.cancelled() => {
                    debug!("worker shutting down");
                    break;
                }
            };

            let permit = tokio::select! {
                permit = Arc::clone(&self.semaphore).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
                _ = shutdown.cancelled() => break,
            };

            let fetcher = Arc::clone(&self.fetcher);
            let replies = replies.clone();
            tokio::spawn(async move {
                let _permit = permit;
                let id = task.id;
                let result = match fetcher.fetch_part(&task.payload).await {
                    Ok(bytes) => {
                        debug!("task {} fetched {} bytes", id, bytes.len());
                        ChunkTaskResult::success(id, bytes)
                    }
                    Err(e) => {
                        warn!("task {} fetch failed: {}", id, e);
                        ChunkTaskResult::failure(id)
                    }
                };
                if replies.send(result).is_err() {
                    debug!("proxy gone, dropping reply for task {}", id);
                }
            });
        }
    }
}
