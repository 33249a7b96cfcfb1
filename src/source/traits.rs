use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;

use crate::engine::task::{ChunkTask, FilePartRequest};
use crate::error::StreamError;

/// Outbound side of the worker boundary.
///
/// `send` must not block; it fails only when the worker can no longer
/// receive tasks.
pub trait ChunkChannel: Send + Sync {
    fn send(&self, task: ChunkTask) -> Result<(), StreamError>;
}

/// Performs the actual retrieval of one file part on the worker side.
#[async_trait]
pub trait PartFetcher: Send + Sync {
    async fn fetch_part(&self, request: &FilePartRequest) -> Result<Bytes>;
}
