// Wire types exchanged with the chunk worker.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Correlation identifier linking a task to its reply.
pub type TaskId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskKind {
    #[serde(rename = "requestFilePart")]
    RequestFilePart,
}

/// Positional payload: `[source_id, location, aligned_offset, aligned_limit]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilePartRequest(pub u32, pub Value, pub u64, pub u64);

impl FilePartRequest {
    pub fn source_id(&self) -> u32 {
        self.0
    }

    pub fn location(&self) -> &Value {
        &self.1
    }

    pub fn offset(&self) -> u64 {
        self.2
    }

    pub fn limit(&self) -> u64 {
        self.3
    }
}

/// A single chunk fetch handed to the worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkTask {
    pub id: TaskId,
    #[serde(rename = "type")]
    pub kind: TaskKind,
    pub payload: FilePartRequest,
}

/// The worker's answer; a missing payload means the fetch failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkTaskResult {
    pub id: TaskId,
    #[serde(rename = "type")]
    pub kind: TaskKind,
    pub payload: Option<Bytes>,
}

impl ChunkTaskResult {
    pub fn success(id: TaskId, bytes: Bytes) -> Self {
        Self {
            id,
            kind: TaskKind::RequestFilePart,
            payload: Some(bytes),
        }
    }

    pub fn failure(id: TaskId) -> Self {
        Self {
            id,
            kind: TaskKind::RequestFilePart,
            payload: None,
        }
    }
}
