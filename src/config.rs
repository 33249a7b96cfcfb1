use std::time::Duration;

use serde::Deserialize;

use crate::error::StreamError;
use crate::server::compat::CompatConfig;

/// Largest window requested from the chunk worker in one task (512 KB).
pub const STREAM_CHUNK_UPPER_LIMIT: u64 = 512 * 1024;

/// Smallest chunk granularity (2 KB); a lower bound on the window only when
/// `floor_to_smallest_chunk` is set.
pub const SMALLEST_CHUNK_LIMIT: u64 = 512 * 4;

/// How long a ranged request may wait for its chunk before answering 408.
pub const REQUEST_TIMEOUT_MS: u64 = 45 * 1000;

/// Mime type used for the canned probe response when the descriptor has none.
pub const PROBE_FALLBACK_MIME: &str = "video/mp4";

/// Top-level configuration for the streaming proxy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Upper bound of a single chunk-fetch window in bytes. Power of two.
    pub chunk_upper_limit: u64,
    /// Chunk granularity in bytes. Power of two.
    pub smallest_chunk_limit: u64,
    /// Never request a window smaller than `smallest_chunk_limit`.
    pub floor_to_smallest_chunk: bool,
    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// Address the local HTTP server binds to.
    pub listen_addr: String,
    /// Answer `bytes=0-1` probes with a canned response instead of dispatching.
    pub probe_shortcut: bool,
    /// Reject malformed Range headers instead of defaulting their fields.
    pub strict_range: bool,
    /// Which clients get exact byte ranges instead of aligned chunks.
    pub compat: CompatConfig,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            chunk_upper_limit: STREAM_CHUNK_UPPER_LIMIT,
            smallest_chunk_limit: SMALLEST_CHUNK_LIMIT,
            floor_to_smallest_chunk: false,
            request_timeout_ms: REQUEST_TIMEOUT_MS,
            listen_addr: "127.0.0.1:0".to_string(),
            probe_shortcut: true,
            strict_range: false,
            compat: CompatConfig::default(),
        }
    }
}

impl StreamConfig {
    /// Parse a JSON document, filling unspecified fields with defaults.
    pub fn from_json(raw: &str) -> Result<Self, StreamError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|e| StreamError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), StreamError> {
        if !self.chunk_upper_limit.is_power_of_two() {
            return Err(StreamError::Config(format!(
                "chunk_upper_limit {} is not a power of two",
                self.chunk_upper_limit
            )));
        }
        if !self.smallest_chunk_limit.is_power_of_two() {
            return Err(StreamError::Config(format!(
                "smallest_chunk_limit {} is not a power of two",
                self.smallest_chunk_limit
            )));
        }
        if self.smallest_chunk_limit > self.chunk_upper_limit {
            return Err(StreamError::Config(format!(
                "smallest_chunk_limit {} exceeds chunk_upper_limit {}",
                self.smallest_chunk_limit, self.chunk_upper_limit
            )));
        }
        if self.request_timeout_ms == 0 {
            return Err(StreamError::Config("request_timeout_ms must be > 0".into()));
        }
        Ok(())
    }

    /// Lower bound handed to the aligner: the granularity when flooring is
    /// enabled, otherwise a single byte.
    pub fn chunk_floor(&self) -> u64 {
        if self.floor_to_smallest_chunk {
            self.smallest_chunk_limit
        } else {
            1
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
