use std::collections::HashMap;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::traits::PartFetcher;
use crate::engine::task::FilePartRequest;

#[derive(Debug, Clone, Deserialize)]
pub struct HttpFetcherConfig {
    /// Base URL per source identifier.
    pub origins: HashMap<u32, String>,
    /// Extra headers sent with every request (auth tokens and the like).
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_max_retries() -> u32 {
    3
}

/// Fetches file parts from plain HTTP origins with Range requests.
///
/// The task location is resolved against the origin of its source id: a JSON
/// string is taken as a path, an object must carry a string `path` field.
pub struct HttpPartFetcher {
    client: Client,
    origins: HashMap<u32, String>,
    headers: RwLock<HashMap<String, String>>,
    max_retries: u32,
}

impl HttpPartFetcher {
    pub fn new(config: HttpFetcherConfig) -> Self {
        Self {
            client: Client::new(),
            origins: config.origins,
            headers: RwLock::new(config.headers),
            max_retries: config.max_retries,
        }
    }

    /// Swap the request headers (e.g. after token refresh).
    pub fn update_headers(&self, new_headers: HashMap<String, String>) {
        *self.headers.write() = new_headers;
    }

    fn resolve_url(&self, request: &FilePartRequest) -> Result<String> {
        let origin = self
            .origins
            .get(&request.source_id())
            .ok_or_else(|| anyhow!("no origin for source {}", request.source_id()))?;
        let path = match request.location() {
            Value::String(path) => path.as_str(),
            Value::Object(map) => map
                .get("path")
                .and_then(Value::as_str)
                .ok_or_else(|| anyhow!("location object has no string `path`"))?,
            other => return Err(anyhow!("unsupported location {}", other)),
        };
        Ok(format!(
            "{}/{}",
            origin.trim_end_matches('/'),
            path.trim_start_matches('/')
        ))
    }

    fn build_request(&self, url: &str, range: &str) -> RequestBuilder {
        let headers = self.headers.read().clone();
        let mut req = self.client.get(url);
        for (k, v) in &headers {
            req = req.header(k.as_str(), v.as_str());
        }
        req.header("Range", range)
    }

    async fn fetch_once(&self, url: &str, offset: u64, limit: u64) -> Result<Bytes> {
        let end = offset.saturating_add(limit.max(1) - 1);
        let range = format!("bytes={}-{}", offset, end);
        let resp = self.build_request(url, &range).send().await?;

        let status = resp.status();
        if status == StatusCode::RANGE_NOT_SATISFIABLE {
            // Past the end of the file: an empty part.
            return Ok(Bytes::new());
        }
        if !status.is_success() {
            warn!(
                "http part fetch failed status={} range={}",
                status.as_u16(),
                range
            );
            return Err(anyhow!("fetch_part failed: HTTP {}", status.as_u16()));
        }

        let bytes = resp.bytes().await?;
        if status == StatusCode::PARTIAL_CONTENT {
            return Ok(bytes);
        }

        // Origin ignored the Range header and sent the whole file.
        let len = bytes.len() as u64;
        let from = offset.min(len) as usize;
        let to = offset.saturating_add(limit).min(len) as usize;
        Ok(bytes.slice(from..to))
    }
}

#[async_trait]
impl PartFetcher for HttpPartFetcher {
    async fn fetch_part(&self, request: &FilePartRequest) -> Result<Bytes> {
        let url = self.resolve_url(request)?;

        for attempt in 0..=self.max_retries {
            match self.fetch_once(&url, request.offset(), request.limit()).await {
                Ok(bytes) => {
                    debug!(
                        "part fetched url={} offset={} bytes={}",
                        url,
                        request.offset(),
                        bytes.len()
                    );
                    return Ok(bytes);
                }
                Err(e) if attempt < self.max_retries => {
                    warn!("part fetch failed (attempt {}): {}", attempt, e);
                    tokio::time::sleep(Duration::from_millis(500 * (attempt as u64 + 1))).await;
                }
                Err(e) => {
                    warn!(
                        "part fetch failed after {} retries: {}",
                        self.max_retries, e
                    );
                    return Err(e);
                }
            }
        }

        Err(anyhow!("part fetch gave up"))
    }
}
