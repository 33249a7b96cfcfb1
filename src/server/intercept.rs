// Intercepting request handler: turns ranged stream requests into chunk tasks
// and races the result against the request timeout.

use std::sync::Arc;

use axum::body::HttpBody;
use axum::extract::Request;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::{debug, error, info, warn};

use super::compat::{ClientHints, CompatPolicy};
use super::descriptor::StreamDescriptor;
use super::synth::{probe_response, synthesize};
use crate::config::StreamConfig;
use crate::engine::dispatcher::TaskDispatcher;
use crate::engine::stats::StatsCollector;
use crate::error::StreamError;
use crate::range::align::align;
use crate::range::codec::RangeWindow;

/// Path scope served by this handler.
pub const STREAM_SCOPE: &str = "stream";

pub struct StreamInterceptor {
    config: StreamConfig,
    dispatcher: TaskDispatcher,
    compat: Arc<dyn CompatPolicy>,
    stats: Arc<StatsCollector>,
}

impl StreamInterceptor {
    pub fn new(config: StreamConfig, dispatcher: TaskDispatcher, stats: Arc<StatsCollector>) -> Self {
        let compat = config.compat.build();
        Self {
            config,
            dispatcher,
            compat,
            stats,
        }
    }

    /// Answer one intercepted request. Always produces a response.
    pub async fn handle(&self, request: Request) -> Response {
        let (parts, _body) = request.into_parts();

        let (scope, params) = match split_scope(parts.uri.path()) {
            Ok(split) => split,
            Err(e) => return self.error_response(e),
        };

        match scope {
            STREAM_SCOPE => self.handle_stream(params, &parts.headers).await,
            other => {
                debug!("scope {:?} is not handled here", other);
                StatusCode::NOT_FOUND.into_response()
            }
        }
    }

    async fn handle_stream(&self, params: &str, headers: &HeaderMap) -> Response {
        let descriptor = match StreamDescriptor::decode(params) {
            Ok(d) => d,
            Err(e) => return self.error_response(e),
        };

        let range_header = headers.get(header::RANGE).and_then(|v| v.to_str().ok());
        let range = if self.config.strict_range {
            match RangeWindow::parse_strict(range_header) {
                Ok(r) => r,
                Err(e) => return self.error_response(e),
            }
        } else {
            RangeWindow::parse(range_header)
        };
        let client = ClientHints::from_headers(headers);

        debug!(
            "stream request source={} offset={} end={:?}",
            descriptor.source_id, range.offset, range.end_inclusive
        );

        // Dropping the losing branch abandons its table entry; a reply that
        // still arrives later is discarded by the inbound handler.
        let result = tokio::select! {
            result = self.serve(&range, &descriptor, &client) => result,
            _ = tokio::time::sleep(self.config.request_timeout()) => {
                self.stats.record_timeout();
                Err(StreamError::Timeout(self.config.request_timeout_ms))
            }
        };

        match result {
            Ok(response) => response,
            Err(e) => self.error_response(e),
        }
    }

    async fn serve(
        &self,
        range: &RangeWindow,
        descriptor: &StreamDescriptor,
        client: &ClientHints,
    ) -> Result<Response, StreamError> {
        if self.config.probe_shortcut && range.is_probe() {
            self.stats.record_probe();
            return probe_response(descriptor);
        }

        let window = align(
            range.offset,
            range.end_inclusive,
            self.config.chunk_upper_limit,
            self.config.chunk_floor(),
        );

        let bytes = self.dispatcher.dispatch(descriptor, window).await?;

        let exact = self.compat.wants_exact_range(client);
        debug!(
            "chunk ready offset={} limit={} bytes={} exact={}",
            window.offset,
            window.limit,
            bytes.len(),
            exact
        );
        let response = synthesize(range, descriptor, window, bytes, exact)?;
        // Count what goes out, which is less than the chunk when sliced.
        self.stats
            .record_served(response.body().size_hint().exact().unwrap_or(0));
        Ok(response)
    }

    fn error_response(&self, err: StreamError) -> Response {
        let status = err.status_code();
        match &err {
            StreamError::Timeout(_) => info!("stream request timed out: {}", err),
            StreamError::MalformedRequest(_) | StreamError::InvalidRange(_) => {
                warn!("rejecting stream request: {}", err)
            }
            _ => error!("stream request failed: {}", err),
        }
        status.into_response()
    }
}

/// Split `/{scope}/{params}` into its two parts; `params` may be empty.
fn split_scope(path: &str) -> Result<(&str, &str), StreamError> {
    let rest = path.strip_prefix('/').unwrap_or(path);
    let (scope, params) = rest.split_once('/').unwrap_or((rest, ""));
    if scope.is_empty() {
        return Err(StreamError::MalformedRequest(format!(
            "no scope in path {:?}",
            path
        )));
    }
    Ok((scope, params))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_scope() {
        assert_eq!(split_scope("/stream/abc").unwrap(), ("stream", "abc"));
        assert_eq!(split_scope("/stream/a/b").unwrap(), ("stream", "a/b"));
        assert_eq!(split_scope("/stream").unwrap(), ("stream", ""));
        assert_eq!(split_scope("/other/x").unwrap(), ("other", "x"));
        assert!(split_scope("/").is_err());
        assert!(split_scope("").is_err());
    }
}
