// Error taxonomy for the streaming path and its HTTP status mapping.

use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StreamError {
    /// URL scope or parameter blob could not be decoded.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// Range header rejected by strict parsing.
    #[error("invalid range: {0}")]
    InvalidRange(String),

    /// The chunk worker replied without a payload.
    #[error("remote fetch failed for task {0}")]
    RemoteFetchFailure(u64),

    /// The outbound channel to the chunk worker is gone.
    #[error("chunk channel closed")]
    ChannelClosed,

    #[error("timed out after {0} ms")]
    Timeout(u64),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("http error: {0}")]
    Http(#[from] axum::http::Error),
}

impl StreamError {
    /// Status code the intercepting handler answers with for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            StreamError::InvalidRange(_) => StatusCode::RANGE_NOT_SATISFIABLE,
            StreamError::RemoteFetchFailure(_) => StatusCode::BAD_GATEWAY,
            StreamError::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
            StreamError::MalformedRequest(_)
            | StreamError::ChannelClosed
            | StreamError::Config(_)
            | StreamError::Http(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
