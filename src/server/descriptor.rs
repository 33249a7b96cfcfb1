use axum::http::HeaderValue;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StreamError;

/// What the client wants streamed, carried URL-encoded in the request path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    #[serde(rename = "dcID", alias = "sourceIdentifier")]
    pub source_id: u32,
    /// Opaque to the proxy; forwarded to the worker as-is.
    pub location: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(
        rename = "mimeType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub mime_type: Option<String>,
}

impl StreamDescriptor {
    /// Decode the URL-encoded JSON blob that follows `/stream/`.
    pub fn decode(params: &str) -> Result<Self, StreamError> {
        let json = urlencoding::decode(params)
            .map_err(|e| StreamError::MalformedRequest(format!("bad url encoding: {}", e)))?;
        let descriptor: Self = serde_json::from_str(&json)
            .map_err(|e| StreamError::MalformedRequest(format!("bad stream params: {}", e)))?;

        if let Some(mime) = &descriptor.mime_type {
            if HeaderValue::from_str(mime).is_err() {
                return Err(StreamError::MalformedRequest(format!(
                    "mime type {:?} is not a valid header value",
                    mime
                )));
            }
        }
        Ok(descriptor)
    }

    /// Inverse of [`StreamDescriptor::decode`].
    pub fn encode(&self) -> String {
        // Serializing a struct of strings, numbers and a JSON value cannot fail.
        let json = serde_json::to_string(self).unwrap_or_default();
        urlencoding::encode(&json).into_owned()
    }

    /// Total size for `Content-Range`, or `*` when unknown.
    pub fn size_label(&self) -> String {
        match self.size {
            Some(size) if size > 0 => size.to_string(),
            _ => "*".to_string(),
        }
    }
}
