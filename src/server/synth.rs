// Response synthesis: builds partial-content replies from chunk bytes.

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::Response;
use bytes::Bytes;

use super::descriptor::StreamDescriptor;
use crate::config::PROBE_FALLBACK_MIME;
use crate::error::StreamError;
use crate::range::align::AlignedWindow;
use crate::range::codec::RangeWindow;

/// Build the 206 reply for a chunk returned by the worker.
///
/// With `exact` set, the chunk is cut down to the client's requested span and
/// `Content-Range` describes that span; otherwise the whole aligned chunk is
/// returned as-is.
///
/// A chunk that leaves nothing to send yields 416 with `bytes */{size}`. This
/// is the only non-206 reply built here, since a zero-length 206 has no valid
/// `Content-Range`.
pub fn synthesize(
    request: &RangeWindow,
    descriptor: &StreamDescriptor,
    window: AlignedWindow,
    bytes: Bytes,
    exact: bool,
) -> Result<Response, StreamError> {
    let (start, body) = if exact {
        (request.offset, slice_exact(request, window, bytes))
    } else {
        (window.offset, bytes)
    };

    if body.is_empty() {
        return unsatisfiable(descriptor);
    }

    let len = body.len() as u64;
    let content_range = format!(
        "bytes {}-{}/{}",
        start,
        start + len - 1,
        descriptor.size_label()
    );

    let mut builder = Response::builder()
        .status(StatusCode::PARTIAL_CONTENT)
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CONTENT_RANGE, content_range)
        .header(header::CONTENT_LENGTH, len);
    if let Some(mime) = &descriptor.mime_type {
        builder = builder.header(header::CONTENT_TYPE, mime.as_str());
    }

    Ok(builder.body(Body::from(body))?)
}

/// Canned two-byte reply for the `bytes=0-1` probe, answered without a fetch.
pub fn probe_response(descriptor: &StreamDescriptor) -> Result<Response, StreamError> {
    let mime = descriptor.mime_type.as_deref().unwrap_or(PROBE_FALLBACK_MIME);
    let response = Response::builder()
        .status(StatusCode::PARTIAL_CONTENT)
        .header(header::ACCEPT_RANGES, "bytes")
        .header(
            header::CONTENT_RANGE,
            format!("bytes 0-1/{}", descriptor.size_label()),
        )
        .header(header::CONTENT_LENGTH, 2u64)
        .header(header::CONTENT_TYPE, mime)
        .body(Body::from(vec![0u8; 2]))?;
    Ok(response)
}

fn unsatisfiable(descriptor: &StreamDescriptor) -> Result<Response, StreamError> {
    let response = Response::builder()
        .status(StatusCode::RANGE_NOT_SATISFIABLE)
        .header(
            header::CONTENT_RANGE,
            format!("bytes */{}", descriptor.size_label()),
        )
        .body(Body::empty())?;
    Ok(response)
}

/// Cut `[request.offset, request.end_inclusive]` out of a chunk that starts at
/// `window.offset`, clamped to what the worker actually returned.
fn slice_exact(request: &RangeWindow, window: AlignedWindow, bytes: Bytes) -> Bytes {
    let len = bytes.len() as u64;
    let from = request.offset.saturating_sub(window.offset).min(len);
    let to = match request.end_inclusive {
        Some(end) if end >= request.offset => (end - window.offset).saturating_add(1).min(len),
        _ => len,
    };
    bytes.slice(from as usize..to.max(from) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn descriptor(size: Option<u64>, mime: Option<&str>) -> StreamDescriptor {
        StreamDescriptor {
            source_id: 1,
            location: json!(null),
            size,
            mime_type: mime.map(str::to_string),
        }
    }

    fn header_str<'a>(resp: &'a Response, name: header::HeaderName) -> &'a str {
        resp.headers().get(name).unwrap().to_str().unwrap()
    }

    #[test]
    fn test_aligned_chunk_headers() {
        let range = RangeWindow::parse(Some("bytes=100-199"));
        let window = AlignedWindow { offset: 0, limit: 256 };
        let resp = synthesize(
            &range,
            &descriptor(Some(5000), Some("video/webm")),
            window,
            Bytes::from(vec![7u8; 256]),
            false,
        )
        .unwrap();

        assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(header_str(&resp, header::ACCEPT_RANGES), "bytes");
        assert_eq!(header_str(&resp, header::CONTENT_RANGE), "bytes 0-255/5000");
        assert_eq!(header_str(&resp, header::CONTENT_LENGTH), "256");
        assert_eq!(header_str(&resp, header::CONTENT_TYPE), "video/webm");
    }

    #[test]
    fn test_short_chunk_and_unknown_size() {
        let range = RangeWindow::parse(Some("bytes=4096-"));
        let window = AlignedWindow { offset: 4096, limit: 4096 };
        let resp = synthesize(
            &range,
            &descriptor(None, None),
            window,
            Bytes::from(vec![1u8; 10]),
            false,
        )
        .unwrap();

        assert_eq!(header_str(&resp, header::CONTENT_RANGE), "bytes 4096-4105/*");
        assert_eq!(header_str(&resp, header::CONTENT_LENGTH), "10");
        assert!(resp.headers().get(header::CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_exact_slice_recomputes_headers() {
        let range = RangeWindow::parse(Some("bytes=100-199"));
        let window = AlignedWindow { offset: 0, limit: 256 };
        let chunk: Vec<u8> = (0..256u32).map(|i| i as u8).collect();
        let resp = synthesize(
            &range,
            &descriptor(Some(5000), None),
            window,
            Bytes::from(chunk),
            true,
        )
        .unwrap();

        assert_eq!(header_str(&resp, header::CONTENT_RANGE), "bytes 100-199/5000");
        assert_eq!(header_str(&resp, header::CONTENT_LENGTH), "100");
    }

    #[test]
    fn test_exact_slice_open_ended_and_clamped() {
        let window = AlignedWindow { offset: 0, limit: 1024 };

        let open = RangeWindow::parse(Some("bytes=1000-"));
        let sliced = slice_exact(&open, window, Bytes::from(vec![0u8; 1024]));
        assert_eq!(sliced.len(), 24);

        let past_end = RangeWindow::parse(Some("bytes=900-5000"));
        let sliced = slice_exact(&past_end, window, Bytes::from(vec![0u8; 950]));
        assert_eq!(sliced.len(), 50);

        let beyond = RangeWindow::parse(Some("bytes=1000-1010"));
        let sliced = slice_exact(&beyond, window, Bytes::from(vec![0u8; 500]));
        assert!(sliced.is_empty());
    }

    #[test]
    fn test_empty_chunk_is_unsatisfiable() {
        let range = RangeWindow::parse(Some("bytes=9000-"));
        let resp = synthesize(
            &range,
            &descriptor(Some(8000), None),
            AlignedWindow { offset: 8192, limit: 512 * 1024 },
            Bytes::new(),
            false,
        )
        .unwrap();
        assert_eq!(resp.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(header_str(&resp, header::CONTENT_RANGE), "bytes */8000");
    }

    #[test]
    fn test_probe_response() {
        let resp = probe_response(&descriptor(Some(1234), None)).unwrap();
        assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(header_str(&resp, header::CONTENT_RANGE), "bytes 0-1/1234");
        assert_eq!(header_str(&resp, header::CONTENT_LENGTH), "2");
        assert_eq!(header_str(&resp, header::CONTENT_TYPE), "video/mp4");

        let resp = probe_response(&descriptor(None, Some("audio/mpeg"))).unwrap();
        assert_eq!(header_str(&resp, header::CONTENT_RANGE), "bytes 0-1/*");
        assert_eq!(header_str(&resp, header::CONTENT_TYPE), "audio/mpeg");
    }
}
