//! Gzip response negotiation with a per-request `?nocompress=true` bypass
//! (spec §4.I). `tower_http::CompressionLayer` has no query-flag bypass
//! hook, so this is a small hand-rolled `from_fn` layer built directly on
//! `flate2`, in the same spirit as this workspace's other hand-rolled
//! protocol layers.

use axum::body::{to_bytes, Body};
use axum::extract::Request;
use axum::http::header::{ACCEPT_ENCODING, CONTENT_ENCODING, CONTENT_LENGTH};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;

/// Response bodies smaller than this are never worth the gzip framing
/// overhead; the spec's compression property (§8) is only asserted for
/// bodies >= 1 KiB.
const MIN_COMPRESSIBLE_BYTES: usize = 1024;

/// Bound on how much of a response this layer will buffer to gzip it. The
/// body-size ceiling for writes (spec §4.I) is enforced on the request side
/// by `DefaultBodyLimit`; this protects the response side from buffering an
/// unbounded body in memory just to compress it.
const MAX_BUFFERABLE_BYTES: usize = 64 * 1024 * 1024;

pub async fn negotiate_gzip(request: Request, next: Next) -> Response {
    let nocompress = request
        .uri()
        .query()
        .map(|q| q.split('&').any(|pair| pair == "nocompress=true"))
        .unwrap_or(false);

    let accepts_gzip = request
        .headers()
        .get(ACCEPT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("gzip"))
        .unwrap_or(false);

    let response = next.run(request).await;

    if nocompress || !accepts_gzip {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let Ok(bytes) = to_bytes(body, MAX_BUFFERABLE_BYTES).await else {
        return Response::from_parts(parts, Body::empty());
    };

    if bytes.len() < MIN_COMPRESSIBLE_BYTES {
        return Response::from_parts(parts, Body::from(bytes));
    }

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    if encoder.write_all(&bytes).is_err() {
        return Response::from_parts(parts, Body::from(bytes));
    }
    let Ok(compressed) = encoder.finish() else {
        return Response::from_parts(parts, Body::from(bytes));
    };

    parts.headers.insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
    parts
        .headers
        .insert(CONTENT_LENGTH, HeaderValue::from(compressed.len()));

    Response::from_parts(parts, Body::from(compressed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gzip_shrinks_a_repetitive_body_past_the_threshold() {
        let payload = vec![b'a'; MIN_COMPRESSIBLE_BYTES * 4];
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&payload).unwrap();
        let compressed = encoder.finish().unwrap();
        assert!(compressed.len() < payload.len());
    }
}
