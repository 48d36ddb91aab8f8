//! Stamps every response with `X-Response-Time-Ms`, measured on a monotonic
//! clock from the moment the request entered this layer (spec §4.I).

use std::time::Instant;

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;

pub async fn track_response_time(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let mut response = next.run(request).await;

    let elapsed_ms = started.elapsed().as_millis();
    if let Ok(value) = HeaderValue::from_str(&elapsed_ms.to_string()) {
        response.headers_mut().insert("x-response-time-ms", value);
    }
    response
}
