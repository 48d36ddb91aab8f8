mod cache_stats;
mod databases;
mod engines;
mod graphs;
mod health;
mod query;

use std::future::Future;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use graph_domain::{GraphError, Result as GraphResult};
use result_cache::{CacheOutcome, Fingerprint};
use serde::Serialize;

use crate::context::RequestContext;
use crate::error::ApiError;
use crate::state::AppState;

/// Write bodies up to this size are accepted (spec §4.I: >=50 MiB, enough
/// to admit the demo 20k-node seed graph).
const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(engines::router())
        .merge(databases::router())
        .merge(graphs::router())
        .merge(query::router())
        .merge(cache_stats::router())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

/// Wraps a successful JSON body with the `X-Engine` and `X-Cache` headers
/// every data response carries (spec §4.I).
pub(crate) fn tagged_response<T: Serialize>(
    engine: &str,
    cache_status: &'static str,
    body: &T,
) -> Response {
    let mut response = Json(body).into_response();
    insert_tag_headers(&mut response, engine, cache_status);
    response
}

pub(crate) fn insert_tag_headers(response: &mut Response, engine: &str, cache_status: &'static str) {
    if let Ok(v) = HeaderValue::from_str(engine) {
        response.headers_mut().insert("x-engine", v);
    }
    response
        .headers_mut()
        .insert("x-cache", HeaderValue::from_static(cache_status));
}

/// Runs `compute` through the result cache fingerprinted by
/// `(engine, database, graph_id, operation, parameters_hash)`, then returns
/// a tagged JSON response reflecting whether it was a hit, miss, or bypass
/// (spec §4.G, §8: hit/miss must be observable via a response header).
pub(crate) async fn cached_json_response<T, F, Fut>(
    state: &AppState,
    ctx: &RequestContext,
    engine_name: &str,
    graph_id: &str,
    operation: &'static str,
    parameters_hash: u64,
    compute: F,
) -> Result<Response, ApiError>
where
    T: Serialize,
    F: FnOnce() -> Fut,
    Fut: Future<Output = GraphResult<T>>,
{
    let fingerprint = Fingerprint::new(
        engine_name,
        ctx.database.clone(),
        graph_id,
        operation,
        parameters_hash,
    );

    let (value, outcome) = state
        .cache
        .get_or_compute(fingerprint, ctx.nocache, || async {
            let result = compute().await?;
            serde_json::to_value(result).map_err(|e| GraphError::internal(SerializeFailed(e.to_string())))
        })
        .await
        .map_err(ApiError::from)?;

    let cache_header = match outcome {
        CacheOutcome::Hit => "HIT",
        CacheOutcome::Miss => "MISS",
        CacheOutcome::Bypass => "BYPASS",
    };

    Ok(tagged_response(engine_name, cache_header, value.as_ref()))
}

#[derive(Debug, thiserror::Error)]
#[error("failed to serialize cached value: {0}")]
struct SerializeFailed(String);
