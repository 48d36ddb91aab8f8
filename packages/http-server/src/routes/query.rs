//! `POST /api/query` — raw query execution against the resolved engine's
//! native dialect. Deliberately bypasses the result cache (spec §9): an
//! arbitrary query has no stable fingerprint shape worth caching and callers
//! expect to see their own side effects immediately.

use axum::extract::State;
use axum::routing::post;
use axum::Router;
use engine_contract::Operation;
use serde::Deserialize;

use crate::context::{resolve_engine, RequestContext};
use crate::error::ApiResult;
use crate::routes::tagged_response;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct RawQueryRequest {
    query: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/query", post(execute_query))
}

async fn execute_query(
    State(state): State<AppState>,
    ctx: RequestContext,
    axum::Json(body): axum::Json<RawQueryRequest>,
) -> ApiResult<axum::response::Response> {
    let engine = resolve_engine(&state, &ctx, Operation::ExecuteRawQuery)?;
    let result = engine
        .execute_raw_query(&body.query, ctx.database.as_deref())
        .await?;
    Ok(tagged_response(engine.name(), "BYPASS", &result))
}
