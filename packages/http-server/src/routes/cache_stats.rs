use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
struct CacheStatsResponse {
    #[serde(rename = "cachedGraphs")]
    cached_graphs: u64,
    hits: u64,
    misses: u64,
    bypasses: u64,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/optim/cache/stats", get(cache_stats))
}

async fn cache_stats(State(state): State<AppState>) -> Json<CacheStatsResponse> {
    let counters = state.cache.counters();
    Json(CacheStatsResponse {
        cached_graphs: state.cache.entry_count(),
        hits: counters.hits,
        misses: counters.misses,
        bypasses: counters.bypasses,
    })
}
