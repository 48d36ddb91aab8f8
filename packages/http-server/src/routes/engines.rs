use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
struct EnginesResponse {
    available: Vec<String>,
    default: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/engines", get(list_engines))
}

async fn list_engines(State(state): State<AppState>) -> Json<EnginesResponse> {
    Json(EnginesResponse {
        available: state.registry.available(),
        default: state.registry.default_engine().to_string(),
    })
}
