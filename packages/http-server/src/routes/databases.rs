use axum::extract::State;
use axum::routing::get;
use axum::Router;
use engine_contract::Operation;

use crate::context::{resolve_engine, RequestContext};
use crate::error::ApiResult;
use crate::routes::tagged_response;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/databases", get(list_databases))
}

async fn list_databases(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> ApiResult<axum::response::Response> {
    let engine = resolve_engine(&state, &ctx, Operation::ListDatabases)?;
    let databases = engine.list_databases().await?;
    Ok(tagged_response(engine.name(), "N/A", &databases))
}
