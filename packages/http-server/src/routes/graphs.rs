//! `/api/graphs` and its sub-resources: list/read/create/delete plus the
//! stats, neighbors, and impact reads that hang off a single graph id
//! (spec §6). Every read goes through the result cache; every write
//! invalidates that graph's cached entries before returning.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use engine_contract::contract::CreateGraphParams;
use engine_contract::Operation;
use graph_domain::CreateGraphRequest;
use result_cache::hash_parameters;
use serde::Deserialize;

use crate::context::{resolve_engine, RequestContext};
use crate::error::ApiResult;
use crate::routes::{cached_json_response, tagged_response};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/graphs", get(list_graphs).post(create_graph))
        .route("/api/graphs/{id}", get(get_graph).delete(delete_graph))
        .route("/api/graphs/{id}/stats", get(get_graph_stats))
        .route("/api/graphs/{id}/neighbors/{node_id}", get(get_neighbors))
        .route("/api/graphs/{id}/impact", post(compute_impact))
}

async fn list_graphs(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> ApiResult<axum::response::Response> {
    let engine = resolve_engine(&state, &ctx, Operation::ListGraphs)?;
    let database = ctx.database.clone();
    let response = cached_json_response(
        &state,
        &ctx,
        engine.name(),
        "*",
        "list_graphs",
        0,
        || async move { engine.list_graphs(database.as_deref()).await },
    )
    .await?;
    Ok(response)
}

async fn get_graph(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> ApiResult<axum::response::Response> {
    let engine = resolve_engine(&state, &ctx, Operation::GetGraph)?;
    let database = ctx.database.clone();
    let graph_id = id.clone();
    let response = cached_json_response(
        &state,
        &ctx,
        engine.name(),
        &id,
        "get_graph",
        0,
        || async move { engine.get_graph(&graph_id, database.as_deref()).await },
    )
    .await?;
    Ok(response)
}

async fn get_graph_stats(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> ApiResult<axum::response::Response> {
    let engine = resolve_engine(&state, &ctx, Operation::GetGraphStats)?;
    let database = ctx.database.clone();
    let graph_id = id.clone();
    let response = cached_json_response(
        &state,
        &ctx,
        engine.name(),
        &id,
        "get_graph_stats",
        0,
        || async move { engine.get_graph_stats(&graph_id, database.as_deref()).await },
    )
    .await?;
    Ok(response)
}

#[derive(Debug, Deserialize)]
struct NeighborsQuery {
    #[serde(default = "default_hops")]
    hops: u32,
}

fn default_hops() -> u32 {
    1
}

async fn get_neighbors(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((id, node_id)): Path<(String, String)>,
    axum::extract::Query(q): axum::extract::Query<NeighborsQuery>,
) -> ApiResult<axum::response::Response> {
    let engine = resolve_engine(&state, &ctx, Operation::GetNodeNeighbors)?;
    let database = ctx.database.clone();
    let graph_id = id.clone();
    let node_id_for_call = node_id.clone();
    let parameters_hash = hash_parameters(&(&node_id, q.hops));
    let response = cached_json_response(
        &state,
        &ctx,
        engine.name(),
        &id,
        "get_node_neighbors",
        parameters_hash,
        || async move {
            engine
                .get_node_neighbors(&graph_id, &node_id_for_call, q.hops, database.as_deref())
                .await
        },
    )
    .await?;
    Ok(response)
}

async fn create_graph(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(body): Json<CreateGraphRequest>,
) -> ApiResult<(StatusCode, axum::response::Response)> {
    let engine = resolve_engine(&state, &ctx, Operation::CreateGraph)?;

    let request = match body.explicit_payload() {
        Some(_) => body,
        None => {
            let mermaid_code = body.mermaid_code.as_deref().ok_or_else(|| {
                graph_domain::GraphError::Invalid(
                    "create requires either mermaid_code or both nodes and edges".to_string(),
                )
            })?;
            let payload = engine_mermaid::parse_mermaid(mermaid_code)
                .map_err(graph_domain::GraphError::from)?;
            CreateGraphRequest {
                nodes: Some(payload.nodes),
                edges: Some(payload.edges),
                ..body
            }
        }
    };

    let summary = engine
        .create_graph(CreateGraphParams {
            database: ctx.database.clone(),
            request,
        })
        .await?;

    state
        .cache
        .invalidate_graph(engine.name(), ctx.database.as_deref(), "*");

    Ok((
        StatusCode::CREATED,
        tagged_response(engine.name(), "BYPASS", &summary),
    ))
}

async fn delete_graph(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let engine = resolve_engine(&state, &ctx, Operation::DeleteGraph)?;
    engine.delete_graph(&id, ctx.database.as_deref()).await?;

    state
        .cache
        .invalidate_graph(engine.name(), ctx.database.as_deref(), &id);
    state
        .cache
        .invalidate_graph(engine.name(), ctx.database.as_deref(), "*");

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct ImpactRequest {
    #[serde(rename = "nodeId")]
    node_id: String,
    depth: i64,
}

async fn compute_impact(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    Json(body): Json<ImpactRequest>,
) -> ApiResult<axum::response::Response> {
    let engine = resolve_engine(&state, &ctx, Operation::ComputeImpact)?;
    let result = engine_contract::impact::run(
        &engine,
        ctx.database.clone(),
        &id,
        &body.node_id,
        body.depth,
    )
    .await?;
    Ok(tagged_response(engine.name(), "BYPASS", &result))
}
