//! `?engine=&database=&nocache=&nocompress=` — the four cross-cutting query
//! parameters every data endpoint accepts (spec §4.I/§6). Parsed once per
//! request via this extractor instead of re-parsing `Query<..>` in every
//! handler.

use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize, Default)]
struct RawParams {
    engine: Option<String>,
    database: Option<String>,
    #[serde(default)]
    nocache: bool,
    #[serde(default)]
    nocompress: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub engine: Option<String>,
    pub database: Option<String>,
    pub nocache: bool,
    pub nocompress: bool,
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(raw) = Query::<RawParams>::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                ApiError(graph_domain::GraphError::Invalid(format!(
                    "invalid query parameters: {e}"
                )))
            })?;

        Ok(RequestContext {
            engine: raw.engine,
            database: raw.database,
            nocache: raw.nocache,
            nocompress: raw.nocompress,
        })
    }
}

/// Resolve the `RequestContext`'s engine against `state`'s registry and
/// additionally assert the adapter supports `operation`.
pub fn resolve_engine(
    state: &AppState,
    ctx: &RequestContext,
    operation: engine_contract::Operation,
) -> Result<std::sync::Arc<dyn engine_contract::GraphEngine>, ApiError> {
    state
        .registry
        .resolve_for(ctx.engine.as_deref(), operation)
        .map_err(ApiError::from)
}
