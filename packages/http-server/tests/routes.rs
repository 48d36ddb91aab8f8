//! Router-level tests driven through `tower::ServiceExt::oneshot` against an
//! in-memory stub engine, so the dispatch plane (engine routing, cache
//! headers, status codes) is exercised without a live back-end.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use engine_contract::contract::{CreateGraphParams, ImpactParams, Operation};
use engine_contract::{EngineRegistry, GraphEngine};
use graph_domain::{
    DatabaseInfo, Edge, GraphError, GraphPayload, GraphStats, GraphSummary, ImpactResult,
    ImpactedNode, Node, QueryResult, Result as GraphResult,
};
use http_server::state::AppState;
use result_cache::ResultCache;
use serde_json::{json, Value};
use tower::ServiceExt;

struct StubEngine;

#[async_trait]
impl GraphEngine for StubEngine {
    fn name(&self) -> &str {
        "stub"
    }

    async fn list_databases(&self) -> GraphResult<Vec<DatabaseInfo>> {
        Ok(vec![DatabaseInfo {
            name: "default".into(),
            is_default: true,
            status: "online".into(),
        }])
    }

    async fn list_graphs(&self, _: Option<&str>) -> GraphResult<Vec<GraphSummary>> {
        Ok(vec![])
    }

    async fn get_graph(&self, graph_id: &str, _: Option<&str>) -> GraphResult<GraphPayload> {
        if graph_id == "missing" {
            return Err(GraphError::NotFound(format!("graph '{graph_id}'")));
        }
        Ok(GraphPayload {
            nodes: vec![Node {
                id: "a".into(),
                label: "A".into(),
                node_type: "Process".into(),
                properties: json!({}),
            }],
            edges: vec![],
        })
    }

    async fn get_graph_stats(&self, _: &str, _: Option<&str>) -> GraphResult<GraphStats> {
        unimplemented!()
    }

    async fn create_graph(&self, params: CreateGraphParams) -> GraphResult<GraphSummary> {
        let payload = params.request.explicit_payload().unwrap_or_default();
        Ok(GraphSummary {
            id: "g1".into(),
            title: params.request.title,
            description: params.request.description,
            graph_type: params.request.graph_type,
            node_count: payload.nodes.len() as u64,
            edge_count: payload.edges.len() as u64,
            created_at: chrono::DateTime::from_timestamp(0, 0).unwrap(),
        })
    }

    async fn delete_graph(&self, _: &str, _: Option<&str>) -> GraphResult<()> {
        Ok(())
    }

    async fn get_node_neighbors(
        &self,
        _: &str,
        _: &str,
        _: u32,
        _: Option<&str>,
    ) -> GraphResult<GraphPayload> {
        Ok(GraphPayload::default())
    }

    async fn compute_impact(&self, params: ImpactParams) -> GraphResult<ImpactResult> {
        Ok(ImpactResult {
            source_id: params.source_id,
            impacted_nodes: vec![ImpactedNode {
                node_id: "b".into(),
                level: 1,
            }],
            depth: params.depth,
            elapsed_ms: 0,
            engine: String::new(),
        })
    }

    async fn execute_raw_query(&self, _: &str, _: Option<&str>) -> GraphResult<QueryResult> {
        unimplemented!()
    }

    fn supports(&self, operation: Operation) -> bool {
        !matches!(operation, Operation::ExecuteRawQuery)
    }
}

fn test_app() -> axum::Router {
    let registry = Arc::new(
        EngineRegistry::new(vec![Arc::new(StubEngine) as Arc<dyn GraphEngine>], "stub").unwrap(),
    );
    let cache = Arc::new(ResultCache::new(std::time::Duration::from_secs(60), 100));
    http_server::build_app(AppState { registry, cache })
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_check_is_ok() {
    let app = test_app();
    let response = app
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn engines_lists_the_registered_stub() {
    let app = test_app();
    let response = app
        .oneshot(Request::builder().uri("/api/engines").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["default"], "stub");
    assert_eq!(body["available"], json!(["stub"]));
}

#[tokio::test]
async fn unknown_engine_is_not_available() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/graphs?engine=nonexistent")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "EngineNotAvailable");
}

#[tokio::test]
async fn get_graph_is_a_miss_then_a_hit() {
    let app = test_app();

    let first = app
        .clone()
        .oneshot(Request::builder().uri("/api/graphs/g1").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(first.headers().get("x-cache").unwrap(), "MISS");

    let second = app
        .oneshot(Request::builder().uri("/api/graphs/g1").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(second.headers().get("x-cache").unwrap(), "HIT");
}

#[tokio::test]
async fn missing_graph_is_not_found() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/graphs/missing")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_graph_returns_201_with_explicit_payload() {
    let app = test_app();
    let payload = json!({
        "title": "T",
        "description": "",
        "graph_type": "flowchart",
        "nodes": [{"id": "a", "label": "A", "type": "Process"}],
        "edges": []
    });
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/graphs")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["node_count"], 1);
}

#[tokio::test]
async fn impact_endpoint_echoes_camelcase_fields() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/graphs/g1/impact")
                .header("content-type", "application/json")
                .body(Body::from(json!({"nodeId": "a", "depth": 3}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["impactedNodes"][0]["nodeId"], "b");
}

#[tokio::test]
async fn raw_query_on_unsupported_engine_is_400() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/query")
                .header("content-type", "application/json")
                .body(Body::from(json!({"query": "SELECT 1"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "NotSupported");
}

#[tokio::test]
async fn delete_graph_invalidates_its_cached_entries() {
    let app = test_app();

    app.clone()
        .oneshot(Request::builder().uri("/api/graphs/g1").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let deleted = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/graphs/g1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let after = app
        .oneshot(Request::builder().uri("/api/graphs/g1").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(after.headers().get("x-cache").unwrap(), "MISS");
}
