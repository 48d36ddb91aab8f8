//! The capability set every storage back-end implements (spec §4.B).
//!
//! Every operation is request-scoped, may suspend on I/O, and must be safe
//! to call concurrently for distinct inputs — adapters hold no per-request
//! state outside what's passed in, and no adapter may hold a connection
//! across a boundary visible to the caller of these methods.

use async_trait::async_trait;
use graph_domain::{
    CreateGraphRequest, DatabaseInfo, Edge, GraphPayload, GraphStats, GraphSummary, ImpactResult,
    Node, QueryResult, Result,
};

/// Request to create a graph. `database` is the engine-local namespace the
/// graph should live in; `None` means "the engine's own default".
#[derive(Debug, Clone)]
pub struct CreateGraphParams {
    pub database: Option<String>,
    pub request: CreateGraphRequest,
}

/// Request to compute bounded forward reachability from one seed node.
#[derive(Debug, Clone)]
pub struct ImpactParams {
    pub database: Option<String>,
    pub graph_id: String,
    pub source_id: String,
    /// Already validated to `1..=20` by `crate::impact::run` before the
    /// adapter ever sees it.
    pub depth: u32,
}

/// The engine contract. Implementations are shared behind `Arc<dyn
/// GraphEngine>` across request tasks — no external locking is required by
/// callers, every method takes `&self`.
#[async_trait]
pub trait GraphEngine: Send + Sync {
    /// Dialect-neutral name this adapter is registered under (e.g.
    /// `"neo4j"`, `"memgraph"`, `"postgres"`). Never leaked into query text;
    /// only used for the `X-Engine` response tag and cache fingerprints.
    fn name(&self) -> &str;

    /// Whether this adapter supports a given contract operation. Used by the
    /// router to reject e.g. raw SQL against a Cypher store with
    /// `NotSupported` before ever calling the adapter.
    fn supports(&self, operation: Operation) -> bool {
        let _ = operation;
        true
    }

    async fn list_databases(&self) -> Result<Vec<DatabaseInfo>>;

    async fn list_graphs(&self, database: Option<&str>) -> Result<Vec<GraphSummary>>;

    async fn get_graph(&self, graph_id: &str, database: Option<&str>) -> Result<GraphPayload>;

    async fn get_graph_stats(&self, graph_id: &str, database: Option<&str>) -> Result<GraphStats>;

    async fn create_graph(&self, params: CreateGraphParams) -> Result<GraphSummary>;

    async fn delete_graph(&self, graph_id: &str, database: Option<&str>) -> Result<()>;

    async fn get_node_neighbors(
        &self,
        graph_id: &str,
        node_id: &str,
        hops: u32,
        database: Option<&str>,
    ) -> Result<GraphPayload>;

    /// Bounded forward-BFS traversal. `params.depth` is pre-validated; the
    /// adapter still owns sorting/dedup of its own output, but the final
    /// authoritative pass happens in `crate::impact::run`.
    async fn compute_impact(&self, params: ImpactParams) -> Result<ImpactResult>;

    async fn execute_raw_query(&self, query: &str, database: Option<&str>) -> Result<QueryResult>;
}

/// Enumerates the contract operations for `GraphEngine::supports`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListDatabases,
    ListGraphs,
    GetGraph,
    GetGraphStats,
    CreateGraph,
    DeleteGraph,
    GetNodeNeighbors,
    ComputeImpact,
    ExecuteRawQuery,
}

/// Helper used by adapters to build a `GraphPayload` from raw node/edge
/// collections while enforcing invariant 1 (every edge endpoint belongs to
/// the same graph) and invariant 2 (no duplicate ids / parallel edges).
pub fn validate_payload(nodes: &[Node], edges: &[Edge]) -> Result<()> {
    use std::collections::HashSet;
    use graph_domain::GraphError;

    let mut seen_ids = HashSet::with_capacity(nodes.len());
    for node in nodes {
        if !seen_ids.insert(node.id.as_str()) {
            return Err(GraphError::Invalid(format!(
                "duplicate node id '{}'",
                node.id
            )));
        }
    }

    let mut seen_edges = HashSet::with_capacity(edges.len());
    for edge in edges {
        if !seen_ids.contains(edge.source_id.as_str()) {
            return Err(GraphError::Invalid(format!(
                "edge references unknown source node '{}'",
                edge.source_id
            )));
        }
        if !seen_ids.contains(edge.target_id.as_str()) {
            return Err(GraphError::Invalid(format!(
                "edge references unknown target node '{}'",
                edge.target_id
            )));
        }
        seen_edges.insert((edge.source_id.as_str(), edge.target_id.as_str()));
    }

    Ok(())
}

/// Deduplicate parallel edges sharing `(source_id, target_id)`, keeping the
/// first occurrence — the write path "deduplicates silently" per spec §3.
pub fn dedup_edges(edges: Vec<Edge>) -> Vec<Edge> {
    use std::collections::HashSet;

    let mut seen = HashSet::with_capacity(edges.len());
    edges
        .into_iter()
        .filter(|e| seen.insert((e.source_id.clone(), e.target_id.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(id: &str) -> Node {
        Node {
            id: id.to_string(),
            label: id.to_string(),
            node_type: "Process".to_string(),
            properties: json!({}),
        }
    }

    fn edge(src: &str, dst: &str) -> Edge {
        Edge {
            source_id: src.to_string(),
            target_id: dst.to_string(),
            edge_type: "CONNECTED_TO".to_string(),
            label: None,
            properties: json!({}),
        }
    }

    #[test]
    fn validate_payload_rejects_dangling_edge() {
        let nodes = vec![node("a")];
        let edges = vec![edge("a", "b")];
        assert!(validate_payload(&nodes, &edges).is_err());
    }

    #[test]
    fn validate_payload_rejects_duplicate_node_ids() {
        let nodes = vec![node("a"), node("a")];
        assert!(validate_payload(&nodes, &[]).is_err());
    }

    #[test]
    fn dedup_edges_keeps_first_of_parallel_pair() {
        let edges = vec![edge("a", "b"), edge("a", "b"), edge("b", "c")];
        let deduped = dedup_edges(edges);
        assert_eq!(deduped.len(), 2);
    }
}
