//! Transport-friendly graph data shapes shared by every adapter and the HTTP
//! layer. Property bags are always structured JSON at this boundary — an
//! adapter that stores them as an opaque string (the relational adapter) is
//! responsible for the JSON <-> TEXT conversion at its own edge.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

fn empty_properties() -> Json {
    Json::Object(serde_json::Map::new())
}

/// A single graph node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    pub id: String,
    pub label: String,
    #[serde(default, rename = "type")]
    pub node_type: String,
    #[serde(default = "empty_properties")]
    pub properties: Json,
}

/// A directed edge. Parallel edges sharing `(source_id, target_id)` are
/// forbidden within one graph — the write path deduplicates silently.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Edge {
    pub source_id: String,
    pub target_id: String,
    #[serde(rename = "type")]
    pub edge_type: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default = "empty_properties")]
    pub properties: Json,
}

/// The full, materialized content of one graph.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct GraphPayload {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// Graph metadata row. Counts are materialized at write time (spec invariant
/// 3) — never computed by a live scan on the read path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphSummary {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub graph_type: String,
    pub node_count: u64,
    pub edge_count: u64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Per-type histogram plus average degree, returned by `GetGraphStats`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphStats {
    pub node_count: u64,
    pub edge_count: u64,
    pub node_type_histogram: std::collections::BTreeMap<String, u64>,
    pub edge_type_histogram: std::collections::BTreeMap<String, u64>,
    pub average_degree: f64,
}

/// One `(database, default?, status)` row from `ListDatabases`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseInfo {
    pub name: String,
    pub is_default: bool,
    pub status: String,
}

/// A single hop-tagged reachable node. Deliberately has no derived `Ord`:
/// the client-visible ordering is `(level, node_id)`, not this struct's
/// field order, and is applied explicitly by `engine_contract::impact::run`
/// rather than relied on implicitly via `sort()`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImpactedNode {
    #[serde(rename = "nodeId")]
    pub node_id: String,
    pub level: u32,
}

/// Result of a bounded forward-reachability query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImpactResult {
    pub source_id: String,
    #[serde(rename = "impactedNodes")]
    pub impacted_nodes: Vec<ImpactedNode>,
    pub depth: u32,
    pub elapsed_ms: u64,
    pub engine: String,
}

/// A single row from `ExecuteRawQuery`, tabular and dialect-agnostic at this
/// boundary — column order is preserved from the back-end's own response.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Json>>,
    pub elapsed_ms: u64,
}

/// Input for `CreateGraph`: either Mermaid text or an explicit payload, never
/// both (the Mermaid parser is bypassed entirely when `nodes`/`edges` are
/// supplied — spec §4.F).
#[derive(Debug, Clone, Deserialize)]
pub struct CreateGraphRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub graph_type: String,
    #[serde(default)]
    pub mermaid_code: Option<String>,
    #[serde(default)]
    pub nodes: Option<Vec<Node>>,
    #[serde(default)]
    pub edges: Option<Vec<Edge>>,
}

impl CreateGraphRequest {
    /// Resolve the request into a concrete `GraphPayload`, bypassing the
    /// Mermaid parser when an explicit payload was supplied.
    pub fn explicit_payload(&self) -> Option<GraphPayload> {
        match (&self.nodes, &self.edges) {
            (Some(nodes), Some(edges)) => Some(GraphPayload {
                nodes: nodes.clone(),
                edges: edges.clone(),
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_properties_default_to_empty_object() {
        let json = r#"{"id":"n1","label":"A","type":"Process"}"#;
        let node: Node = serde_json::from_str(json).unwrap();
        assert_eq!(node.properties, Json::Object(Default::default()));
    }

    #[test]
    fn explicit_payload_requires_both_nodes_and_edges() {
        let req = CreateGraphRequest {
            title: "t".into(),
            description: String::new(),
            graph_type: "flowchart".into(),
            mermaid_code: None,
            nodes: Some(vec![]),
            edges: None,
        };
        assert!(req.explicit_payload().is_none());
    }
}
