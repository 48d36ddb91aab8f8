use async_trait::async_trait;
use chrono::Utc;
use engine_contract::contract::{validate_payload, CreateGraphParams, ImpactParams};
use engine_contract::GraphEngine;
use graph_domain::{
    DatabaseInfo, Edge, GraphError, GraphPayload, GraphStats, GraphSummary, ImpactResult,
    ImpactedNode, Node, QueryResult, Result,
};
use neo4rs::Query;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::connections::ConnectionCache;
use crate::dialect::Neo4jDialect;
use crate::error::map_driver_error;
use crate::queries;
use crate::rows::{edge_from_row, node_from_row, properties_to_json_text};

/// A Cypher/Bolt adapter. `dialect` toggles only `list_databases` and the
/// default-database name used when a request supplies none — every other
/// operation shares one code path.
pub struct Neo4jEngine {
    dialect: Neo4jDialect,
    connections: ConnectionCache,
}

impl Neo4jEngine {
    /// Administrative repair for invariant 3 (spec §3): recompute
    /// `node_count`/`edge_count` on the `Graph` node from a live count of
    /// its payload nodes and edges. Not part of the `GraphEngine` contract
    /// or the HTTP surface — spec §3 names this as a recoverable-bug
    /// operation, not a client-facing endpoint.
    pub async fn recompute_counts(
        &self,
        graph_id: &str,
        database: Option<&str>,
    ) -> Result<(u64, u64)> {
        let conn = self.connections.get(database).await?;
        let mut stream = conn
            .execute(
                Query::new(queries::RECOMPUTE_GRAPH_COUNTS.to_string()).param("graph_id", graph_id),
            )
            .await
            .map_err(map_driver_error)?;
        let Some(row) = stream.next().await.map_err(map_driver_error)? else {
            return Err(GraphError::NotFound(format!("graph '{graph_id}'")));
        };
        let node_count: i64 = row.get("node_count").map_err(map_driver_error)?;
        let edge_count: i64 = row.get("edge_count").map_err(map_driver_error)?;
        Ok((node_count as u64, edge_count as u64))
    }

    pub fn new(
        dialect: Neo4jDialect,
        uri: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        default_database: impl Into<String>,
    ) -> Self {
        Self {
            dialect,
            connections: ConnectionCache::new(
                uri.into(),
                user.into(),
                password.into(),
                default_database.into(),
            ),
        }
    }
}

#[async_trait]
impl GraphEngine for Neo4jEngine {
    fn name(&self) -> &str {
        self.dialect.engine_name()
    }

    async fn list_databases(&self) -> Result<Vec<DatabaseInfo>> {
        if !self.dialect.supports_multi_database() {
            return Ok(vec![DatabaseInfo {
                name: self.connections.default_database().to_string(),
                is_default: true,
                status: "online".to_string(),
            }]);
        }

        let graph = self.connections.get(None).await?;
        let mut stream = graph
            .execute(Query::new(queries::SHOW_DATABASES.to_string()))
            .await
            .map_err(map_driver_error)?;

        let mut out = Vec::new();
        while let Some(row) = stream.next().await.map_err(map_driver_error)? {
            out.push(DatabaseInfo {
                name: row.get("name").map_err(map_driver_error)?,
                is_default: row.get("default").map_err(map_driver_error)?,
                status: row.get("currentStatus").map_err(map_driver_error)?,
            });
        }
        Ok(out)
    }

    async fn list_graphs(&self, database: Option<&str>) -> Result<Vec<GraphSummary>> {
        let graph = self.connections.get(database).await?;
        let mut stream = graph
            .execute(Query::new(queries::LIST_GRAPH_SUMMARIES.to_string()))
            .await
            .map_err(map_driver_error)?;

        let mut out = Vec::new();
        while let Some(row) = stream.next().await.map_err(map_driver_error)? {
            out.push(graph_summary_from_row(&row)?);
        }
        Ok(out)
    }

    async fn get_graph(&self, graph_id: &str, database: Option<&str>) -> Result<GraphPayload> {
        let conn = self.connections.get(database).await?;

        let mut node_stream = conn
            .execute(Query::new(queries::MATCH_GRAPH_NODES.to_string()).param("graph_id", graph_id))
            .await
            .map_err(map_driver_error)?;
        let mut nodes = Vec::new();
        while let Some(row) = node_stream.next().await.map_err(map_driver_error)? {
            nodes.push(node_from_row(&row)?);
        }

        if nodes.is_empty() {
            return Err(GraphError::NotFound(format!("graph '{graph_id}'")));
        }

        let mut edge_stream = conn
            .execute(Query::new(queries::MATCH_GRAPH_EDGES.to_string()).param("graph_id", graph_id))
            .await
            .map_err(map_driver_error)?;
        let mut edges = Vec::new();
        while let Some(row) = edge_stream.next().await.map_err(map_driver_error)? {
            edges.push(edge_from_row(&row)?);
        }

        Ok(GraphPayload { nodes, edges })
    }

    async fn get_graph_stats(&self, graph_id: &str, database: Option<&str>) -> Result<GraphStats> {
        let conn = self.connections.get(database).await?;

        let summary_row = {
            let mut stream = conn
                .execute(
                    Query::new(queries::MATCH_GRAPH_SUMMARY.to_string()).param("graph_id", graph_id),
                )
                .await
                .map_err(map_driver_error)?;
            stream.next().await.map_err(map_driver_error)?
        };
        let Some(summary_row) = summary_row else {
            return Err(GraphError::NotFound(format!("graph '{graph_id}'")));
        };
        let node_count: i64 = summary_row.get("node_count").map_err(map_driver_error)?;
        let edge_count: i64 = summary_row.get("edge_count").map_err(map_driver_error)?;

        let mut node_type_histogram = BTreeMap::new();
        let mut type_stream = conn
            .execute(
                Query::new(queries::STATS_NODE_TYPE_HISTOGRAM.to_string())
                    .param("graph_id", graph_id),
            )
            .await
            .map_err(map_driver_error)?;
        while let Some(row) = type_stream.next().await.map_err(map_driver_error)? {
            let node_type: String = row.get("node_type").map_err(map_driver_error)?;
            let count: i64 = row.get("count").map_err(map_driver_error)?;
            node_type_histogram.insert(node_type, count as u64);
        }

        let mut edge_type_histogram = BTreeMap::new();
        let mut edge_stream = conn
            .execute(
                Query::new(queries::STATS_EDGE_TYPE_HISTOGRAM.to_string())
                    .param("graph_id", graph_id),
            )
            .await
            .map_err(map_driver_error)?;
        while let Some(row) = edge_stream.next().await.map_err(map_driver_error)? {
            let edge_type: String = row.get("edge_type").map_err(map_driver_error)?;
            let count: i64 = row.get("count").map_err(map_driver_error)?;
            edge_type_histogram.insert(edge_type, count as u64);
        }

        let average_degree = if node_count > 0 {
            (edge_count as f64) / (node_count as f64)
        } else {
            0.0
        };

        Ok(GraphStats {
            node_count: node_count as u64,
            edge_count: edge_count as u64,
            node_type_histogram,
            edge_type_histogram,
            average_degree,
        })
    }

    async fn create_graph(&self, params: CreateGraphParams) -> Result<GraphSummary> {
        let payload = params
            .request
            .explicit_payload()
            .ok_or_else(|| GraphError::Invalid("mermaid-code creation must go through engine-mermaid before reaching an engine adapter".into()))?;

        validate_payload(&payload.nodes, &payload.edges)?;
        let edges = engine_contract::contract::dedup_edges(payload.edges);

        let conn = self.connections.get(params.database.as_deref()).await?;
        let graph_id = Uuid::new_v4().to_string();
        let created_at = Utc::now();

        let summary = GraphSummary {
            id: graph_id.clone(),
            title: params.request.title,
            description: params.request.description,
            graph_type: params.request.graph_type,
            node_count: payload.nodes.len() as u64,
            edge_count: edges.len() as u64,
            created_at,
        };

        // All three writes (node batches, edge batches, the `Graph` record
        // itself) share a single transaction so a mid-write failure rolls
        // back instead of leaving `GraphNode`/`CONNECTED_TO` rows orphaned
        // with no matching `Graph` metadata node (spec §3 invariants 4/5).
        let mut txn = conn.start_txn().await.map_err(map_driver_error)?;

        write_node_batches(&mut txn, &graph_id, &payload.nodes).await?;
        write_edge_batches(&mut txn, &graph_id, &edges).await?;

        txn.run(
            Query::new(queries::CREATE_GRAPH_NODE.to_string())
                .param("id", summary.id.clone())
                .param("title", summary.title.clone())
                .param("description", summary.description.clone())
                .param("graph_type", summary.graph_type.clone())
                .param("node_count", summary.node_count as i64)
                .param("edge_count", summary.edge_count as i64)
                .param("created_at", summary.created_at.to_rfc3339()),
        )
        .await
        .map_err(map_driver_error)?;

        txn.commit().await.map_err(map_driver_error)?;

        Ok(summary)
    }

    async fn delete_graph(&self, graph_id: &str, database: Option<&str>) -> Result<()> {
        let conn = self.connections.get(database).await?;
        conn.run(Query::new(queries::DELETE_GRAPH_NODES.to_string()).param("graph_id", graph_id))
            .await
            .map_err(map_driver_error)?;
        conn.run(Query::new(queries::DELETE_GRAPH_RECORD.to_string()).param("graph_id", graph_id))
            .await
            .map_err(map_driver_error)?;
        Ok(())
    }

    async fn get_node_neighbors(
        &self,
        graph_id: &str,
        node_id: &str,
        hops: u32,
        database: Option<&str>,
    ) -> Result<GraphPayload> {
        let hops = hops.clamp(1, 20);
        let conn = self.connections.get(database).await?;

        let mut stream = conn
            .execute(
                Query::new(queries::neighbors_query(hops))
                    .param("graph_id", graph_id)
                    .param("node_id", node_id),
            )
            .await
            .map_err(map_driver_error)?;

        let mut nodes = Vec::new();
        while let Some(row) = stream.next().await.map_err(map_driver_error)? {
            nodes.push(node_from_row(&row)?);
        }

        let mut ids: Vec<String> = nodes.iter().map(|n| n.id.clone()).collect();
        ids.push(node_id.to_string());

        let mut edge_stream = conn
            .execute(
                Query::new(queries::MATCH_EDGES_AMONG_IDS.to_string())
                    .param("graph_id", graph_id)
                    .param("ids", ids),
            )
            .await
            .map_err(map_driver_error)?;
        let mut edges = Vec::new();
        while let Some(row) = edge_stream.next().await.map_err(map_driver_error)? {
            edges.push(edge_from_row(&row)?);
        }

        Ok(GraphPayload { nodes, edges })
    }

    async fn compute_impact(&self, params: ImpactParams) -> Result<ImpactResult> {
        let conn = self.connections.get(params.database.as_deref()).await?;

        let mut stream = conn
            .execute(
                Query::new(queries::impact_query(params.depth))
                    .param("graph_id", params.graph_id.clone())
                    .param("source_id", params.source_id.clone()),
            )
            .await
            .map_err(map_driver_error)?;

        let mut impacted_nodes = Vec::new();
        while let Some(row) = stream.next().await.map_err(map_driver_error)? {
            let node_id: String = row.get("node_id").map_err(map_driver_error)?;
            let level: i64 = row.get("level").map_err(map_driver_error)?;
            impacted_nodes.push(ImpactedNode {
                node_id,
                level: level as u32,
            });
        }

        Ok(ImpactResult {
            source_id: params.source_id,
            impacted_nodes,
            depth: params.depth,
            elapsed_ms: 0,
            engine: String::new(),
        })
    }

    async fn execute_raw_query(&self, query: &str, database: Option<&str>) -> Result<QueryResult> {
        if queries::looks_like_foreign_dialect(query) {
            return Err(GraphError::NotSupported(
                "this engine speaks Cypher, not SQL".to_string(),
            ));
        }

        let started = std::time::Instant::now();
        let conn = self.connections.get(database).await?;

        let mut stream = conn
            .execute(Query::new(query.to_string()))
            .await
            .map_err(map_driver_error)?;

        let mut columns: Option<Vec<String>> = None;
        let mut rows = Vec::new();
        while let Some(row) = stream.next().await.map_err(map_driver_error)? {
            if columns.is_none() {
                columns = Some(row.keys().iter().map(|s| s.to_string()).collect());
            }
            let values = columns
                .as_ref()
                .unwrap()
                .iter()
                .map(|col| bolt_column_to_json(&row, col))
                .collect();
            rows.push(values);
        }

        Ok(QueryResult {
            columns: columns.unwrap_or_default(),
            rows,
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }
}

/// Best-effort column decode for `ExecuteRawQuery` results: an arbitrary
/// Cypher projection can return any `BoltType`, not just strings, so this
/// decodes the raw Bolt value rather than coercing every column through
/// `String` (which silently nulled out counts, booleans, lists, and node
/// maps). Mirrors the relational adapter's `pg_value_to_json` fallback
/// posture: decode what's recognized, fall back to a textual form for the
/// handful of graph-shaped/spatial/temporal Bolt types this API boundary
/// has no flat JSON representation for.
fn bolt_column_to_json(row: &neo4rs::Row, col: &str) -> serde_json::Value {
    row.get::<neo4rs::BoltType>(col)
        .map(bolt_value_to_json)
        .unwrap_or(serde_json::Value::Null)
}

fn bolt_value_to_json(value: neo4rs::BoltType) -> serde_json::Value {
    use neo4rs::BoltType;

    match value {
        BoltType::Null(_) => serde_json::Value::Null,
        BoltType::Boolean(b) => serde_json::json!(b.value),
        BoltType::Integer(i) => serde_json::json!(i.value),
        BoltType::Float(f) => serde_json::json!(f.value),
        BoltType::String(s) => serde_json::json!(s.value),
        BoltType::List(list) => serde_json::Value::Array(
            list.value.into_iter().map(bolt_value_to_json).collect(),
        ),
        BoltType::Map(map) => serde_json::Value::Object(
            map.value
                .into_iter()
                .map(|(k, v)| (k.value, bolt_value_to_json(v)))
                .collect(),
        ),
        other => serde_json::Value::String(format!("{other:?}")),
    }
}

fn graph_summary_from_row(row: &neo4rs::Row) -> Result<GraphSummary> {
    let created_at_text: String = row.get("created_at").map_err(map_driver_error)?;
    let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_text)
        .map_err(|e| GraphError::internal(ChronoParse(e.to_string())))?
        .with_timezone(&Utc);
    let node_count: i64 = row.get("node_count").map_err(map_driver_error)?;
    let edge_count: i64 = row.get("edge_count").map_err(map_driver_error)?;

    Ok(GraphSummary {
        id: row.get("id").map_err(map_driver_error)?,
        title: row.get("title").map_err(map_driver_error)?,
        description: row.get("description").unwrap_or_default(),
        graph_type: row.get("graph_type").map_err(map_driver_error)?,
        node_count: node_count as u64,
        edge_count: edge_count as u64,
        created_at,
    })
}

async fn write_node_batches(txn: &mut neo4rs::Txn, graph_id: &str, nodes: &[Node]) -> Result<()> {
    for chunk in nodes.chunks(queries::NEO4J_BATCH_SIZE) {
        let ids: Vec<String> = chunk.iter().map(|n| n.id.clone()).collect();
        let labels: Vec<String> = chunk.iter().map(|n| n.label.clone()).collect();
        let types: Vec<String> = chunk.iter().map(|n| n.node_type.clone()).collect();
        let properties: Vec<String> = chunk
            .iter()
            .map(|n| properties_to_json_text(&n.properties))
            .collect();

        txn.run(
            Query::new(queries::UNWIND_CREATE_NODES.to_string())
                .param("graph_id", graph_id)
                .param("ids", ids)
                .param("labels", labels)
                .param("types", types)
                .param("properties", properties),
        )
        .await
        .map_err(map_driver_error)?;
    }
    Ok(())
}

async fn write_edge_batches(txn: &mut neo4rs::Txn, graph_id: &str, edges: &[Edge]) -> Result<()> {
    for chunk in edges.chunks(queries::NEO4J_BATCH_SIZE) {
        let source_ids: Vec<String> = chunk.iter().map(|e| e.source_id.clone()).collect();
        let target_ids: Vec<String> = chunk.iter().map(|e| e.target_id.clone()).collect();
        let edge_types: Vec<String> = chunk.iter().map(|e| e.edge_type.clone()).collect();
        let labels: Vec<String> = chunk
            .iter()
            .map(|e| e.label.clone().unwrap_or_default())
            .collect();
        let properties: Vec<String> = chunk
            .iter()
            .map(|e| properties_to_json_text(&e.properties))
            .collect();

        txn.run(
            Query::new(queries::UNWIND_CREATE_EDGES.to_string())
                .param("graph_id", graph_id)
                .param("source_ids", source_ids)
                .param("target_ids", target_ids)
                .param("edge_types", edge_types)
                .param("labels", labels)
                .param("properties", properties),
        )
        .await
        .map_err(map_driver_error)?;
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
#[error("could not parse stored timestamp: {0}")]
struct ChronoParse(String);
