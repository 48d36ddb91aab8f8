use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use engine_contract::contract::{validate_payload, CreateGraphParams, ImpactParams};
use engine_contract::GraphEngine;
use graph_domain::{
    DatabaseInfo, Edge, GraphError, GraphPayload, GraphStats, GraphSummary, ImpactResult,
    ImpactedNode, Node, QueryResult, Result,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Column, PgPool, Row};
use uuid::Uuid;

use crate::error::map_driver_error;
use crate::queries;
use crate::rows::{edge_from_row, node_from_row};

/// A single-namespace Postgres adapter (spec §4.E). Unlike the Cypher
/// adapter, there is exactly one pool and one logical "database" — the
/// connection string names it. A request naming a different `database`
/// value is rejected with `NotFound` rather than silently ignored.
pub struct RelationalEngine {
    pool: PgPool,
    database_name: String,
}

impl RelationalEngine {
    /// Connect and run pending migrations. `max_connections` sizes the pool
    /// to the expected request parallelism (spec §5); acquiring a
    /// connection beyond that surfaces as `StoreUnavailable` once
    /// `acquire_timeout` elapses.
    pub async fn connect(
        database_url: &str,
        database_name: impl Into<String>,
        max_connections: u32,
        acquire_timeout: std::time::Duration,
    ) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await
            .map_err(map_driver_error)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| GraphError::internal(MigrationFailed(e.to_string())))?;

        Ok(Self {
            pool,
            database_name: database_name.into(),
        })
    }

    fn check_database(&self, requested: Option<&str>) -> Result<()> {
        match requested {
            None => Ok(()),
            Some(name) if name == self.database_name => Ok(()),
            Some(other) => Err(GraphError::NotFound(format!("database '{other}'"))),
        }
    }

    /// Administrative repair for invariant 3 (spec §3): recompute
    /// `node_count`/`edge_count` on `graphs` from a live scan of
    /// `graph_nodes`/`graph_edges`, overwriting whatever was materialized at
    /// write time. Not part of the `GraphEngine` contract or the HTTP
    /// surface — spec §3 names this as a recoverable-bug operation, not a
    /// client-facing endpoint.
    pub async fn recompute_counts(&self, graph_id: &str) -> Result<(u64, u64)> {
        let row = sqlx::query(queries::RECOMPUTE_GRAPH_COUNTS)
            .bind(graph_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_driver_error)?;
        let Some(row) = row else {
            return Err(GraphError::NotFound(format!("graph '{graph_id}'")));
        };
        let node_count: i64 = row.try_get("node_count").map_err(map_driver_error)?;
        let edge_count: i64 = row.try_get("edge_count").map_err(map_driver_error)?;
        Ok((node_count as u64, edge_count as u64))
    }

    /// One hop of the frontier-loop BFS (spec §4.E/§9): expand `frontier` by
    /// one outgoing edge, excluding anything already in `visited`. Memory is
    /// bounded by the number of distinct reachable nodes, never by the
    /// number of walks through the graph.
    async fn frontier_step(
        &self,
        graph_id: &str,
        frontier: &[String],
        visited: &[String],
    ) -> Result<Vec<String>> {
        let rows = sqlx::query(queries::FRONTIER_STEP)
            .bind(graph_id)
            .bind(frontier)
            .bind(visited)
            .fetch_all(&self.pool)
            .await
            .map_err(map_driver_error)?;

        rows.into_iter()
            .map(|row| row.try_get::<String, _>("target_id").map_err(map_driver_error))
            .collect()
    }
}

#[async_trait]
impl GraphEngine for RelationalEngine {
    fn name(&self) -> &str {
        "postgres"
    }

    async fn list_databases(&self) -> Result<Vec<DatabaseInfo>> {
        Ok(vec![DatabaseInfo {
            name: self.database_name.clone(),
            is_default: true,
            status: "online".to_string(),
        }])
    }

    async fn list_graphs(&self, database: Option<&str>) -> Result<Vec<GraphSummary>> {
        self.check_database(database)?;
        let rows = sqlx::query(queries::LIST_GRAPH_SUMMARIES)
            .fetch_all(&self.pool)
            .await
            .map_err(map_driver_error)?;
        rows.iter().map(graph_summary_from_row).collect()
    }

    async fn get_graph(&self, graph_id: &str, database: Option<&str>) -> Result<GraphPayload> {
        self.check_database(database)?;

        let summary_row = sqlx::query(queries::SELECT_GRAPH_SUMMARY)
            .bind(graph_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_driver_error)?;
        if summary_row.is_none() {
            return Err(GraphError::NotFound(format!("graph '{graph_id}'")));
        }

        let node_rows = sqlx::query(queries::SELECT_GRAPH_NODES)
            .bind(graph_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_driver_error)?;
        let nodes = node_rows.iter().map(node_from_row).collect::<Result<Vec<_>>>()?;

        let edge_rows = sqlx::query(queries::SELECT_GRAPH_EDGES)
            .bind(graph_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_driver_error)?;
        let edges = edge_rows.iter().map(edge_from_row).collect::<Result<Vec<_>>>()?;

        Ok(GraphPayload { nodes, edges })
    }

    async fn get_graph_stats(&self, graph_id: &str, database: Option<&str>) -> Result<GraphStats> {
        self.check_database(database)?;

        let summary_row = sqlx::query(queries::SELECT_GRAPH_SUMMARY)
            .bind(graph_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_driver_error)?;
        let Some(summary_row) = summary_row else {
            return Err(GraphError::NotFound(format!("graph '{graph_id}'")));
        };
        let node_count: i64 = summary_row.try_get("node_count").map_err(map_driver_error)?;
        let edge_count: i64 = summary_row.try_get("edge_count").map_err(map_driver_error)?;

        let mut node_type_histogram = BTreeMap::new();
        let node_type_rows = sqlx::query(queries::NODE_TYPE_HISTOGRAM)
            .bind(graph_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_driver_error)?;
        for row in node_type_rows {
            let node_type: String = row.try_get("node_type").map_err(map_driver_error)?;
            let count: i64 = row.try_get("count").map_err(map_driver_error)?;
            node_type_histogram.insert(node_type, count as u64);
        }

        let mut edge_type_histogram = BTreeMap::new();
        let edge_type_rows = sqlx::query(queries::EDGE_TYPE_HISTOGRAM)
            .bind(graph_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_driver_error)?;
        for row in edge_type_rows {
            let edge_type: String = row.try_get("edge_type").map_err(map_driver_error)?;
            let count: i64 = row.try_get("count").map_err(map_driver_error)?;
            edge_type_histogram.insert(edge_type, count as u64);
        }

        let average_degree = if node_count > 0 {
            edge_count as f64 / node_count as f64
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
        self.check_database(params.database.as_deref())?;

        let payload = params.request.explicit_payload().ok_or_else(|| {
            GraphError::Invalid(
                "mermaid-code creation must go through engine-mermaid before reaching an engine adapter"
                    .into(),
            )
        })?;
        validate_payload(&payload.nodes, &payload.edges)?;
        let edges = engine_contract::contract::dedup_edges(payload.edges);

        let graph_id = Uuid::new_v4().to_string();
        let created_at = Utc::now();

        let mut tx = self.pool.begin().await.map_err(map_driver_error)?;

        sqlx::query(queries::INSERT_GRAPH)
            .bind(&graph_id)
            .bind(&params.request.title)
            .bind(&params.request.description)
            .bind(&params.request.graph_type)
            .bind(payload.nodes.len() as i64)
            .bind(edges.len() as i64)
            .bind(created_at)
            .execute(&mut *tx)
            .await
            .map_err(map_driver_error)?;

        for chunk in payload.nodes.chunks(queries::RELATIONAL_BATCH_SIZE) {
            insert_node_batch(&mut tx, &graph_id, chunk).await?;
        }
        for chunk in edges.chunks(queries::RELATIONAL_BATCH_SIZE) {
            insert_edge_batch(&mut tx, &graph_id, chunk).await?;
        }

        tx.commit().await.map_err(map_driver_error)?;

        Ok(GraphSummary {
            id: graph_id,
            title: params.request.title,
            description: params.request.description,
            graph_type: params.request.graph_type,
            node_count: payload.nodes.len() as u64,
            edge_count: edges.len() as u64,
            created_at,
        })
    }

    async fn delete_graph(&self, graph_id: &str, database: Option<&str>) -> Result<()> {
        self.check_database(database)?;
        let result = sqlx::query(queries::DELETE_GRAPH)
            .bind(graph_id)
            .execute(&self.pool)
            .await
            .map_err(map_driver_error)?;
        if result.rows_affected() == 0 {
            return Err(GraphError::NotFound(format!("graph '{graph_id}'")));
        }
        Ok(())
    }

    async fn get_node_neighbors(
        &self,
        graph_id: &str,
        node_id: &str,
        hops: u32,
        database: Option<&str>,
    ) -> Result<GraphPayload> {
        self.check_database(database)?;
        let hops = hops.clamp(1, 20);

        let exists = sqlx::query(queries::NODE_EXISTS)
            .bind(graph_id)
            .bind(node_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_driver_error)?;
        if exists.is_none() {
            return Err(GraphError::NotFound(format!("node '{node_id}'")));
        }

        let mut visited = vec![node_id.to_string()];
        let mut frontier = vec![node_id.to_string()];
        for _ in 0..hops {
            if frontier.is_empty() {
                break;
            }
            let next = self.frontier_step(graph_id, &frontier, &visited).await?;
            if next.is_empty() {
                break;
            }
            visited.extend(next.iter().cloned());
            frontier = next;
        }
        visited.retain(|id| id != node_id);

        if visited.is_empty() {
            return Ok(GraphPayload::default());
        }

        let rows = sqlx::query(
            "SELECT node_id, label, node_type, properties FROM graph_nodes \
             WHERE graph_id = $1 AND node_id = ANY($2)",
        )
        .bind(graph_id)
        .bind(&visited)
        .fetch_all(&self.pool)
        .await
        .map_err(map_driver_error)?;
        let nodes = rows.iter().map(node_from_row).collect::<Result<Vec<_>>>()?;

        let mut ids = visited;
        ids.push(node_id.to_string());
        let edge_rows = sqlx::query(queries::EDGES_AMONG_IDS)
            .bind(graph_id)
            .bind(&ids)
            .fetch_all(&self.pool)
            .await
            .map_err(map_driver_error)?;
        let edges = edge_rows.iter().map(edge_from_row).collect::<Result<Vec<_>>>()?;

        Ok(GraphPayload { nodes, edges })
    }

    async fn compute_impact(&self, params: ImpactParams) -> Result<ImpactResult> {
        self.check_database(params.database.as_deref())?;

        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(params.source_id.clone());
        let mut frontier = vec![params.source_id.clone()];
        let mut impacted_nodes = Vec::new();

        for level in 1..=params.depth {
            if frontier.is_empty() {
                break;
            }
            let visited_vec: Vec<String> = visited.iter().cloned().collect();
            let next = self
                .frontier_step(&params.graph_id, &frontier, &visited_vec)
                .await?;
            if next.is_empty() {
                break;
            }
            for node_id in &next {
                visited.insert(node_id.clone());
                impacted_nodes.push(ImpactedNode {
                    node_id: node_id.clone(),
                    level,
                });
            }
            frontier = next;
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
                "this engine speaks SQL, not Cypher".to_string(),
            ));
        }

        self.check_database(database)?;
        let started = std::time::Instant::now();

        let rows = sqlx::query(query)
            .fetch_all(&self.pool)
            .await
            .map_err(map_driver_error)?;

        let columns: Vec<String> = rows
            .first()
            .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();

        let values = rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .enumerate()
                    .map(|(i, _)| pg_value_to_json(row, i))
                    .collect()
            })
            .collect();

        Ok(QueryResult {
            columns,
            rows: values,
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }
}

fn graph_summary_from_row(row: &sqlx::postgres::PgRow) -> Result<GraphSummary> {
    let node_count: i64 = row.try_get("node_count").map_err(map_driver_error)?;
    let edge_count: i64 = row.try_get("edge_count").map_err(map_driver_error)?;
    Ok(GraphSummary {
        id: row.try_get("id").map_err(map_driver_error)?,
        title: row.try_get("title").map_err(map_driver_error)?,
        description: row.try_get("description").map_err(map_driver_error)?,
        graph_type: row.try_get("graph_type").map_err(map_driver_error)?,
        node_count: node_count as u64,
        edge_count: edge_count as u64,
        created_at: row.try_get("created_at").map_err(map_driver_error)?,
    })
}

async fn insert_node_batch(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    graph_id: &str,
    nodes: &[Node],
) -> Result<()> {
    let mut query = sqlx::QueryBuilder::new(
        "INSERT INTO graph_nodes (graph_id, node_id, label, node_type, properties) ",
    );
    query.push_values(nodes, |mut b, node| {
        b.push_bind(graph_id)
            .push_bind(&node.id)
            .push_bind(&node.label)
            .push_bind(&node.node_type)
            .push_bind(&node.properties);
    });
    query
        .build()
        .execute(&mut **tx)
        .await
        .map_err(map_driver_error)?;
    Ok(())
}

async fn insert_edge_batch(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    graph_id: &str,
    edges: &[Edge],
) -> Result<()> {
    let mut query = sqlx::QueryBuilder::new(
        "INSERT INTO graph_edges (graph_id, source_id, target_id, edge_type, label, properties) ",
    );
    query.push_values(edges, |mut b, edge| {
        b.push_bind(graph_id)
            .push_bind(&edge.source_id)
            .push_bind(&edge.target_id)
            .push_bind(&edge.edge_type)
            .push_bind(&edge.label)
            .push_bind(&edge.properties);
    });
    query
        .build()
        .execute(&mut **tx)
        .await
        .map_err(map_driver_error)?;
    Ok(())
}

/// Best-effort column decode for `ExecuteRawQuery` results: raw SQL can
/// return any shape, so values are decoded by best-guess type and fall back
/// to their textual form rather than failing the whole query.
fn pg_value_to_json(row: &sqlx::postgres::PgRow, idx: usize) -> serde_json::Value {
    use sqlx::ValueRef;

    let Ok(raw) = row.try_get_raw(idx) else {
        return serde_json::Value::Null;
    };
    if raw.is_null() {
        return serde_json::Value::Null;
    }
    if let Ok(v) = row.try_get::<serde_json::Value, _>(idx) {
        return v;
    }
    if let Ok(v) = row.try_get::<i64, _>(idx) {
        return serde_json::json!(v);
    }
    if let Ok(v) = row.try_get::<f64, _>(idx) {
        return serde_json::json!(v);
    }
    if let Ok(v) = row.try_get::<bool, _>(idx) {
        return serde_json::json!(v);
    }
    if let Ok(v) = row.try_get::<String, _>(idx) {
        return serde_json::json!(v);
    }
    serde_json::Value::Null
}

#[derive(Debug, thiserror::Error)]
#[error("relational adapter migration failed: {0}")]
struct MigrationFailed(String);

#[cfg(test)]
mod tests {
    use super::*;

    /// Reference BFS over an in-memory adjacency map, used by the
    /// integration test in `tests/frontier_bfs.rs` to cross-check the SQL
    /// frontier loop's output at several depths — guards against the
    /// naive-recursive-CTE regression called out in spec §9.
    #[allow(dead_code)]
    pub(crate) fn reference_bfs(
        adjacency: &std::collections::HashMap<&str, Vec<&str>>,
        source: &str,
        depth: u32,
    ) -> Vec<(String, u32)> {
        let mut visited = std::collections::HashSet::new();
        visited.insert(source.to_string());
        let mut frontier = vec![source.to_string()];
        let mut out = Vec::new();

        for level in 1..=depth {
            let mut next = Vec::new();
            for node in &frontier {
                for neighbor in adjacency.get(node.as_str()).into_iter().flatten() {
                    if visited.insert(neighbor.to_string()) {
                        next.push(neighbor.to_string());
                        out.push((neighbor.to_string(), level));
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }
        out.sort();
        out
    }

    #[test]
    fn reference_bfs_respects_depth_and_shortest_path() {
        let mut adjacency = std::collections::HashMap::new();
        adjacency.insert("a", vec!["b", "c"]);
        adjacency.insert("b", vec!["d"]);
        adjacency.insert("c", vec!["d"]);
        adjacency.insert("d", vec!["a"]); // cycle back to source

        let result = reference_bfs(&adjacency, "a", 2);
        let ids: Vec<&str> = result.iter().map(|(id, _)| id.as_str()).collect();
        assert!(ids.contains(&"b"));
        assert!(ids.contains(&"c"));
        assert!(ids.contains(&"d"));
        assert!(!ids.contains(&"a"));

        let d_level = result.iter().find(|(id, _)| id == "d").unwrap().1;
        assert_eq!(d_level, 2);
    }
}
