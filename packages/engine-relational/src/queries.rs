//! SQL text for the three-table layout (spec §4.E). Kept alongside the
//! batch-size constant so the write path's batching shape is easy to audit
//! in one place, mirroring `engine-neo4j::queries`.

/// Parameter-count ceiling per batched insert: 5 columns/node or 6
/// columns/edge, so this keeps every statement comfortably under Postgres's
/// own bind-parameter limit while staying in the spec's "<=2000 parameters
/// per batch" band.
pub const RELATIONAL_BATCH_SIZE: usize = 300;

/// Leading keywords that only ever start a Cypher statement, never a SQL
/// one. Mirrors `engine_neo4j::queries::looks_like_foreign_dialect` so a
/// Cypher body sent to this adapter is rejected with `NotSupported` instead
/// of reaching the driver as a confusing parse error.
const CYPHER_ONLY_LEADING_KEYWORDS: &[&str] = &["MATCH", "MERGE", "UNWIND", "CALL"];

/// True if `query`'s first keyword belongs to Cypher rather than SQL.
pub fn looks_like_foreign_dialect(query: &str) -> bool {
    let first_word = query
        .trim_start()
        .split(|c: char| c.is_whitespace() || c == '(')
        .find(|w| !w.is_empty())
        .unwrap_or("");
    CYPHER_ONLY_LEADING_KEYWORDS
        .iter()
        .any(|kw| first_word.eq_ignore_ascii_case(kw))
}

pub const INSERT_GRAPH: &str = "\
INSERT INTO graphs (id, title, description, graph_type, node_count, edge_count, created_at)
VALUES ($1, $2, $3, $4, $5, $6, $7)";

pub const SELECT_GRAPH_SUMMARY: &str = "\
SELECT id, title, description, graph_type, node_count, edge_count, created_at
FROM graphs WHERE id = $1";

pub const LIST_GRAPH_SUMMARIES: &str = "\
SELECT id, title, description, graph_type, node_count, edge_count, created_at
FROM graphs ORDER BY created_at DESC";

pub const SELECT_GRAPH_NODES: &str = "\
SELECT node_id, label, node_type, properties FROM graph_nodes WHERE graph_id = $1";

pub const SELECT_GRAPH_EDGES: &str = "\
SELECT source_id, target_id, edge_type, label, properties
FROM graph_edges WHERE graph_id = $1";

pub const DELETE_GRAPH: &str = "DELETE FROM graphs WHERE id = $1";

pub const NODE_TYPE_HISTOGRAM: &str = "\
SELECT node_type, count(*) AS count FROM graph_nodes WHERE graph_id = $1 GROUP BY node_type";

pub const EDGE_TYPE_HISTOGRAM: &str = "\
SELECT edge_type, count(*) AS count FROM graph_edges WHERE graph_id = $1 GROUP BY edge_type";

/// One hop of the frontier-loop BFS (spec §4.E, §9): given the current
/// frontier and the full visited set so far, returns every node reachable
/// by one outgoing edge from the frontier that hasn't been visited yet.
/// Deliberately NOT a recursive CTE — called once per hop from Rust so
/// memory is bounded by `|reachable nodes|`, never by the number of walks.
pub const FRONTIER_STEP: &str = "\
SELECT DISTINCT target_id
FROM graph_edges
WHERE graph_id = $1
  AND source_id = ANY($2)
  AND NOT (target_id = ANY($3))";

pub const NODE_EXISTS: &str = "\
SELECT 1 FROM graph_nodes WHERE graph_id = $1 AND node_id = $2";

/// Administrative repair for invariant 3 (spec §3: "a divergence is a
/// recoverable bug and there exists an administrative operation to
/// recompute them"). Recomputes `node_count`/`edge_count` from a live scan
/// rather than trusting the materialized columns, and returns the
/// corrected row.
pub const RECOMPUTE_GRAPH_COUNTS: &str = "\
UPDATE graphs SET
    node_count = (SELECT count(*) FROM graph_nodes WHERE graph_id = $1),
    edge_count = (SELECT count(*) FROM graph_edges WHERE graph_id = $1)
WHERE id = $1
RETURNING node_count, edge_count";

/// Edges among a fixed set of node ids (the neighborhood `get_node_neighbors`
/// just resolved, plus the source node itself) — so the returned
/// `GraphPayload` carries the edges connecting that neighborhood, not just
/// its nodes (spec §4.B).
pub const EDGES_AMONG_IDS: &str = "\
SELECT source_id, target_id, edge_type, label, properties
FROM graph_edges
WHERE graph_id = $1 AND source_id = ANY($2) AND target_id = ANY($2)";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recompute_counts_scans_both_tables_for_the_same_graph() {
        assert!(RECOMPUTE_GRAPH_COUNTS.contains("FROM graph_nodes WHERE graph_id = $1"));
        assert!(RECOMPUTE_GRAPH_COUNTS.contains("FROM graph_edges WHERE graph_id = $1"));
    }
}
