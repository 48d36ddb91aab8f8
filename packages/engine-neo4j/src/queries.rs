//! Cypher query text (spec §4.D). Kept in one place so the batching and
//! impact-traversal shapes are easy to audit together.

/// Node/edge writes are chunked to this many rows per `UNWIND`, inside the
/// 500-2000 band spec §4.D allows.
pub const NEO4J_BATCH_SIZE: usize = 1000;

/// Leading keywords that only ever start a relational statement, never a
/// Cypher one. `execute_raw_query` uses this to reject a SQL body with
/// `NotSupported` before handing it to the Bolt driver, where it would
/// otherwise surface as an opaque syntax error.
const SQL_ONLY_LEADING_KEYWORDS: &[&str] = &[
    "SELECT", "INSERT", "UPDATE", "ALTER", "DROP", "TRUNCATE", "GRANT", "REVOKE",
];

/// True if `query`'s first keyword belongs to SQL rather than Cypher.
pub fn looks_like_foreign_dialect(query: &str) -> bool {
    let first_word = query
        .trim_start()
        .split(|c: char| c.is_whitespace() || c == '(')
        .find(|w| !w.is_empty())
        .unwrap_or("");
    SQL_ONLY_LEADING_KEYWORDS
        .iter()
        .any(|kw| first_word.eq_ignore_ascii_case(kw))
}

pub const CREATE_GRAPH_NODE: &str = "\
CREATE (g:Graph {
    id: $id, title: $title, description: $description, graph_type: $graph_type,
    node_count: $node_count, edge_count: $edge_count, created_at: $created_at
})";

/// Parallel-array batching: `neo4rs` parameter maps can't carry a
/// list-of-maps with heterogeneous typed fields as cleanly as a handful of
/// same-typed lists, so one batch is four aligned arrays indexed by `i`
/// rather than a list of row objects.
pub const UNWIND_CREATE_NODES: &str = "\
UNWIND range(0, size($ids) - 1) AS i
CREATE (n:GraphNode {
    graph_id: $graph_id, node_id: $ids[i], label: $labels[i],
    type: $types[i], properties: $properties[i]
})";

pub const UNWIND_CREATE_EDGES: &str = "\
UNWIND range(0, size($source_ids) - 1) AS i
MATCH (a:GraphNode {graph_id: $graph_id, node_id: $source_ids[i]})
MATCH (b:GraphNode {graph_id: $graph_id, node_id: $target_ids[i]})
CREATE (a)-[:CONNECTED_TO {type: $edge_types[i], label: $labels[i], properties: $properties[i]}]->(b)";

pub const MATCH_GRAPH_SUMMARY: &str = "\
MATCH (g:Graph {id: $graph_id})
RETURN g.id AS id, g.title AS title, g.description AS description,
       g.graph_type AS graph_type, g.node_count AS node_count,
       g.edge_count AS edge_count, g.created_at AS created_at";

pub const LIST_GRAPH_SUMMARIES: &str = "\
MATCH (g:Graph)
RETURN g.id AS id, g.title AS title, g.description AS description,
       g.graph_type AS graph_type, g.node_count AS node_count,
       g.edge_count AS edge_count, g.created_at AS created_at
ORDER BY g.created_at DESC";

pub const MATCH_GRAPH_NODES: &str = "\
MATCH (n:GraphNode {graph_id: $graph_id})
RETURN n.node_id AS node_id, n.label AS label, n.type AS node_type, n.properties AS properties";

pub const MATCH_GRAPH_EDGES: &str = "\
MATCH (a:GraphNode {graph_id: $graph_id})-[r:CONNECTED_TO]->(b:GraphNode {graph_id: $graph_id})
RETURN a.node_id AS source_id, b.node_id AS target_id,
       r.type AS edge_type, r.label AS label, r.properties AS properties";

pub const DELETE_GRAPH_NODES: &str = "MATCH (n:GraphNode {graph_id: $graph_id}) DETACH DELETE n";
pub const DELETE_GRAPH_RECORD: &str = "MATCH (g:Graph {id: $graph_id}) DETACH DELETE g";

pub const STATS_NODE_TYPE_HISTOGRAM: &str = "\
MATCH (n:GraphNode {graph_id: $graph_id})
RETURN n.type AS node_type, count(*) AS count";

pub const STATS_EDGE_TYPE_HISTOGRAM: &str = "\
MATCH (:GraphNode {graph_id: $graph_id})-[r:CONNECTED_TO]->(:GraphNode {graph_id: $graph_id})
RETURN r.type AS edge_type, count(*) AS count";

pub const SHOW_DATABASES: &str = "SHOW DATABASES YIELD name, default, currentStatus";

/// Administrative repair for invariant 3 (spec §3: "a divergence is a
/// recoverable bug and there exists an administrative operation to
/// recompute them"). Recomputes `node_count`/`edge_count` on the `Graph`
/// node from a live count of its `GraphNode`s and `CONNECTED_TO` edges.
pub const RECOMPUTE_GRAPH_COUNTS: &str = "\
MATCH (g:Graph {id: $graph_id})
OPTIONAL MATCH (n:GraphNode {graph_id: $graph_id})
WITH g, count(DISTINCT n) AS node_count
OPTIONAL MATCH (:GraphNode {graph_id: $graph_id})-[r:CONNECTED_TO]->(:GraphNode {graph_id: $graph_id})
WITH g, node_count, count(r) AS edge_count
SET g.node_count = node_count, g.edge_count = edge_count
RETURN node_count, edge_count";

/// `{depth}` is formatted directly into the query text after
/// `engine_contract::impact::run` has already validated it to `1..=20` —
/// never built from unvalidated user input, since Bolt parameters can't
/// interpolate into a variable-length-path range bound.
pub fn impact_query(depth: u32) -> String {
    format!(
        "MATCH (src:GraphNode {{graph_id: $graph_id, node_id: $source_id}})
MATCH p = (src)-[:CONNECTED_TO*1..{depth}]->(n:GraphNode {{graph_id: $graph_id}})
WITH n, min(length(p)) AS level
RETURN n.node_id AS node_id, level
ORDER BY level, node_id"
    )
}

/// Bounded neighbor expansion, same variable-length-path shape as
/// `impact_query` — neighbors are reported via outgoing `CONNECTED_TO`
/// edges reachable from `node_id` within `hops`.
pub fn neighbors_query(hops: u32) -> String {
    format!(
        "MATCH (src:GraphNode {{graph_id: $graph_id, node_id: $node_id}})
MATCH p = (src)-[:CONNECTED_TO*1..{hops}]->(n:GraphNode {{graph_id: $graph_id}})
WITH DISTINCT n
RETURN n.node_id AS node_id, n.label AS label, n.type AS node_type, n.properties AS properties"
    )
}

/// Edges among a fixed set of node ids (the neighborhood `get_node_neighbors`
/// just resolved, plus the source node itself) — so the returned
/// `GraphPayload` carries the edges connecting that neighborhood, not just
/// its nodes (spec §4.B).
pub const MATCH_EDGES_AMONG_IDS: &str = "\
MATCH (a:GraphNode {graph_id: $graph_id})-[r:CONNECTED_TO]->(b:GraphNode {graph_id: $graph_id})
WHERE a.node_id IN $ids AND b.node_id IN $ids
RETURN a.node_id AS source_id, b.node_id AS target_id,
       r.type AS edge_type, r.label AS label, r.properties AS properties";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impact_query_interpolates_a_validated_depth() {
        let q = impact_query(5);
        assert!(q.contains("*1..5]"));
        assert!(!q.contains("$depth"));
    }

    #[test]
    fn neighbors_query_interpolates_hops() {
        let q = neighbors_query(3);
        assert!(q.contains("*1..3]"));
    }

    #[test]
    fn recompute_counts_sets_both_fields_on_the_graph_node() {
        assert!(RECOMPUTE_GRAPH_COUNTS.contains("g.node_count = node_count"));
        assert!(RECOMPUTE_GRAPH_COUNTS.contains("g.edge_count = edge_count"));
    }
}
