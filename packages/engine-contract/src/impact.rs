//! Cross-cutting impact-analysis orchestration (spec §4.H).
//!
//! This is the only caller of `GraphEngine::compute_impact`: it validates
//! the requested depth, times the call on a monotonic clock, and performs
//! the final ordering/dedup pass so a buggy adapter can't leak duplicates or
//! an out-of-range level to the client.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use graph_domain::{GraphError, ImpactResult, Result};

use crate::contract::{GraphEngine, ImpactParams};

pub const MIN_DEPTH: u32 = 1;
pub const MAX_DEPTH: u32 = 20;

/// Validate and execute an impact query against `engine`.
pub async fn run(
    engine: &Arc<dyn GraphEngine>,
    database: Option<String>,
    graph_id: &str,
    source_id: &str,
    depth: i64,
) -> Result<ImpactResult> {
    if depth < MIN_DEPTH as i64 || depth > MAX_DEPTH as i64 {
        return Err(GraphError::DepthLimitExceeded(depth));
    }
    let depth = depth as u32;

    let started = Instant::now();
    let mut result = engine
        .compute_impact(ImpactParams {
            database,
            graph_id: graph_id.to_string(),
            source_id: source_id.to_string(),
            depth,
        })
        .await?;

    // Defensive re-sort/dedup/filter: an adapter's own traversal owns the
    // algorithm, but the client-visible contract (sorted, deduped, no
    // out-of-range level, source excluded) is enforced here regardless of
    // which adapter produced the result.
    let mut seen = HashSet::with_capacity(result.impacted_nodes.len());
    result.impacted_nodes.retain(|n| {
        n.node_id != result.source_id
            && n.level >= 1
            && n.level <= depth
            && seen.insert(n.node_id.clone())
    });
    // `(level, node_id)` explicitly — not `ImpactedNode`'s derived field
    // order, which is `(node_id, level)` and would silently violate spec
    // §4.H.3/§8's required ordering.
    result
        .impacted_nodes
        .sort_by(|a, b| a.level.cmp(&b.level).then_with(|| a.node_id.cmp(&b.node_id)));
    result.depth = depth;
    result.elapsed_ms = started.elapsed().as_millis() as u64;
    result.engine = engine.name().to_string();

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{CreateGraphParams, Operation};
    use async_trait::async_trait;
    use graph_domain::{
        DatabaseInfo, GraphPayload, GraphStats, GraphSummary, ImpactedNode, QueryResult,
    };

    struct FakeEngine;

    #[async_trait]
    impl GraphEngine for FakeEngine {
        fn name(&self) -> &str {
            "fake"
        }
        fn supports(&self, _: Operation) -> bool {
            true
        }
        async fn list_databases(&self) -> graph_domain::Result<Vec<DatabaseInfo>> {
            Ok(vec![])
        }
        async fn list_graphs(&self, _: Option<&str>) -> graph_domain::Result<Vec<GraphSummary>> {
            Ok(vec![])
        }
        async fn get_graph(&self, _: &str, _: Option<&str>) -> graph_domain::Result<GraphPayload> {
            unimplemented!()
        }
        async fn get_graph_stats(&self, _: &str, _: Option<&str>) -> graph_domain::Result<GraphStats> {
            unimplemented!()
        }
        async fn create_graph(&self, _: CreateGraphParams) -> graph_domain::Result<GraphSummary> {
            unimplemented!()
        }
        async fn delete_graph(&self, _: &str, _: Option<&str>) -> graph_domain::Result<()> {
            Ok(())
        }
        async fn get_node_neighbors(
            &self,
            _: &str,
            _: &str,
            _: u32,
            _: Option<&str>,
        ) -> graph_domain::Result<GraphPayload> {
            unimplemented!()
        }
        async fn compute_impact(
            &self,
            params: crate::contract::ImpactParams,
        ) -> graph_domain::Result<ImpactResult> {
            // Deliberately returns duplicates and an out-of-range level to
            // exercise the defensive post-processing pass.
            Ok(ImpactResult {
                source_id: params.source_id,
                impacted_nodes: vec![
                    ImpactedNode { node_id: "b".into(), level: 2 },
                    ImpactedNode { node_id: "a".into(), level: 1 },
                    ImpactedNode { node_id: "a".into(), level: 1 },
                    ImpactedNode { node_id: "z".into(), level: 99 },
                ],
                depth: 0,
                elapsed_ms: 0,
                engine: String::new(),
            })
        }
        async fn execute_raw_query(&self, _: &str, _: Option<&str>) -> graph_domain::Result<QueryResult> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn rejects_depth_zero() {
        let engine: Arc<dyn GraphEngine> = Arc::new(FakeEngine);
        let err = run(&engine, None, "g1", "s1", 0).await.unwrap_err();
        assert!(matches!(err, GraphError::DepthLimitExceeded(0)));
    }

    #[tokio::test]
    async fn rejects_depth_above_twenty() {
        let engine: Arc<dyn GraphEngine> = Arc::new(FakeEngine);
        let err = run(&engine, None, "g1", "s1", 21).await.unwrap_err();
        assert!(matches!(err, GraphError::DepthLimitExceeded(21)));
    }

    #[tokio::test]
    async fn dedups_sorts_and_drops_out_of_range_levels() {
        let engine: Arc<dyn GraphEngine> = Arc::new(FakeEngine);
        let result = run(&engine, None, "g1", "s1", 5).await.unwrap();

        assert_eq!(result.impacted_nodes.len(), 2);
        assert_eq!(result.impacted_nodes[0].node_id, "a");
        assert_eq!(result.impacted_nodes[1].node_id, "b");
        assert_eq!(result.depth, 5);
        assert_eq!(result.engine, "fake");
    }

    /// An adapter whose node ids sort the opposite way to their levels —
    /// `"z"` is the nearer node, `"a"` the farther one. Catches a regression
    /// where the final sort orders by `(node_id, level)` instead of the
    /// required `(level, node_id)` (spec §4.H.3/§8), which the single/
    /// already-aligned-order fixtures above can't catch.
    struct ReversedIdOrderEngine;

    #[async_trait]
    impl GraphEngine for ReversedIdOrderEngine {
        fn name(&self) -> &str {
            "reversed"
        }
        fn supports(&self, _: Operation) -> bool {
            true
        }
        async fn list_databases(&self) -> graph_domain::Result<Vec<DatabaseInfo>> {
            Ok(vec![])
        }
        async fn list_graphs(&self, _: Option<&str>) -> graph_domain::Result<Vec<GraphSummary>> {
            Ok(vec![])
        }
        async fn get_graph(&self, _: &str, _: Option<&str>) -> graph_domain::Result<GraphPayload> {
            unimplemented!()
        }
        async fn get_graph_stats(&self, _: &str, _: Option<&str>) -> graph_domain::Result<GraphStats> {
            unimplemented!()
        }
        async fn create_graph(&self, _: CreateGraphParams) -> graph_domain::Result<GraphSummary> {
            unimplemented!()
        }
        async fn delete_graph(&self, _: &str, _: Option<&str>) -> graph_domain::Result<()> {
            Ok(())
        }
        async fn get_node_neighbors(
            &self,
            _: &str,
            _: &str,
            _: u32,
            _: Option<&str>,
        ) -> graph_domain::Result<GraphPayload> {
            unimplemented!()
        }
        async fn compute_impact(
            &self,
            params: crate::contract::ImpactParams,
        ) -> graph_domain::Result<ImpactResult> {
            Ok(ImpactResult {
                source_id: params.source_id,
                impacted_nodes: vec![
                    ImpactedNode { node_id: "a".into(), level: 2 },
                    ImpactedNode { node_id: "z".into(), level: 1 },
                ],
                depth: 0,
                elapsed_ms: 0,
                engine: String::new(),
            })
        }
        async fn execute_raw_query(&self, _: &str, _: Option<&str>) -> graph_domain::Result<QueryResult> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn sorts_by_level_first_even_when_node_ids_disagree() {
        let engine: Arc<dyn GraphEngine> = Arc::new(ReversedIdOrderEngine);
        let result = run(&engine, None, "g1", "s1", 5).await.unwrap();

        assert_eq!(result.impacted_nodes[0].node_id, "z");
        assert_eq!(result.impacted_nodes[0].level, 1);
        assert_eq!(result.impacted_nodes[1].node_id, "a");
        assert_eq!(result.impacted_nodes[1].level, 2);
    }
}
