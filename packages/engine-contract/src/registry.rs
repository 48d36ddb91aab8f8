//! Engine Registry / Router (spec §4.C).
//!
//! A process-wide immutable mapping from engine name to adapter instance,
//! built once at start-up. Unlike `rfdb`'s `DatabaseManager` (which this
//! module is grounded on), there is no runtime create/drop of entries here —
//! the set of available engines is fixed by configuration, never mutated
//! after `EngineRegistry::new` returns.

use std::collections::HashMap;
use std::sync::Arc;

use graph_domain::GraphError;

use crate::contract::{GraphEngine, Operation};

/// Immutable, process-wide map from engine name to adapter.
pub struct EngineRegistry {
    engines: HashMap<String, Arc<dyn GraphEngine>>,
    default_engine: String,
}

impl EngineRegistry {
    /// Build a registry from the adapters that initialized successfully.
    /// Returns an error if `default_engine` does not name one of `engines` —
    /// the start-up sequence must refuse to serve in that state rather than
    /// fail every request with `EngineNotAvailable` forever (spec §9).
    pub fn new(
        engines: Vec<Arc<dyn GraphEngine>>,
        default_engine: impl Into<String>,
    ) -> Result<Self, GraphError> {
        let default_engine = default_engine.into();
        let map: HashMap<String, Arc<dyn GraphEngine>> = engines
            .into_iter()
            .map(|e| (e.name().to_string(), e))
            .collect();

        if !map.contains_key(&default_engine) {
            return Err(GraphError::Invalid(format!(
                "configured default engine '{default_engine}' is not among the registered engines"
            )));
        }

        Ok(Self {
            engines: map,
            default_engine,
        })
    }

    /// Names of every registered engine, sorted for a stable `/api/engines`
    /// response.
    pub fn available(&self) -> Vec<String> {
        let mut names: Vec<String> = self.engines.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn default_engine(&self) -> &str {
        &self.default_engine
    }

    /// Resolve the requested engine name (or the configured default when
    /// `None`) to its adapter. Returns `EngineNotAvailable` when the name is
    /// not registered — adapters absent from configuration never appear
    /// here, per spec §6.
    pub fn resolve(&self, requested: Option<&str>) -> Result<Arc<dyn GraphEngine>, GraphError> {
        let name = requested.unwrap_or(&self.default_engine);
        self.engines
            .get(name)
            .cloned()
            .ok_or_else(|| GraphError::EngineNotAvailable(name.to_string()))
    }

    /// Resolve and additionally assert the adapter supports `operation`,
    /// returning `NotSupported` rather than calling into the adapter when it
    /// doesn't (spec §4.C point 4).
    pub fn resolve_for(
        &self,
        requested: Option<&str>,
        operation: Operation,
    ) -> Result<Arc<dyn GraphEngine>, GraphError> {
        let engine = self.resolve(requested)?;
        if !engine.supports(operation) {
            return Err(GraphError::NotSupported(format!(
                "{:?} is not supported on engine '{}'",
                operation,
                engine.name()
            )));
        }
        Ok(engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{CreateGraphParams, ImpactParams};
    use async_trait::async_trait;
    use graph_domain::{DatabaseInfo, GraphPayload, GraphStats, GraphSummary, ImpactResult, QueryResult};

    struct StubEngine {
        name: &'static str,
        supports_raw: bool,
    }

    #[async_trait]
    impl GraphEngine for StubEngine {
        fn name(&self) -> &str {
            self.name
        }

        fn supports(&self, operation: Operation) -> bool {
            match operation {
                Operation::ExecuteRawQuery => self.supports_raw,
                _ => true,
            }
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
        async fn compute_impact(&self, _: ImpactParams) -> graph_domain::Result<ImpactResult> {
            unimplemented!()
        }
        async fn execute_raw_query(&self, _: &str, _: Option<&str>) -> graph_domain::Result<QueryResult> {
            unimplemented!()
        }
    }

    fn registry() -> EngineRegistry {
        let neo4j = Arc::new(StubEngine {
            name: "neo4j",
            supports_raw: true,
        });
        let postgres = Arc::new(StubEngine {
            name: "postgres",
            supports_raw: true,
        });
        EngineRegistry::new(vec![neo4j, postgres], "neo4j").unwrap()
    }

    #[test]
    fn new_rejects_unknown_default() {
        let neo4j = Arc::new(StubEngine {
            name: "neo4j",
            supports_raw: true,
        });
        let result = EngineRegistry::new(vec![neo4j], "postgres");
        assert!(result.is_err());
    }

    #[test]
    fn resolve_none_uses_default() {
        let reg = registry();
        let engine = reg.resolve(None).unwrap();
        assert_eq!(engine.name(), "neo4j");
    }

    #[test]
    fn resolve_unknown_name_is_not_available() {
        let reg = registry();
        let err = reg.resolve(Some("sqlite")).unwrap_err();
        assert!(matches!(err, GraphError::EngineNotAvailable(_)));
    }

    #[test]
    fn available_is_sorted() {
        let reg = registry();
        assert_eq!(reg.available(), vec!["neo4j".to_string(), "postgres".to_string()]);
    }

    #[test]
    fn resolve_for_rejects_unsupported_operation() {
        let cypher_only = Arc::new(StubEngine {
            name: "neo4j",
            supports_raw: false,
        });
        let reg = EngineRegistry::new(vec![cypher_only], "neo4j").unwrap();
        let err = reg
            .resolve_for(None, Operation::ExecuteRawQuery)
            .unwrap_err();
        assert!(matches!(err, GraphError::NotSupported(_)));
    }
}
