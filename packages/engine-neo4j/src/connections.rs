//! Per-database connection cache. `neo4rs::Graph` already pools its own Bolt
//! connections internally; this layer only exists because a single
//! `Neo4jEngine` can be asked to operate against several logical databases
//! over its lifetime and a `Graph` is bound to one at construction time.
//! Mirrors this workspace's `RwLock<HashMap<..>>` registry pattern used for
//! tracking open per-client state.

use std::collections::HashMap;
use std::sync::Arc;

use graph_domain::{GraphError, Result};
use neo4rs::{ConfigBuilder, Graph};
use tokio::sync::RwLock;

use crate::error::map_driver_error;

pub struct ConnectionCache {
    uri: String,
    user: String,
    password: String,
    default_database: String,
    connections: RwLock<HashMap<String, Arc<Graph>>>,
}

impl ConnectionCache {
    pub fn new(uri: String, user: String, password: String, default_database: String) -> Self {
        Self {
            uri,
            user,
            password,
            default_database,
            connections: RwLock::new(HashMap::new()),
        }
    }

    pub fn default_database(&self) -> &str {
        &self.default_database
    }

    /// Resolve `requested` to a live connection, lazily opening and caching
    /// one Bolt session pool per distinct database name.
    pub async fn get(&self, requested: Option<&str>) -> Result<Arc<Graph>> {
        let database = requested.unwrap_or(&self.default_database).to_string();

        if let Some(graph) = self.connections.read().await.get(&database) {
            return Ok(graph.clone());
        }

        let mut guard = self.connections.write().await;
        if let Some(graph) = guard.get(&database) {
            return Ok(graph.clone());
        }

        let config = ConfigBuilder::default()
            .uri(&self.uri)
            .user(&self.user)
            .password(&self.password)
            .db(database.as_str())
            .build()
            .map_err(|e| GraphError::internal(map_driver_error(e)))?;

        let graph = Graph::connect(config)
            .await
            .map_err(map_driver_error)?;
        let graph = Arc::new(graph);
        guard.insert(database, graph.clone());
        Ok(graph)
    }
}
