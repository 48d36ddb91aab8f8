//! Cache keying (spec §4.G): `(engine, database, graph_id, operation,
//! parameters_hash)`. Two requests are cache-equivalent iff every one of
//! these fields matches exactly.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::Serialize;

/// Identifies one cacheable request shape. `parameters_hash` folds in
/// whatever request-specific parameters aren't already part of the key
/// (e.g. `node_id`/`hops` for a neighbors query) — not a security boundary,
/// just a cheap way to keep `Fingerprint` a fixed-size `Hash + Eq` key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    pub engine: String,
    pub database: Option<String>,
    pub graph_id: String,
    pub operation: &'static str,
    pub parameters_hash: u64,
}

impl Fingerprint {
    pub fn new(
        engine: impl Into<String>,
        database: Option<String>,
        graph_id: impl Into<String>,
        operation: &'static str,
        parameters_hash: u64,
    ) -> Self {
        Self {
            engine: engine.into(),
            database,
            graph_id: graph_id.into(),
            operation,
            parameters_hash,
        }
    }

    /// Does this entry belong to `(engine, database, graph_id)`? Used by
    /// `ResultCache::invalidate_graph` to bulk-evict every cached operation
    /// for a graph after a write, without maintaining a separate index.
    pub fn belongs_to(&self, engine: &str, database: Option<&str>, graph_id: &str) -> bool {
        self.engine == engine && self.database.as_deref() == database && self.graph_id == graph_id
    }
}

/// Hash arbitrary request parameters into the `parameters_hash` field. Not
/// collision-proof in an adversarial sense — only required to agree for
/// identical parameter values and disagree with overwhelming probability
/// otherwise.
pub fn hash_parameters<T: Serialize>(params: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    match serde_json::to_string(params) {
        Ok(s) => s.hash(&mut hasher),
        Err(_) => 0u8.hash(&mut hasher),
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identical_parameters_hash_identically() {
        let a = hash_parameters(&json!({"node_id": "n1", "hops": 2}));
        let b = hash_parameters(&json!({"node_id": "n1", "hops": 2}));
        assert_eq!(a, b);
    }

    #[test]
    fn different_parameters_hash_differently() {
        let a = hash_parameters(&json!({"node_id": "n1", "hops": 2}));
        let b = hash_parameters(&json!({"node_id": "n1", "hops": 3}));
        assert_ne!(a, b);
    }

    #[test]
    fn belongs_to_matches_on_engine_database_and_graph() {
        let fp = Fingerprint::new("neo4j", Some("prod".into()), "g1", "get_graph", 0);
        assert!(fp.belongs_to("neo4j", Some("prod"), "g1"));
        assert!(!fp.belongs_to("neo4j", Some("staging"), "g1"));
        assert!(!fp.belongs_to("postgres", Some("prod"), "g1"));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// `hash_parameters` is a pure function of the serialized value: any
        /// two calls with an identical `(node_id, hops)` pair must agree, no
        /// matter which values are chosen.
        #[test]
        fn identical_parameters_always_hash_identically(
            node_id in "[a-z]{1,10}",
            hops in 1u32..20,
        ) {
            let params = (node_id, hops);
            let a = hash_parameters(&params);
            let b = hash_parameters(&params);
            prop_assert_eq!(a, b);
        }

        /// Two fingerprints agree iff every one of their five fields agrees;
        /// changing only the graph id must never leave `belongs_to` true.
        #[test]
        fn belongs_to_is_false_when_graph_id_differs(
            engine in "[a-z]{1,8}",
            graph_a in "[a-z0-9]{1,8}",
            graph_b in "[a-z0-9]{1,8}",
        ) {
            prop_assume!(graph_a != graph_b);
            let fp = Fingerprint::new(engine.clone(), None, graph_a, "get_graph", 0);
            prop_assert!(!fp.belongs_to(&engine, None, &graph_b));
        }
    }
}
