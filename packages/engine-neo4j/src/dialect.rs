/// Which Cypher deployment a `Neo4jEngine` instance is talking to. Both
/// variants share every query string and the batching path (spec §4.D) —
/// the only behavior that differs is multi-database support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Neo4jDialect {
    /// A real Neo4j server reached over Bolt, with full multi-database
    /// support (`SHOW DATABASES`, per-database sessions).
    Native,
    /// An in-memory Cypher-speaking store used for tests and ephemeral
    /// sessions. Single database, named `"default"`.
    InMemory,
}

impl Neo4jDialect {
    pub fn supports_multi_database(self) -> bool {
        matches!(self, Neo4jDialect::Native)
    }

    pub fn engine_name(self) -> &'static str {
        match self {
            Neo4jDialect::Native => "neo4j",
            Neo4jDialect::InMemory => "neo4j-memory",
        }
    }
}
