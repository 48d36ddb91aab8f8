//! Layered configuration (spec §6): environment variables read at start-up,
//! overridable by CLI flags for local runs, matching the env-var-first
//! convention this workspace's server binaries use rather than a heavier
//! configuration framework.

use std::time::Duration;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "graph-gateway", about = "Graph impact-analysis gateway")]
pub struct Cli {
    #[arg(long, env = "GATEWAY_BIND_ADDR")]
    pub bind_addr: Option<String>,

    #[arg(long, env = "GATEWAY_DEFAULT_ENGINE")]
    pub default_engine: Option<String>,

    #[arg(long, env = "GATEWAY_LOG_LEVEL")]
    pub log_level: Option<String>,

    #[arg(long, env = "GATEWAY_CACHE_TTL_SECS")]
    pub cache_ttl_secs: Option<u64>,

    #[arg(long, env = "GATEWAY_CACHE_MAX_ENTRIES")]
    pub cache_max_entries: Option<u64>,
}

/// Connection details for one configured Neo4j-family instance. Absent from
/// `Config` (and therefore from `/api/engines`) when its env vars aren't
/// set, per spec §6.
pub struct Neo4jConfig {
    pub url: String,
    pub user: String,
    pub password: String,
}

pub struct Config {
    pub bind_addr: String,
    pub default_engine: String,
    pub log_level: String,
    pub cache_ttl: Duration,
    pub cache_max_entries: u64,
    pub neo4j_native: Option<Neo4jConfig>,
    pub neo4j_memory: Option<Neo4jConfig>,
    pub database_url: Option<String>,
}

fn env_triplet(prefix: &str) -> Option<Neo4jConfig> {
    let url = std::env::var(format!("{prefix}_URL")).ok()?;
    let user = std::env::var(format!("{prefix}_USER")).unwrap_or_else(|_| "neo4j".to_string());
    let password = std::env::var(format!("{prefix}_PASSWORD")).unwrap_or_default();
    Some(Neo4jConfig { url, user, password })
}

impl Config {
    /// Build configuration from the environment, then apply any CLI
    /// overrides. Fails loudly (rather than falling back silently) when
    /// `default_engine` is missing — the start-up sequence must refuse to
    /// serve rather than answer every request with `EngineNotAvailable`
    /// forever (spec §9).
    pub fn load(cli: Cli) -> anyhow::Result<Self> {
        let bind_addr = cli
            .bind_addr
            .or_else(|| std::env::var("GATEWAY_BIND_ADDR").ok())
            .unwrap_or_else(|| "0.0.0.0:8080".to_string());

        let default_engine = cli
            .default_engine
            .or_else(|| std::env::var("GATEWAY_DEFAULT_ENGINE").ok())
            .ok_or_else(|| anyhow::anyhow!("GATEWAY_DEFAULT_ENGINE must be set"))?;

        let log_level = cli
            .log_level
            .or_else(|| std::env::var("GATEWAY_LOG_LEVEL").ok())
            .unwrap_or_else(|| "info".to_string());

        let cache_ttl_secs = cli
            .cache_ttl_secs
            .or_else(|| {
                std::env::var("GATEWAY_CACHE_TTL_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
            })
            .unwrap_or(300)
            .min(result_cache::MAX_TTL_SECS);

        let cache_max_entries = cli
            .cache_max_entries
            .or_else(|| {
                std::env::var("GATEWAY_CACHE_MAX_ENTRIES")
                    .ok()
                    .and_then(|v| v.parse().ok())
            })
            .unwrap_or(512);

        Ok(Self {
            bind_addr,
            default_engine,
            log_level,
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            cache_max_entries,
            neo4j_native: env_triplet("NEO4J_NATIVE"),
            neo4j_memory: env_triplet("NEO4J_MEMORY"),
            database_url: std::env::var("DATABASE_URL").ok(),
        })
    }
}
