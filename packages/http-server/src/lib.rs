//! Thin HTTP dispatch plane (spec §4.I): engine routing, the four
//! cross-cutting query parameters, cache-header tagging, and gzip/timing
//! middleware. Exposed as a library, in addition to the `graph-gateway`
//! binary, so the router can be exercised directly in integration tests
//! without a live back-end.

pub mod config;
pub mod context;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::middleware::from_fn;
use axum::Router;
use engine_contract::{EngineRegistry, GraphEngine};
use engine_neo4j::{Neo4jDialect, Neo4jEngine};
use engine_relational::RelationalEngine;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use config::Config;
use state::AppState;

const POSTGRES_MAX_CONNECTIONS: u32 = 10;
const POSTGRES_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Connect every adapter named by `config`'s environment and build the
/// immutable registry behind it. Adapters with no credentials configured
/// are simply absent, per spec §6 ("adapters absent from configuration
/// MUST NOT appear in `/api/engines`").
pub async fn build_registry(config: &Config) -> Result<EngineRegistry> {
    let mut engines: Vec<Arc<dyn GraphEngine>> = Vec::new();

    if let Some(neo4j) = &config.neo4j_native {
        engines.push(Arc::new(Neo4jEngine::new(
            Neo4jDialect::Native,
            neo4j.url.clone(),
            neo4j.user.clone(),
            neo4j.password.clone(),
            "neo4j",
        )));
        info!("registered engine: neo4j");
    }

    if let Some(neo4j) = &config.neo4j_memory {
        engines.push(Arc::new(Neo4jEngine::new(
            Neo4jDialect::InMemory,
            neo4j.url.clone(),
            neo4j.user.clone(),
            neo4j.password.clone(),
            "default",
        )));
        info!("registered engine: neo4j-memory");
    }

    if let Some(database_url) = &config.database_url {
        let relational = RelationalEngine::connect(
            database_url,
            "postgres",
            POSTGRES_MAX_CONNECTIONS,
            POSTGRES_ACQUIRE_TIMEOUT,
        )
        .await?;
        engines.push(Arc::new(relational));
        info!("registered engine: postgres");
    }

    Ok(EngineRegistry::new(engines, config.default_engine.clone())?)
}

/// Assemble the full router: routes, cache-header tagging, tracing, CORS,
/// and the hand-rolled timing/compression layers (spec §4.I).
pub fn build_app(state: AppState) -> Router {
    routes::build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(from_fn(middleware::timing::track_response_time))
        .layer(from_fn(middleware::compression::negotiate_gzip))
}

pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("graph_gateway={log_level},tower_http=info")));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .init();
}
