//! Entry point for the graph-gateway binary: builds configuration, connects
//! whichever adapters have credentials in the environment, and serves the
//! HTTP router (spec §5/§6).

use std::sync::Arc;

use clap::Parser;
use http_server::config::{Cli, Config};
use http_server::state::AppState;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli)?;

    http_server::init_tracing(&config.log_level);
    info!("starting graph-gateway");

    let registry = Arc::new(http_server::build_registry(&config).await?);
    let cache = Arc::new(result_cache::ResultCache::new(
        config.cache_ttl,
        config.cache_max_entries,
    ));

    let state = AppState { registry, cache };
    let app = http_server::build_app(state);

    let listener = TcpListener::bind(config.bind_addr.as_str()).await?;
    info!(addr = %config.bind_addr, "listening");

    axum::serve(listener, app).await?;

    Ok(())
}
