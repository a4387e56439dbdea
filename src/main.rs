//! Concordance API server
//!
//! Main entry point for the concordance REST service.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use concordance_api::{
    handlers::ServiceSettings, router::build_router, AppConfig, AuthorityRegistry,
    ConcordanceResolver, ConnectivityCell, ConnectivityMonitor, GraphStore, MemoryGraph,
    Neo4jHttpStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{},tower_http=debug", config.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        app_system_code = %config.app_system_code,
        neo_url = %config.neo_url,
        port = config.port,
        env = %config.env,
        cache_duration_secs = config.cache_duration_secs,
        healthcheck_interval = ?config.healthcheck_interval(),
        batch_size = config.batch_size,
        graph_fixture = ?config.graph_fixture,
        "Starting concordance API"
    );

    let store: Arc<dyn GraphStore> = match &config.graph_fixture {
        Some(path) => {
            tracing::info!(path = %path.display(), "Serving from graph fixture");
            Arc::new(MemoryGraph::from_file(path)?)
        }
        None => Arc::new(
            Neo4jHttpStore::new(&config.neo_url, config.neo_timeout(), config.batch_size)
                .context("building Neo4j client")?,
        ),
    };

    let resolver = Arc::new(ConcordanceResolver::new(
        store.clone(),
        AuthorityRegistry::new(),
        &config.env,
    ));

    // Connectivity monitor
    let connectivity = ConnectivityCell::new();
    ConnectivityMonitor::new(store, connectivity.clone(), config.healthcheck_interval()).spawn();

    let app = build_router(resolver, connectivity, ServiceSettings::from_config(&config));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!("Concordance API listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
