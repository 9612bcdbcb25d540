//! RUM server binary

use anyhow::Result;
use lab_analysis::Analyzer;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use rum_server::config::ServerConfig;
use rum_server::store::SqliteRumStore;
use rum_server::{build_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rum_server=info".parse()?)
                .add_directive("lab_analysis=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    info!("Initializing RUM server...");
    let config = ServerConfig::from_env()?;

    let store = SqliteRumStore::connect(&config.database_url).await?;
    let analysis_config = config.load_analysis_config()?;
    let analyzer = Arc::new(Analyzer::chromium(&analysis_config));
    info!("Lab device: {}", analyzer.profile().description());

    let state = Arc::new(AppState::new(Arc::new(store), analyzer.clone()));
    let feed = state.feed.clone();
    let app = build_router(state, config.static_dir.as_deref());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Starting RUM server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutting down; waiting for in-flight analyses");
            analyzer.shutdown();
            feed.close();
        })
        .await?;

    Ok(())
}
