use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use tourdesk::config::ServerConfig;
use tourdesk::db::TourDbManager;
use tourdesk::server::create_router;
use tourdesk::types::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = ServerConfig::from_env();
    info!("Opening database at {}", config.db_path);
    let db = TourDbManager::new(&config.db_path);
    let app_state = Arc::new(AppState::new(db));

    let router = create_router(app_state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("Listening on {}", config.bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;
    Ok(())
}

async fn shutdown_signal() {
    // Ctrl+C is enough; the store has no state to flush beyond SQLite's own.
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {}", e);
    }
}
