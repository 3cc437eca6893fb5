use anyhow::Context;
use tracing::info;

use crate::config;
use crate::database::DatabaseManager;
use crate::{app, AppState};

pub async fn handle(port: Option<u16>) -> anyhow::Result<()> {
    let config = config::config();
    info!("Starting Project Dashboard API in {:?} mode", config.environment);
    if crate::is_development!() {
        info!("Storage backend: {:?}", config.database.backend);
    }

    let store = DatabaseManager::store(&config.database)
        .await
        .context("failed to initialise the store")?;
    let app = app(AppState::new(store));

    let bind_addr = format!("0.0.0.0:{}", port.unwrap_or(config.api.port));
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    info!("Project Dashboard API listening on http://{}", bind_addr);
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
