use std::net::SocketAddr;

use anyhow::{Context, Result};
use tracing::info;

use sentinel_core::ArtifactStore;

use crate::config::Config;
use crate::state::{AppState, ServiceContext};

pub async fn run(config: Config) -> Result<()> {
    info!("Sentinel inference service starting...");
    info!("Artifacts: {}", config.artifact_dir.display());

    let store = ArtifactStore::new(&config.artifact_dir);
    let ctx = ServiceContext::load(&store, config.require_model)
        .context("cannot start without a valid model (set REQUIRE_MODEL=false to allow)")?;

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", config.host, config.port))?;

    let app = crate::create_router(AppState::new(ctx, config));

    info!("🚀 Server listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
