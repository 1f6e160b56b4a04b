mod setup;
mod telemetry;

use aqua_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    let app = setup::initialize_app(&config).await?;
    let tracked = app.engine.list_files().await?;
    tracing::info!(tracked_files = tracked.len(), "Storage engine ready");

    let handle = app.cleanup.clone().start();

    setup::shutdown_signal().await?;

    handle.shutdown().await;
    app.metadata.close().await;
    tracing::info!("Shutdown complete");

    Ok(())
}
