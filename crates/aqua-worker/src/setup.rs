//! Worker initialization: configuration, stores, engine and scheduler.

use anyhow::{Context, Result};
use aqua_core::Config;
use aqua_db::{SqliteMetadataStore, SqliteOptions};
use aqua_services::{CleanupConfig, CleanupService, StorageEngine, StorageEngineConfig};
use std::sync::Arc;

pub struct App {
    pub engine: StorageEngine,
    pub metadata: SqliteMetadataStore,
    pub cleanup: Arc<CleanupService>,
}

pub fn sqlite_options(config: &Config) -> SqliteOptions {
    SqliteOptions {
        max_read_connections: config.db_max_read_connections,
        busy_timeout: config.db_busy_timeout(),
    }
}

/// Validate the configuration, install logging and open both stores.
pub async fn initialize_app(config: &Config) -> Result<App> {
    config
        .validate()
        .context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.is_production())?;

    tracing::info!(
        environment = %config.environment,
        file_storage_path = %config.file_storage_path.display(),
        meta_db = %config.meta_db_file().display(),
        "Configuration loaded and validated successfully"
    );

    build_app(config).await
}

pub async fn build_app(config: &Config) -> Result<App> {
    let storage = aqua_storage::create_storage(config)
        .await
        .context("Failed to set up content store")?;

    let metadata = SqliteMetadataStore::open(config.meta_db_file(), sqlite_options(config))
        .await
        .context("Failed to open metadata store")?;

    let engine = StorageEngine::new(
        storage,
        Arc::new(metadata.clone()),
        StorageEngineConfig::from(config),
    );
    let cleanup = Arc::new(CleanupService::new(
        engine.clone(),
        CleanupConfig::from(config),
    ));

    Ok(App {
        engine,
        metadata,
        cleanup,
    })
}

/// Wait for Ctrl+C or SIGTERM.
pub async fn shutdown_signal() -> Result<()> {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    let mut terminate =
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .context("Failed to install signal handler")?;

    #[cfg(unix)]
    let terminate = terminate.recv();

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Option<()>>();

    tokio::select! {
        res = ctrl_c => {
            res.context("Failed to listen for Ctrl+C")?;
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal");
        },
    }

    tracing::info!("Shutting down gracefully...");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aqua_core::Ttl;

    #[tokio::test]
    async fn test_build_app_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::from_lookup(|key| match key {
            "FILE_STORAGE_PATH" => Some(dir.path().join("files").display().to_string()),
            "FILE_META_DB_PATH" => Some(dir.path().join("meta").display().to_string()),
            "FILE_NAME_LENGTH" => Some("12".to_string()),
            _ => None,
        })
        .unwrap();
        config.validate().unwrap();

        let app = build_app(&config).await.unwrap();
        assert!(dir.path().join("meta").join("files.db").exists());

        let record = app
            .engine
            .store_file(&mut &b"hello"[..], Ttl::Seconds(0), None)
            .await
            .unwrap();
        assert_eq!(record.id.len(), 12);
        assert!(dir.path().join("files").join(&record.id).is_file());

        let report = app.cleanup.run_once().await.unwrap();
        assert_eq!(report.deleted, 1);
        app.metadata.close().await;
    }

    #[test]
    fn test_sqlite_options_follow_config() {
        let config = Config {
            db_max_read_connections: 2,
            db_busy_timeout_secs: 9,
            ..Config::default()
        };
        let options = sqlite_options(&config);
        assert_eq!(options.max_read_connections, 2);
        assert_eq!(options.busy_timeout.as_secs(), 9);
    }
}
