use crate::{LocalStorage, Storage, StorageResult};
use aqua_core::Config;
use std::sync::Arc;

/// Create the content store described by the configuration
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    let storage = LocalStorage::new(config.file_storage_path.clone()).await?;
    tracing::info!(
        path = %storage.base_path().display(),
        "Local content store ready"
    );
    Ok(Arc::new(storage))
}
