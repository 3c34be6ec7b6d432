use crate::config::ServerConfig;
use crate::services::storage::{FileStore, LocalFileStore};
use std::sync::Arc;
use tracing::info;

pub async fn setup_storage(config: &ServerConfig) -> anyhow::Result<Arc<dyn FileStore>> {
    let store = LocalFileStore::open(&config.storage_dir)
        .await
        .map_err(|e| anyhow::anyhow!("Cannot prepare storage directory {:?}: {}", config.storage_dir, e))?;

    info!("📁 Storage directory: {}", config.storage_dir.display());

    Ok(Arc::new(store))
}
