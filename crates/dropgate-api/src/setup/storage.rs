//! Storage setup and initialization

use anyhow::Result;
use dropgate_core::{Config, StorageBackend};
use dropgate_storage::{create_storage, Storage};
use std::sync::Arc;

/// Build the configured storage backend.
pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    tracing::info!("Initializing storage abstraction...");
    let storage = create_storage(config).await?;
    let backend_type = storage.backend_type();

    match backend_type {
        StorageBackend::S3 => tracing::info!(
            backend = %backend_type,
            bucket = %config.s3_bucket(),
            region = ?config.s3_region().or_else(|| config.aws_region()),
            endpoint = ?config.s3_endpoint(),
            prefix = %config.storage_prefix(),
            "Storage abstraction initialized successfully"
        ),
        StorageBackend::Local => tracing::info!(
            backend = %backend_type,
            path = ?config.local_storage_path(),
            prefix = %config.storage_prefix(),
            "Storage abstraction initialized successfully"
        ),
    }

    Ok(storage)
}
