//! Application state shared by all handlers.

use dropgate_core::Config;
use dropgate_processing::UploadPipeline;
use dropgate_storage::Storage;
use std::sync::Arc;

/// Built once at startup and shared as `Arc<AppState>`; nothing in it is mutated afterwards.
#[derive(Clone)]
pub struct AppState {
    pub upload_pipeline: UploadPipeline,
}

impl AppState {
    /// State with a pipeline configured from `config` on top of `storage`.
    pub fn new(config: &Config, storage: Arc<dyn Storage>) -> Self {
        let upload_pipeline = UploadPipeline::new(Arc::new(config.validation_policy()), storage)
            .with_prefix(config.storage_prefix())
            .with_rollback_policy(config.rollback_policy());

        Self { upload_pipeline }
    }
}
