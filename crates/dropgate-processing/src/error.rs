use dropgate_storage::StorageError;

/// Reasons an upload batch is rejected. The first one encountered aborts the batch.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("No files in upload batch")]
    EmptyBatch,

    #[error("Upload batch has {count} files (max: {max})")]
    BatchTooLarge { count: usize, max: usize },

    #[error("Invalid file size: {size} bytes (allowed: 1-{max} bytes)")]
    InvalidSize { size: usize, max: usize },

    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("Storage write failed")]
    StorageWrite(#[source] StorageError),
}

impl UploadError {
    /// Whether the client caused the failure (as opposed to the storage backend).
    pub fn is_client_error(&self) -> bool {
        !matches!(self, UploadError::StorageWrite(_))
    }
}
