use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use dropgate_processing::StorageKey;
use serde::Serialize;

use crate::error::HttpAppError;
use crate::state::AppState;
use crate::utils::upload::extract_multipart_files;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Generated object names, in the order the files were sent
    pub file_names: Vec<StorageKey>,
}

/// Upload handler
///
/// Decodes the `files` parts of the form and runs them through the upload
/// pipeline. The whole batch succeeds or the first failure is returned.
///
/// # Errors
/// - `AppError::NoFiles` / `TooManyFiles` / `InvalidFileSize` / `UnsupportedFileType` - 400
/// - `AppError::BadRequest` - body is not a readable multipart form
/// - `AppError::Storage` - storage write failed (502)
#[tracing::instrument(skip(state, multipart), fields(operation = "upload_files"))]
pub async fn upload_files(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, HttpAppError> {
    let files = extract_multipart_files(multipart?, state.upload_pipeline.policy()).await?;

    let file_count = files.len();
    let total_bytes: usize = files.iter().map(|f| f.size()).sum();
    tracing::debug!(file_count, total_bytes, "Received upload batch");

    let file_names = state.upload_pipeline.process(files).await?;

    tracing::info!(
        file_count,
        total_bytes,
        file_names = ?file_names,
        "Files uploaded successfully"
    );

    Ok(Json(UploadResponse { file_names }))
}
