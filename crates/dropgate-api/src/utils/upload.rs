//! Multipart decoding for the upload handler

use axum::extract::Multipart;
use dropgate_core::{AppError, ValidationPolicy};
use dropgate_processing::FilePayload;

use crate::constants::{FILES_ARRAY_FIELD, FILES_FIELD};

/// Collect every part named `files` (or `files[]`) in submission order.
/// Other fields are skipped. Size and type are left to the pipeline.
///
/// Bodies are streamed: each file keeps at most `max_file_size_bytes + 1` bytes,
/// enough for the pipeline to see it is too large. Parts past
/// `max_files_per_batch` are drained and kept as empty placeholders so the batch
/// count stays exact.
pub async fn extract_multipart_files(
    mut multipart: Multipart,
    policy: &ValidationPolicy,
) -> Result<Vec<FilePayload>, AppError> {
    let mut files = Vec::new();
    let cap = policy.max_file_size_bytes.saturating_add(1);

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read multipart: {}", e)))?
    {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();

        if field_name != FILES_FIELD && field_name != FILES_ARRAY_FIELD {
            tracing::debug!(field = %field_name, "Ignoring multipart field");
            continue;
        }

        let filename = field
            .file_name()
            .map(sanitize_filename)
            .unwrap_or_else(|| "unknown".to_string());
        let content_type = field.content_type().map(|s: &str| s.to_string());

        let keep = files.len() < policy.max_files_per_batch;
        let mut data = Vec::new();
        let mut received = 0usize;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read file data: {}", e)))?
        {
            received = received.saturating_add(chunk.len());
            if keep {
                append_capped(&mut data, &chunk, cap);
            }
        }

        if received > data.len() {
            tracing::debug!(
                filename = %filename,
                received,
                kept = data.len(),
                "Discarded bytes beyond upload limits"
            );
        }

        let mut payload = FilePayload::new(filename, data);
        if let Some(content_type) = content_type {
            payload = payload.with_content_type(content_type);
        }
        files.push(payload);
    }

    Ok(files)
}

/// Append as much of `chunk` as fits under `cap` total bytes.
fn append_capped(buffer: &mut Vec<u8>, chunk: &[u8], cap: usize) {
    let room = cap.saturating_sub(buffer.len());
    buffer.extend_from_slice(&chunk[..chunk.len().min(room)]);
}

/// Reduce a client-supplied filename to something safe to log.
/// Directory components are dropped and unusual characters replaced.
pub fn sanitize_filename(filename: &str) -> String {
    const MAX_FILENAME_LENGTH: usize = 255;

    let filename_only = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .trim_start_matches('.');

    let sanitized: String = filename_only
        .chars()
        .take(MAX_FILENAME_LENGTH)
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.trim_matches('_').is_empty() {
        return "file".to_string();
    }

    sanitized
}
