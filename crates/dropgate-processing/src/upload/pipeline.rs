//! Upload pipeline.
//!
//! Every file in a batch goes through the same steps, in input order:
//! size check → content sniffing → type allow-list → key generation → storage
//! write. The first failure aborts the batch. Objects the batch already wrote
//! are then deleted or kept according to the configured [`RollbackPolicy`].

use std::sync::Arc;

use dropgate_core::{RollbackPolicy, ValidationPolicy};
use dropgate_storage::{namespaced_key, Storage};

use super::types::FilePayload;
use crate::error::UploadError;
use crate::keys::{KeyGenerator, StorageKey, UuidKeyGenerator};
use crate::sniffer::{ContentSniffer, InferSniffer};

const DEFAULT_PREFIX: &str = "images";

/// Validates upload batches and writes accepted files to storage.
///
/// Cheap to share: everything it holds is immutable or `Arc`-backed, so one
/// instance serves all requests.
#[derive(Clone)]
pub struct UploadPipeline {
    policy: Arc<ValidationPolicy>,
    storage: Arc<dyn Storage>,
    sniffer: Arc<dyn ContentSniffer>,
    key_generator: Arc<dyn KeyGenerator>,
    prefix: String,
    rollback: RollbackPolicy,
}

/// A file that passed validation and is ready to be stored.
struct AcceptedFile {
    detected_type: String,
    extension: String,
}

impl UploadPipeline {
    /// Pipeline with the default sniffer, UUID keys, `images/` prefix and
    /// compensating deletes.
    pub fn new(policy: Arc<ValidationPolicy>, storage: Arc<dyn Storage>) -> Self {
        Self {
            policy,
            storage,
            sniffer: Arc::new(InferSniffer),
            key_generator: Arc::new(UuidKeyGenerator),
            prefix: DEFAULT_PREFIX.to_string(),
            rollback: RollbackPolicy::default(),
        }
    }

    pub fn with_sniffer(mut self, sniffer: Arc<dyn ContentSniffer>) -> Self {
        self.sniffer = sniffer;
        self
    }

    pub fn with_key_generator(mut self, key_generator: Arc<dyn KeyGenerator>) -> Self {
        self.key_generator = key_generator;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into().trim_matches('/').to_string();
        self
    }

    pub fn with_rollback_policy(mut self, rollback: RollbackPolicy) -> Self {
        self.rollback = rollback;
        self
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn rollback_policy(&self) -> RollbackPolicy {
        self.rollback
    }

    /// Object path for a generated key, e.g. `images/{uuid}.png`.
    pub fn object_path(&self, key: &StorageKey) -> Result<String, UploadError> {
        namespaced_key(&self.prefix, key.as_str()).map_err(UploadError::StorageWrite)
    }

    /// Validate and store a batch. Returns the generated keys in input order.
    pub async fn process(&self, files: Vec<FilePayload>) -> Result<Vec<StorageKey>, UploadError> {
        if files.is_empty() {
            return Err(UploadError::EmptyBatch);
        }

        let max = self.policy.max_files_per_batch;
        if files.len() > max {
            tracing::warn!(count = files.len(), max, "Rejected oversized upload batch");
            return Err(UploadError::BatchTooLarge {
                count: files.len(),
                max,
            });
        }

        let total = files.len();
        let mut keys = Vec::with_capacity(total);
        let mut written: Vec<String> = Vec::with_capacity(total);

        for (index, file) in files.into_iter().enumerate() {
            match self.store_file(index, file).await {
                Ok((key, path)) => {
                    keys.push(key);
                    written.push(path);
                }
                Err(err) => {
                    tracing::warn!(
                        index,
                        total,
                        stored = written.len(),
                        error = %err,
                        "Upload batch aborted"
                    );
                    self.roll_back(&written).await;
                    return Err(err);
                }
            }
        }

        tracing::info!(count = keys.len(), "Upload batch stored");
        Ok(keys)
    }

    /// Size, content type and allow-list checks for a single file.
    fn validate(&self, file: &FilePayload) -> Result<AcceptedFile, UploadError> {
        let size = file.size();
        if !self.policy.accepts_size(size) {
            return Err(UploadError::InvalidSize {
                size,
                max: self.policy.max_file_size_bytes,
            });
        }

        let detected_type = self.sniffer.detect(&file.data);
        let extension = self
            .policy
            .allowed_types
            .extension_for(&detected_type)
            .ok_or_else(|| UploadError::UnsupportedType(detected_type.clone()))?
            .to_string();

        Ok(AcceptedFile {
            detected_type,
            extension,
        })
    }

    async fn store_file(
        &self,
        index: usize,
        file: FilePayload,
    ) -> Result<(StorageKey, String), UploadError> {
        let accepted = self.validate(&file).map_err(|err| {
            tracing::debug!(
                index,
                filename = %file.filename,
                declared_content_type = ?file.declared_content_type,
                size_bytes = file.size(),
                error = %err,
                "File rejected"
            );
            err
        })?;

        let key = self.key_generator.new_key(&accepted.extension);
        let path = self.object_path(&key)?;
        let size = file.size();

        tracing::info!(
            index,
            key = %path,
            filename = %file.filename,
            detected_type = %accepted.detected_type,
            size_bytes = size,
            "Uploading file to storage"
        );

        self.storage
            .put(&path, file.data, &accepted.detected_type)
            .await
            .map_err(UploadError::StorageWrite)?;

        Ok((key, path))
    }

    /// Undo the writes of an aborted batch, per the rollback policy.
    ///
    /// Delete failures are logged and otherwise ignored: the caller always sees
    /// the error that aborted the batch.
    async fn roll_back(&self, written: &[String]) {
        if written.is_empty() {
            return;
        }

        match self.rollback {
            RollbackPolicy::Keep => {
                tracing::warn!(
                    orphaned = written.len(),
                    keys = ?written,
                    "Upload batch failed; earlier files remain in storage"
                );
            }
            RollbackPolicy::Compensate => {
                let mut removed = 0usize;
                for path in written.iter().rev() {
                    match self.storage.delete(path).await {
                        Ok(()) => removed += 1,
                        Err(e) => {
                            tracing::warn!(
                                key = %path,
                                error = %e,
                                "Compensating delete failed; object left in storage"
                            );
                        }
                    }
                }
                tracing::info!(
                    removed,
                    attempted = written.len(),
                    "Rolled back partially stored upload batch"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dropgate_core::MB;
    use dropgate_storage::test_helpers::MockStorage;
    use dropgate_storage::StorageError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const PNG_HEADER: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x02, 0x00, 0x00, 0x00,
    ];
    const JPEG_HEADER: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00];
    const PDF_HEADER: &[u8] = b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog >>\nendobj\n";

    fn padded(header: &[u8], size: usize) -> Vec<u8> {
        let mut data = header.to_vec();
        data.resize(size, 0);
        data
    }

    fn png(name: &str) -> FilePayload {
        FilePayload::new(name, PNG_HEADER.to_vec()).with_content_type("image/png")
    }

    fn jpeg(name: &str) -> FilePayload {
        FilePayload::new(name, JPEG_HEADER.to_vec()).with_content_type("image/jpeg")
    }

    fn pdf(name: &str) -> FilePayload {
        FilePayload::new(name, PDF_HEADER.to_vec()).with_content_type("application/pdf")
    }

    fn text(name: &str) -> FilePayload {
        FilePayload::new(name, b"just some notes\n".to_vec()).with_content_type("text/plain")
    }

    fn pipeline(storage: Arc<MockStorage>) -> UploadPipeline {
        UploadPipeline::new(Arc::new(ValidationPolicy::default()), storage)
    }

    /// Deterministic keys: `file-0.ext`, `file-1.ext`, ...
    #[derive(Default)]
    struct SequentialKeys(AtomicUsize);

    impl KeyGenerator for SequentialKeys {
        fn new_key(&self, extension: &str) -> StorageKey {
            let n = self.0.fetch_add(1, Ordering::SeqCst);
            StorageKey::new(format!("file-{}.{}", n, extension))
        }
    }

    struct FixedSniffer(&'static str);

    impl ContentSniffer for FixedSniffer {
        fn detect(&self, _data: &[u8]) -> String {
            self.0.to_string()
        }
    }

    #[tokio::test]
    async fn test_valid_batch_returns_keys_in_input_order() {
        let storage = Arc::new(MockStorage::new());
        let pipeline = pipeline(storage.clone());

        let files = vec![png("a.png"), pdf("b.pdf"), jpeg("c.jpeg"), png("d.png"), pdf("e.pdf")];
        let keys = pipeline.process(files).await.unwrap();

        let extensions: Vec<&str> = keys.iter().filter_map(|k| k.extension()).collect();
        assert_eq!(extensions, vec!["png", "pdf", "jpg", "png", "pdf"]);
        assert_eq!(storage.len(), 5);
        for key in &keys {
            let (id, _) = key.as_str().rsplit_once('.').unwrap();
            assert!(uuid::Uuid::parse_str(id).is_ok());
            assert!(storage.has_file(&format!("images/{}", key)));
        }
    }

    #[tokio::test]
    async fn test_every_batch_size_up_to_max_succeeds() {
        for n in 1..=5 {
            let storage = Arc::new(MockStorage::new());
            let files = (0..n).map(|i| png(&format!("{}.png", i))).collect();
            let keys = pipeline(storage.clone()).process(files).await.unwrap();
            assert_eq!(keys.len(), n);
            assert_eq!(storage.len(), n);
        }
    }

    #[tokio::test]
    async fn test_stored_bytes_are_unchanged() {
        let storage = Arc::new(MockStorage::new());
        let keys = pipeline(storage.clone())
            .process(vec![pdf("doc.pdf")])
            .await
            .unwrap();

        let stored = storage.get_file(&format!("images/{}", keys[0])).unwrap();
        assert_eq!(stored, PDF_HEADER);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let storage = Arc::new(MockStorage::new());
        let result = pipeline(storage.clone()).process(vec![]).await;
        assert!(matches!(result, Err(UploadError::EmptyBatch)));
        assert_eq!(storage.put_calls(), 0);
    }

    #[tokio::test]
    async fn test_batch_too_large_regardless_of_validity() {
        let storage = Arc::new(MockStorage::new());
        let files = (0..6).map(|i| text(&format!("{}.txt", i))).collect();
        let result = pipeline(storage.clone()).process(files).await;
        assert!(matches!(
            result,
            Err(UploadError::BatchTooLarge { count: 6, max: 5 })
        ));
        assert_eq!(storage.put_calls(), 0);

        let files = (0..6).map(|i| png(&format!("{}.png", i))).collect();
        let result = pipeline(storage.clone()).process(files).await;
        assert!(matches!(result, Err(UploadError::BatchTooLarge { .. })));
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_zero_byte_file_is_invalid_size() {
        let storage = Arc::new(MockStorage::new());
        let result = pipeline(storage.clone())
            .process(vec![FilePayload::new("empty.png", Vec::new())])
            .await;
        assert!(matches!(
            result,
            Err(UploadError::InvalidSize { size: 0, .. })
        ));
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_size_boundary_is_inclusive() {
        let storage = Arc::new(MockStorage::new());
        let pipeline = pipeline(storage.clone());

        let exact = FilePayload::new("exact.png", padded(PNG_HEADER, MB));
        let keys = pipeline.process(vec![exact]).await.unwrap();
        assert_eq!(keys.len(), 1);

        let over = FilePayload::new("over.png", padded(PNG_HEADER, MB + 1));
        let result = pipeline.process(vec![over]).await;
        match result {
            Err(UploadError::InvalidSize { size, max }) => {
                assert_eq!(size, MB + 1);
                assert_eq!(max, MB);
            }
            other => panic!("Expected InvalidSize, got {:?}", other),
        }
        assert_eq!(storage.len(), 1);
    }

    #[tokio::test]
    async fn test_plain_text_is_unsupported() {
        let storage = Arc::new(MockStorage::new());
        let result = pipeline(storage.clone()).process(vec![text("notes.txt")]).await;
        match result {
            Err(UploadError::UnsupportedType(detected)) => assert_eq!(detected, "text/plain"),
            other => panic!("Expected UnsupportedType, got {:?}", other),
        }
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_declared_type_and_filename_are_ignored() {
        let storage = Arc::new(MockStorage::new());
        let pipeline = pipeline(storage.clone());

        let disguised = FilePayload::new("report.pdf", PNG_HEADER.to_vec())
            .with_content_type("application/pdf");
        let keys = pipeline.process(vec![disguised]).await.unwrap();
        assert_eq!(keys[0].extension(), Some("png"));

        let spoofed =
            FilePayload::new("photo.png", b"plain words".to_vec()).with_content_type("image/png");
        let result = pipeline.process(vec![spoofed]).await;
        assert!(matches!(result, Err(UploadError::UnsupportedType(t)) if t == "text/plain"));
    }

    #[tokio::test]
    async fn test_mixed_batch_rolls_back_with_compensation() {
        let storage = Arc::new(MockStorage::new());
        let pipeline = pipeline(storage.clone()).with_rollback_policy(RollbackPolicy::Compensate);

        let oversized = FilePayload::new("big.jpg", padded(JPEG_HEADER, MB + 1));
        let result = pipeline.process(vec![png("ok.png"), oversized]).await;

        assert!(matches!(result, Err(UploadError::InvalidSize { .. })));
        assert_eq!(storage.put_calls(), 1);
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_mixed_batch_keeps_earlier_files_without_compensation() {
        let storage = Arc::new(MockStorage::new());
        let pipeline = pipeline(storage.clone()).with_rollback_policy(RollbackPolicy::Keep);

        let oversized = FilePayload::new("big.jpg", padded(JPEG_HEADER, MB + 1));
        let result = pipeline.process(vec![png("ok.png"), oversized]).await;

        assert!(matches!(result, Err(UploadError::InvalidSize { .. })));
        assert_eq!(storage.len(), 1);
    }

    #[tokio::test]
    async fn test_fail_fast_stops_at_first_invalid_file() {
        let storage = Arc::new(MockStorage::new());
        let pipeline = pipeline(storage.clone()).with_rollback_policy(RollbackPolicy::Keep);

        let files = vec![png("1.png"), text("2.txt"), pdf("3.pdf")];
        let result = pipeline.process(files).await;

        assert!(matches!(result, Err(UploadError::UnsupportedType(_))));
        // The PDF after the failing file is never attempted
        assert_eq!(storage.put_calls(), 1);
    }

    #[tokio::test]
    async fn test_storage_failure_is_reported_and_rolled_back() {
        let storage = Arc::new(MockStorage::failing_put_at(2));
        let pipeline = pipeline(storage.clone());

        let result = pipeline
            .process(vec![png("1.png"), pdf("2.pdf"), jpeg("3.jpg")])
            .await;

        match result {
            Err(UploadError::StorageWrite(StorageError::UploadFailed(msg))) => {
                assert!(msg.contains("put #2"));
            }
            other => panic!("Expected StorageWrite, got {:?}", other),
        }
        assert_eq!(storage.put_calls(), 2);
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_failed_compensation_still_returns_original_error() {
        let storage = Arc::new(MockStorage::failing_put_at(3).with_failing_deletes());
        let pipeline = pipeline(storage.clone());

        let result = pipeline
            .process(vec![png("1.png"), png("2.png"), png("3.png")])
            .await;

        assert!(matches!(result, Err(UploadError::StorageWrite(_))));
        assert_eq!(storage.len(), 2);
    }

    #[tokio::test]
    async fn test_custom_prefix_and_key_generator() {
        let storage = Arc::new(MockStorage::new());
        let pipeline = pipeline(storage.clone())
            .with_prefix("/uploads/")
            .with_key_generator(Arc::new(SequentialKeys::default()));

        let keys = pipeline
            .process(vec![png("a.png"), pdf("b.pdf")])
            .await
            .unwrap();

        assert_eq!(keys[0].as_str(), "file-0.png");
        assert_eq!(keys[1].as_str(), "file-1.pdf");
        assert_eq!(
            storage.keys(),
            vec!["uploads/file-0.png".to_string(), "uploads/file-1.pdf".to_string()]
        );
    }

    #[tokio::test]
    async fn test_injected_sniffer_decides_acceptance() {
        let storage = Arc::new(MockStorage::new());
        let pipeline = pipeline(storage.clone())
            .with_sniffer(Arc::new(FixedSniffer("application/pdf; version=1.7")));

        let keys = pipeline.process(vec![text("anything.txt")]).await.unwrap();
        assert_eq!(keys[0].extension(), Some("pdf"));
    }

    #[tokio::test]
    async fn test_custom_policy_limits() {
        let storage = Arc::new(MockStorage::new());
        let policy = ValidationPolicy {
            max_file_size_bytes: 16,
            max_files_per_batch: 1,
            ..ValidationPolicy::default()
        };
        let pipeline = UploadPipeline::new(Arc::new(policy), storage.clone());

        let result = pipeline.process(vec![png("a.png"), png("b.png")]).await;
        assert!(matches!(
            result,
            Err(UploadError::BatchTooLarge { count: 2, max: 1 })
        ));

        let result = pipeline.process(vec![png("a.png")]).await;
        assert!(matches!(
            result,
            Err(UploadError::InvalidSize { max: 16, .. })
        ));
    }
}
