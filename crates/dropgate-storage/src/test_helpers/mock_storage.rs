//! Mock Storage implementation for testing

use crate::{Storage, StorageBackend, StorageError, StorageResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Mock storage implementation that stores files in memory
///
/// Can be told to fail the n-th `put` (1-based) or every `delete`, to exercise
/// storage error paths.
pub struct MockStorage {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    puts: AtomicUsize,
    fail_put_at: Option<usize>,
    fail_deletes: bool,
}

impl MockStorage {
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(HashMap::new())),
            puts: AtomicUsize::new(0),
            fail_put_at: None,
            fail_deletes: false,
        }
    }

    /// Fail the n-th call to `put` (1-based); earlier and later calls succeed.
    pub fn failing_put_at(n: usize) -> Self {
        Self {
            fail_put_at: Some(n),
            ..Self::new()
        }
    }

    /// Make every `delete` fail.
    pub fn with_failing_deletes(mut self) -> Self {
        self.fail_deletes = true;
        self
    }

    /// Check if a file exists in the mock storage
    pub fn has_file(&self, key: &str) -> bool {
        self.files.lock().unwrap().contains_key(key)
    }

    /// Get file data (for test assertions)
    pub fn get_file(&self, key: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(key).cloned()
    }

    /// All stored keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.files.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `put` calls made so far, including failed ones
    pub fn put_calls(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

impl Default for MockStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn put(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> StorageResult<()> {
        let call = self.puts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_put_at == Some(call) {
            return Err(StorageError::UploadFailed(format!(
                "mock put #{} failed for {}",
                call, storage_key
            )));
        }
        self.files
            .lock()
            .unwrap()
            .insert(storage_key.to_string(), data);
        Ok(())
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(storage_key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(storage_key.to_string()))
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        if self.fail_deletes {
            return Err(StorageError::DeleteFailed(format!(
                "mock delete failed for {}",
                storage_key
            )));
        }
        self.files.lock().unwrap().remove(storage_key);
        Ok(())
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        Ok(self.files.lock().unwrap().contains_key(storage_key))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
