//! Shared key layout for storage backends.
//!
//! Objects live under a fixed namespace prefix: `{prefix}/{key}`, e.g.
//! `images/0b6f…c1.png`. Keys must not contain `..` or a leading `/`.

use crate::{StorageError, StorageResult};

/// Reject keys that could escape the namespace or address a directory.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    if key.contains("..") || key.starts_with('/') || key.ends_with('/') {
        return Err(StorageError::InvalidKey(format!(
            "Storage key contains invalid characters: {}",
            key
        )));
    }
    Ok(())
}

/// Join `prefix` and `key` into the object path used by every backend.
pub fn namespaced_key(prefix: &str, key: &str) -> StorageResult<String> {
    let prefix = prefix.trim_matches('/');
    let full = if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}/{}", prefix, key)
    };
    validate_key(&full)?;
    Ok(full)
}
