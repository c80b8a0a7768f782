//! Storage key generation

use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Generated object name in the form `{uuid}.{extension}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct StorageKey(String);

impl StorageKey {
    /// Wrap an already formed object name. Used by custom [`KeyGenerator`]s.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn extension(&self) -> Option<&str> {
        self.0.rsplit_once('.').map(|(_, ext)| ext)
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<StorageKey> for String {
    fn from(key: StorageKey) -> Self {
        key.0
    }
}

pub trait KeyGenerator: Send + Sync {
    fn new_key(&self, extension: &str) -> StorageKey;
}

/// Random (v4) UUID keys; uniqueness needs no shared state.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidKeyGenerator;

impl KeyGenerator for UuidKeyGenerator {
    fn new_key(&self, extension: &str) -> StorageKey {
        StorageKey(format!("{}.{}", Uuid::new_v4(), extension))
    }
}
