//! Dropgate Storage Library
//!
//! Blob store abstraction and its S3 and local filesystem implementations.
//!
//! # Storage key format
//!
//! Objects are stored under a namespace prefix: `{prefix}/{uuid}.{ext}`
//! (`images/` by default). Keys must not contain `..` or a leading `/`. The
//! layout is centralized in the `keys` module so all backends stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
pub mod traits;

// Re-export commonly used types
pub use dropgate_core::StorageBackend;
pub use factory::create_storage;
pub use keys::namespaced_key;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
