//! Dropgate Core Library
//!
//! Configuration, upload policy, and error types shared by every dropgate crate.

pub mod config;
pub mod error;
pub mod policy;
pub mod storage_types;

// Re-export commonly used types
pub use config::{BaseConfig, Config, GatewayConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use policy::{RollbackPolicy, TypePolicy, ValidationPolicy, KB, MB};
pub use storage_types::StorageBackend;
