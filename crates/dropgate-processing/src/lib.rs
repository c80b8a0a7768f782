//! Dropgate Processing Library
//!
//! The upload pipeline and the pieces it is assembled from: content sniffing,
//! storage key generation, and per-file validation.

pub mod error;
pub mod keys;
pub mod sniffer;
pub mod upload;

pub use error::UploadError;
pub use keys::{KeyGenerator, StorageKey, UuidKeyGenerator};
pub use sniffer::{ContentSniffer, InferSniffer};
pub use upload::{FilePayload, UploadPipeline};
