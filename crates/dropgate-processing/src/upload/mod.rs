//! Upload pipeline: validate → sniff → check type → name → store.

mod pipeline;
mod types;

pub use pipeline::UploadPipeline;
pub use types::FilePayload;
