//! Dropgate API Library
//!
//! This crate provides the HTTP handlers and application setup for the upload gateway.

// Module declarations
pub mod constants;
mod handlers;
pub mod setup;
mod telemetry;
mod utils;

// Public modules
pub mod error;
pub mod state;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
