//! API constants

/// Multipart field carrying upload files.
pub const FILES_FIELD: &str = "files";

/// Array-style spelling of [`FILES_FIELD`] sent by some form libraries.
pub const FILES_ARRAY_FIELD: &str = "files[]";
