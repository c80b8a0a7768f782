//! Content sniffing
//!
//! Detects a MIME type from the leading bytes of a payload. The client's
//! filename and Content-Type header are never consulted.

/// Reported for zero-length input.
pub const EMPTY_MIME: &str = "application/x-empty";
/// Reported for text without a recognizable signature.
pub const TEXT_MIME: &str = "text/plain";
/// Reported for binary content without a recognizable signature.
pub const UNKNOWN_MIME: &str = "application/octet-stream";

pub trait ContentSniffer: Send + Sync {
    /// Best-effort MIME type of `data`. Never fails; unknown content maps to a
    /// generic type.
    fn detect(&self, data: &[u8]) -> String;
}

/// Magic-number sniffer backed by the `infer` signature database.
#[derive(Debug, Clone, Copy, Default)]
pub struct InferSniffer;

impl ContentSniffer for InferSniffer {
    fn detect(&self, data: &[u8]) -> String {
        if data.is_empty() {
            return EMPTY_MIME.to_string();
        }

        if let Some(kind) = infer::get(data) {
            return kind.mime_type().to_string();
        }

        // infer has no signature for plain text: accept valid UTF-8 without NUL bytes
        if std::str::from_utf8(data).is_ok() && !data.contains(&0) {
            return TEXT_MIME.to_string();
        }

        UNKNOWN_MIME.to_string()
    }
}
