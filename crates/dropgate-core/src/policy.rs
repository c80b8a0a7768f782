//! Upload validation policy
//!
//! The policy is built once at startup (see [`crate::Config`]) and shared
//! read-only between requests. It decides how many files a batch may hold, how
//! large each file may be, and which sniffed MIME types are accepted.

use std::collections::BTreeMap;
use std::fmt;

pub const KB: usize = 1024;
pub const MB: usize = 1024 * KB;

pub const DEFAULT_MAX_FILE_SIZE_BYTES: usize = MB;
pub const DEFAULT_MAX_FILES_PER_BATCH: usize = 5;
pub const DEFAULT_ALLOWED_TYPES: &str = "image/png=png,image/jpeg=jpg,application/pdf=pdf";

/// Strip MIME parameters and surrounding whitespace
/// (e.g. "image/png; charset=binary" -> "image/png").
pub fn normalize_mime_type(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(content_type)
}

/// Allow-list of MIME types and the canonical extension stored for each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypePolicy {
    extensions: BTreeMap<String, String>,
}

impl TypePolicy {
    pub fn new<I, M, E>(entries: I) -> Self
    where
        I: IntoIterator<Item = (M, E)>,
        M: Into<String>,
        E: Into<String>,
    {
        Self {
            extensions: entries
                .into_iter()
                .map(|(mime, ext)| (mime.into(), ext.into()))
                .collect(),
        }
    }

    /// Parse a `mime=ext` comma-separated list, e.g. `image/png=png,application/pdf=pdf`.
    pub fn parse(spec: &str) -> Result<Self, anyhow::Error> {
        let mut extensions = BTreeMap::new();

        for entry in spec.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (mime, ext) = entry.split_once('=').ok_or_else(|| {
                anyhow::anyhow!("Invalid allowed type entry '{}': expected mime=ext", entry)
            })?;
            let mime = normalize_mime_type(mime);
            let ext = ext.trim().trim_start_matches('.');

            if !mime.contains('/') {
                return Err(anyhow::anyhow!(
                    "Invalid MIME type '{}' in allowed types",
                    mime
                ));
            }
            if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(anyhow::anyhow!(
                    "Invalid extension '{}' for MIME type '{}'",
                    ext,
                    mime
                ));
            }

            extensions.insert(mime.to_string(), ext.to_string());
        }

        if extensions.is_empty() {
            return Err(anyhow::anyhow!("Allowed types list must not be empty"));
        }

        Ok(Self { extensions })
    }

    /// Extension for an allow-listed MIME type, or `None` when the type is not accepted.
    ///
    /// Parameters are stripped before lookup; the remaining comparison is exact.
    pub fn extension_for(&self, mime_type: &str) -> Option<&str> {
        self.extensions
            .get(normalize_mime_type(mime_type))
            .map(String::as_str)
    }

    pub fn mime_types(&self) -> impl Iterator<Item = &str> {
        self.extensions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

impl Default for TypePolicy {
    fn default() -> Self {
        Self::new([
            ("image/png", "png"),
            ("image/jpeg", "jpg"),
            ("application/pdf", "pdf"),
        ])
    }
}

impl fmt::Display for TypePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries: Vec<String> = self
            .extensions
            .iter()
            .map(|(mime, ext)| format!("{}={}", mime, ext))
            .collect();
        write!(f, "{}", entries.join(","))
    }
}

/// Limits applied to every upload batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationPolicy {
    pub max_file_size_bytes: usize,
    pub max_files_per_batch: usize,
    pub allowed_types: TypePolicy,
}

impl ValidationPolicy {
    /// Whether `size` lies in `(0, max_file_size_bytes]`.
    pub fn accepts_size(&self, size: usize) -> bool {
        size > 0 && size <= self.max_file_size_bytes
    }
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            max_files_per_batch: DEFAULT_MAX_FILES_PER_BATCH,
            allowed_types: TypePolicy::default(),
        }
    }
}

/// What happens to objects already written when a later file in the same batch fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RollbackPolicy {
    /// Delete objects the batch already wrote, then report the original error.
    #[default]
    Compensate,
    /// Leave earlier objects in place.
    Keep,
}

impl RollbackPolicy {
    pub fn from_flag(rollback_on_failure: bool) -> Self {
        if rollback_on_failure {
            RollbackPolicy::Compensate
        } else {
            RollbackPolicy::Keep
        }
    }
}
