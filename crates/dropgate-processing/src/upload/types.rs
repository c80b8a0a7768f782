//! Types for the upload pipeline.

/// One file from an upload request, fully buffered.
///
/// `filename` and `declared_content_type` come from the client and are only
/// ever logged; acceptance is decided from `data` alone.
#[derive(Clone, Debug)]
pub struct FilePayload {
    pub filename: String,
    pub declared_content_type: Option<String>,
    pub data: Vec<u8>,
}

impl FilePayload {
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            declared_content_type: None,
            data,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.declared_content_type = Some(content_type.into());
        self
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}
