//! Document input and processing result definitions.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::DocumentChunk;
use crate::error::{ErrorKind, PipelineError};

/// MIME type for plain text documents.
pub const TEXT_PLAIN: &str = "text/plain";

/// MIME type for PDF documents.
pub const APPLICATION_PDF: &str = "application/pdf";

/// The content types the pipeline knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    /// Raw text, decoded directly
    PlainText,
    /// PDF, routed through a text extractor
    Pdf,
}

impl ContentType {
    /// Match a declared MIME type, ignoring case and parameters such as
    /// `; charset=utf-8`.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        if essence.eq_ignore_ascii_case(TEXT_PLAIN) {
            Some(ContentType::PlainText)
        } else if essence.eq_ignore_ascii_case(APPLICATION_PDF) {
            Some(ContentType::Pdf)
        } else {
            None
        }
    }

    /// Canonical MIME type.
    pub fn mime(&self) -> &'static str {
        match self {
            ContentType::PlainText => TEXT_PLAIN,
            ContentType::Pdf => APPLICATION_PDF,
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mime())
    }
}

/// An uploaded document.
#[derive(Debug, Clone)]
pub struct Document {
    /// Original file name, if the upload carried one
    pub name: Option<String>,

    /// Declared MIME type
    pub content_type: String,

    /// Raw document bytes
    pub content: Vec<u8>,
}

impl Document {
    /// Create a document from raw bytes and a declared MIME type.
    pub fn new(content_type: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: None,
            content_type: content_type.into(),
            content: content.into(),
        }
    }

    /// Create a plain text document.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(TEXT_PLAIN, text.into().into_bytes())
    }

    /// Create a PDF document.
    pub fn pdf(content: impl Into<Vec<u8>>) -> Self {
        Self::new(APPLICATION_PDF, content)
    }

    /// Set the file name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Original size in bytes.
    pub fn size(&self) -> usize {
        self.content.len()
    }
}

/// Outcome of a single `process_document` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingResult {
    /// Whether the document was accepted and chunked
    pub success: bool,

    /// Human-readable outcome
    pub message: String,

    /// Identifier carried by this document's progress events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<Uuid>,

    /// Produced chunks (success only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunks: Option<Vec<DocumentChunk>>,

    /// Failure detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Failure classification
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

impl ProcessingResult {
    /// Create a successful result.
    pub fn success(
        message: impl Into<String>,
        document_id: Uuid,
        chunks: Vec<DocumentChunk>,
    ) -> Self {
        Self {
            success: true,
            message: message.into(),
            document_id: Some(document_id),
            chunks: Some(chunks),
            error: None,
            kind: None,
        }
    }

    /// Create a failure result from an error.
    pub fn failure(error: &PipelineError) -> Self {
        Self {
            success: false,
            message: error.summary().to_string(),
            document_id: None,
            chunks: None,
            error: Some(error.to_string()),
            kind: Some(error.kind()),
        }
    }

    /// Number of chunks produced, zero on failure.
    pub fn chunk_count(&self) -> usize {
        self.chunks.as_ref().map_or(0, Vec::len)
    }
}
