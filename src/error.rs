//! Error types for document processing.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while ingesting, chunking or draining a document.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// No document was supplied.
    #[error("File is required")]
    InvalidInput,

    /// Document exceeds the configured size limit.
    #[error("Document is {size} bytes, the limit is {limit} bytes")]
    DocumentTooLarge { size: usize, limit: usize },

    /// Declared MIME type is not one the pipeline understands.
    #[error("File type {0} is not supported. Please use PDF or TXT files.")]
    UnsupportedType(String),

    /// Text could not be extracted from the document body.
    #[error("{context}: {detail}")]
    ExtractionFailure { context: &'static str, detail: String },

    /// A single chunk failed while the queue was draining.
    #[error("Chunk {index} failed: {reason}")]
    ChunkProcessing { index: usize, reason: String },

    /// A drain is active and the pipeline rejects overlapping submissions.
    #[error("Document {0} is still being processed")]
    Busy(uuid::Uuid),

    /// Invalid pipeline configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse classification of a [`PipelineError`], carried in results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    UnsupportedType,
    ExtractionFailure,
    ChunkProcessing,
    Busy,
    Config,
}

impl PipelineError {
    /// Build an extraction failure from any displayable error.
    pub fn extraction(context: &'static str, err: impl std::fmt::Display) -> Self {
        PipelineError::ExtractionFailure {
            context,
            detail: err.to_string(),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::InvalidInput | PipelineError::DocumentTooLarge { .. } => {
                ErrorKind::InvalidInput
            }
            PipelineError::UnsupportedType(_) => ErrorKind::UnsupportedType,
            PipelineError::ExtractionFailure { .. } => ErrorKind::ExtractionFailure,
            PipelineError::ChunkProcessing { .. } => ErrorKind::ChunkProcessing,
            PipelineError::Busy(_) => ErrorKind::Busy,
            PipelineError::Config(_) => ErrorKind::Config,
        }
    }

    /// Short human-readable summary used as the result message.
    pub fn summary(&self) -> &'static str {
        match self {
            PipelineError::InvalidInput => "No file provided",
            PipelineError::DocumentTooLarge { .. } => "File too large",
            PipelineError::UnsupportedType(_) => "Unsupported file type",
            PipelineError::ExtractionFailure { context, .. } => context,
            PipelineError::ChunkProcessing { .. } => "Chunk processing error",
            PipelineError::Busy(_) => "Document processing already in progress",
            PipelineError::Config(_) => "Pipeline misconfigured",
        }
    }

    /// Whether the error ends the call that produced it.
    ///
    /// Chunk failures are contained inside the drain loop.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PipelineError::ChunkProcessing { .. })
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
