//! Text extraction for uploaded documents.
//!
//! This module provides:
//! - The `TextExtractor` seam for binary formats, with a PDF implementation
//! - Plain text decoding (UTF-8, UTF-16 with BOM, lossy UTF-8 or Latin-1 fallback)
//! - Dispatch from a declared content type to the right path

mod pdf;
mod text_decoder;

use anyhow::Result;
use async_trait::async_trait;

pub use pdf::PdfExtractor;
pub use text_decoder::{DecodedText, TextDecoder};

use text_decoder::unix_newlines;

use crate::error::PipelineError;
use crate::types::ContentType;

/// Extracts text from a binary document format.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Get the name of this extractor.
    fn name(&self) -> &'static str;

    /// Extract the document's text, pages concatenated in order.
    async fn extract(&self, content: &[u8]) -> Result<String>;
}

/// Read the text of a document according to its content type.
pub async fn extract_text(
    content_type: ContentType,
    content: &[u8],
    decoder: &TextDecoder,
    pdf: &dyn TextExtractor,
) -> Result<String, PipelineError> {
    match content_type {
        ContentType::PlainText => decoder.decode(content).map(|decoded| decoded.text),
        ContentType::Pdf => pdf
            .extract(content)
            .await
            .map(|text| unix_newlines(&text))
            .map_err(|e| PipelineError::extraction("Failed to process PDF", e)),
    }
}
