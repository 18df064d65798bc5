//! PDF text extraction backed by `pdf-extract`.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tracing::debug;

use super::TextExtractor;

/// Extracts the text layer of a PDF.
///
/// Parsing is CPU-bound and runs on the blocking pool.
#[derive(Debug, Clone, Default)]
pub struct PdfExtractor;

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextExtractor for PdfExtractor {
    fn name(&self) -> &'static str {
        "pdf-extract"
    }

    async fn extract(&self, content: &[u8]) -> Result<String> {
        let bytes = content.to_vec();
        let size = bytes.len();

        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
            .await?
            .map_err(|e| anyhow!("{e:?}"))?;

        debug!(bytes = size, chars = text.len(), "Extracted PDF text");
        Ok(text)
    }
}
