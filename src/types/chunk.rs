//! Document chunk definitions.

use serde::{Deserialize, Serialize};

/// A contiguous span of a document's text, tagged with its position.
///
/// `total` is unknown while a batch is being built and is written into every
/// chunk of the batch once the chunker has produced them all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Chunk content, trimmed of surrounding whitespace
    pub text: String,

    /// Zero-based position within the batch
    pub index: usize,

    /// Number of chunks in the batch, `None` until finalized
    pub total: Option<usize>,

    /// Tokens measured by the chunker's counter
    pub token_count: usize,
}

impl DocumentChunk {
    /// Create a chunk whose batch total is not yet known.
    pub fn new(text: impl Into<String>, index: usize, token_count: usize) -> Self {
        Self {
            text: text.into(),
            index,
            total: None,
            token_count,
        }
    }

    /// Set the batch total.
    pub fn with_total(mut self, total: usize) -> Self {
        self.total = Some(total);
        self
    }

    /// Progress after this chunk, as a percentage of its batch.
    ///
    /// Returns `None` when the total is unknown or the index is outside it.
    pub fn progress(&self) -> Option<f64> {
        match self.total {
            Some(total) if self.index < total => {
                Some((self.index + 1) as f64 / total as f64 * 100.0)
            }
            _ => None,
        }
    }

    /// Whether this is the last chunk of its batch.
    pub fn is_last(&self) -> bool {
        self.total.map_or(false, |total| self.index + 1 == total)
    }

    /// Get the length of the chunk text in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Check if the chunk is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Write the final batch size into every chunk.
pub fn finalize_totals(chunks: &mut [DocumentChunk]) {
    let total = chunks.len();
    for chunk in chunks.iter_mut() {
        chunk.total = Some(total);
    }
}
