//! Base trait for all chunkers.

use crate::types::DocumentChunk;

/// The core trait that all chunkers must implement.
///
/// A chunker takes extracted document text and splits it into ordered chunks
/// whose `index` and `total` are finalized before returning.
pub trait Chunker: Send + Sync {
    /// Get the name of this chunker.
    fn name(&self) -> &'static str;

    /// Chunk the given text, targeting at most `max_tokens` per chunk.
    ///
    /// The bound is a soft target: implementations may emit a larger chunk
    /// rather than break an indivisible unit.
    fn chunk(&self, text: &str, max_tokens: usize) -> Vec<DocumentChunk>;

    /// Get the description of this chunker.
    fn description(&self) -> &'static str {
        "A text chunker"
    }
}
