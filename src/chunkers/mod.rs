//! Chunking strategies.

mod base;
mod sentence_chunker;

pub use base::Chunker;
pub use sentence_chunker::{split_sentences, SentenceChunker};
