//! Sentence-based chunker that respects sentence boundaries.

use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;

use super::base::Chunker;
use crate::tokenizer::{TokenCounter, WordCounter};
use crate::types::{finalize_totals, DocumentChunk};

lazy_static! {
    /// A run of non-terminal characters closed by a run of terminal punctuation.
    static ref SENTENCE: Regex = Regex::new(r"[^.!?]*[.!?]+").expect("static regex");
}

/// Split text into sentence-like units.
///
/// Each unit ends with its run of `.`, `!` or `?`. Text after the last run is
/// kept as a trailing unit, so the units concatenate back to the input.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut units = Vec::new();
    let mut end = 0;

    for m in SENTENCE.find_iter(text) {
        units.push(m.as_str());
        end = m.end();
    }

    if end < text.len() {
        units.push(&text[end..]);
    }

    units
}

/// Sentence-based chunker that greedily packs sentences into chunks.
///
/// Sentences are never split: one that is larger than the target on its own
/// becomes an oversized chunk.
pub struct SentenceChunker {
    counter: Arc<dyn TokenCounter>,
}

impl SentenceChunker {
    /// Create a sentence chunker that measures with the word tokenizer.
    pub fn new() -> Self {
        Self {
            counter: Arc::new(WordCounter),
        }
    }

    /// Create a sentence chunker with a custom token counter.
    pub fn with_counter(counter: Arc<dyn TokenCounter>) -> Self {
        Self { counter }
    }

    fn close(&self, buffer: &str, chunks: &mut Vec<DocumentChunk>) {
        let text = buffer.trim();
        if text.is_empty() {
            return;
        }
        let tokens = self.counter.count_tokens(text);
        chunks.push(DocumentChunk::new(text, chunks.len(), tokens));
    }
}

impl Default for SentenceChunker {
    fn default() -> Self {
        Self::new()
    }
}

impl Chunker for SentenceChunker {
    fn name(&self) -> &'static str {
        "sentence"
    }

    fn description(&self) -> &'static str {
        "Packs whole sentences into chunks up to a soft token limit"
    }

    fn chunk(&self, text: &str, max_tokens: usize) -> Vec<DocumentChunk> {
        let mut chunks = Vec::new();
        let mut buffer = String::new();

        for sentence in split_sentences(text) {
            let candidate_len = buffer.len() + sentence.len();
            let mut candidate = String::with_capacity(candidate_len);
            candidate.push_str(&buffer);
            candidate.push_str(sentence);

            let has_content = !buffer.trim().is_empty();
            if has_content && self.counter.count_tokens(&candidate) > max_tokens {
                self.close(&buffer, &mut chunks);
                buffer.clear();
                buffer.push_str(sentence);
            } else {
                buffer = candidate;
            }
        }

        self.close(&buffer, &mut chunks);
        finalize_totals(&mut chunks);
        chunks
    }
}
