//! docqueue Library
//!
//! Splits uploaded documents into sentence-aligned chunks and drains them
//! through a single-flight queue, reporting progress after every chunk.

pub mod api;
pub mod chunkers;
pub mod error;
pub mod extraction;
pub mod pipeline;
pub mod progress;
pub mod queue;
pub mod tokenizer;
pub mod types;

pub use chunkers::{Chunker, SentenceChunker};
pub use error::{ErrorKind, PipelineError};
pub use pipeline::Pipeline;
pub use progress::{ProgressEvent, ProgressObserver, ProgressReporter};
pub use queue::ProcessingQueue;
pub use tokenizer::{count_tokens, tokenize};
pub use types::{Document, DocumentChunk, PipelineConfig, ProcessingResult};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::chunkers::*;
    pub use crate::error::{ErrorKind, PipelineError};
    pub use crate::pipeline::Pipeline;
    pub use crate::progress::*;
    pub use crate::tokenizer::*;
    pub use crate::types::*;
}

/// Default soft token target per chunk
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Default downstream context window in tokens
pub const DEFAULT_MAX_TOKENS: usize = 2048;

/// Default pause between drained chunks (ms)
pub const DEFAULT_YIELD_INTERVAL_MS: u64 = 50;

/// Default progress events buffered per subscriber
pub const DEFAULT_PROGRESS_CHANNEL_CAPACITY: usize = 256;

/// Maximum document size accepted (10MB)
pub const DEFAULT_MAX_CONTENT_SIZE: usize = 10 * 1024 * 1024;
