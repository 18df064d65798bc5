//! Core types for document processing.

mod chunk;
mod config;
mod document;

pub use chunk::{finalize_totals, DocumentChunk};
pub use config::{OverlapPolicy, PipelineConfig};
pub use document::{ContentType, Document, ProcessingResult, APPLICATION_PDF, TEXT_PLAIN};
