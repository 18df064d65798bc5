//! Document pipeline: extraction, chunking and queue submission.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{info, warn};
use uuid::Uuid;

use crate::chunkers::{Chunker, SentenceChunker};
use crate::error::{PipelineError, Result};
use crate::extraction::{extract_text, PdfExtractor, TextDecoder, TextExtractor};
use crate::progress::{ProgressEvent, ProgressObserver, ProgressReporter};
use crate::queue::{DrainLoop, ProcessingQueue, QueueStatus};
use crate::types::{
    ContentType, Document, DocumentChunk, OverlapPolicy, PipelineConfig, ProcessingResult,
};

/// Entry point for document processing.
///
/// Each pipeline owns its queue, drain flag and progress channel, so several
/// pipelines can run side by side.
pub struct Pipeline {
    config: PipelineConfig,
    chunker: Arc<dyn Chunker>,
    decoder: TextDecoder,
    pdf_extractor: Arc<dyn TextExtractor>,
    queue: Arc<ProcessingQueue>,
    reporter: Arc<ProgressReporter>,
    drain: DrainLoop,
}

impl Pipeline {
    /// Create a pipeline with the sentence chunker and the PDF extractor.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let counter = config.token_counter.build()?;
        let chunker = Arc::new(SentenceChunker::with_counter(counter));
        Ok(Self::with_components(config, chunker, Arc::new(PdfExtractor::new())))
    }

    /// Create a pipeline from explicit components.
    pub fn with_components(
        config: PipelineConfig,
        chunker: Arc<dyn Chunker>,
        pdf_extractor: Arc<dyn TextExtractor>,
    ) -> Self {
        let queue = Arc::new(ProcessingQueue::new());
        let reporter = Arc::new(ProgressReporter::new(config.progress_channel_capacity));
        let drain = DrainLoop::new(
            Arc::clone(&queue),
            Arc::clone(&reporter),
            config.yield_interval(),
        );

        Self {
            config,
            chunker,
            decoder: TextDecoder::new(),
            pdf_extractor,
            queue,
            reporter,
            drain,
        }
    }

    /// Replace the PDF extractor.
    pub fn with_pdf_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.pdf_extractor = extractor;
        self
    }

    /// Process a document and queue its chunks for draining.
    ///
    /// Returns once the chunks are queued; draining continues in the background.
    /// Must be called from within a tokio runtime.
    pub async fn process_document(&self, document: Option<Document>) -> ProcessingResult {
        match self.try_process(document).await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "Document rejected");
                ProcessingResult::failure(&e)
            }
        }
    }

    async fn try_process(&self, document: Option<Document>) -> Result<ProcessingResult> {
        let document = document.ok_or(PipelineError::InvalidInput)?;

        if document.size() > self.config.max_document_bytes {
            return Err(PipelineError::DocumentTooLarge {
                size: document.size(),
                limit: self.config.max_document_bytes,
            });
        }

        let content_type = ContentType::from_mime(&document.content_type)
            .ok_or_else(|| PipelineError::UnsupportedType(document.content_type.clone()))?;

        // Early refusal only; the queue re-checks atomically at submission.
        if self.config.overlap_policy == OverlapPolicy::Reject && self.queue.is_draining() {
            return Err(PipelineError::Busy(self.queue.document_id().unwrap_or_default()));
        }

        info!(
            name = document.name.as_deref().unwrap_or("<unnamed>"),
            content_type = %content_type,
            bytes = document.size(),
            "Processing document"
        );

        let text = extract_text(
            content_type,
            &document.content,
            &self.decoder,
            self.pdf_extractor.as_ref(),
        )
        .await?;

        let chunks = self.create_chunks(&text);
        let document_id = Uuid::new_v4();
        let message = match content_type {
            ContentType::Pdf => "PDF processed successfully",
            ContentType::PlainText => "Text file processed successfully",
        };

        self.submit(document_id, chunks.clone())?;
        Ok(ProcessingResult::success(message, document_id, chunks))
    }

    /// Split text into chunks using the configured chunk size.
    pub fn create_chunks(&self, text: &str) -> Vec<DocumentChunk> {
        let chunks = self.chunker.chunk(text, self.config.chunk_size);

        for chunk in chunks.iter().filter(|c| c.token_count > self.config.max_tokens) {
            warn!(
                index = chunk.index,
                tokens = chunk.token_count,
                max_tokens = self.config.max_tokens,
                "Chunk exceeds the downstream context window"
            );
        }

        chunks
    }

    fn submit(&self, document_id: Uuid, chunks: Vec<DocumentChunk>) -> Result<()> {
        let count = chunks.len();
        let submission = match self.config.overlap_policy {
            OverlapPolicy::Replace => self.queue.submit(document_id, chunks),
            OverlapPolicy::Reject => self
                .queue
                .submit_if_idle(document_id, chunks)
                .map_err(PipelineError::Busy)?,
        };

        if let Some(previous) = submission.superseded {
            warn!(
                previous = %previous,
                document_id = %document_id,
                discarded = submission.discarded,
                "Superseded unfinished document"
            );
        }

        let started = self.drain.start_if_idle();
        info!(
            document_id = %document_id,
            chunks = count,
            generation = submission.generation,
            drain_started = started,
            "Chunks queued"
        );
        Ok(())
    }

    /// Percentage of the current document processed; 100 when idle.
    pub fn get_processing_progress(&self) -> f64 {
        self.queue.progress()
    }

    /// Snapshot of the processing queue.
    pub fn status(&self) -> QueueStatus {
        self.queue.status()
    }

    /// Whether a drain is currently active.
    pub fn is_draining(&self) -> bool {
        self.queue.is_draining()
    }

    /// Wait until the current drain finishes.
    pub async fn wait_idle(&self) {
        self.queue.wait_idle().await
    }

    /// Subscribe to progress events.
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.reporter.subscribe()
    }

    /// Register a progress observer.
    pub fn add_observer(&self, observer: Arc<dyn ProgressObserver>) {
        self.reporter.add_observer(observer);
    }

    /// Get the configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Get the chunker.
    pub fn chunker(&self) -> &dyn Chunker {
        self.chunker.as_ref()
    }
}
