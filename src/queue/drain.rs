//! Drain loop that processes queued chunks one at a time.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::processing_queue::{DrainGuard, Head, ProcessingQueue};
use crate::error::{PipelineError, Result};
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::tokenizer::tokenize;

/// Tokenize a chunk, compute its progress and report it.
pub fn process_chunk(head: &Head, reporter: &ProgressReporter) -> Result<ProgressEvent> {
    let chunk = &head.chunk;
    let failed = |reason: String| PipelineError::ChunkProcessing {
        index: chunk.index,
        reason,
    };

    let total = chunk
        .total
        .ok_or_else(|| failed("batch total was never finalized".to_string()))?;
    let progress = chunk
        .progress()
        .ok_or_else(|| failed(format!("index is outside a batch of {total}")))?;

    let tokens = tokenize(&chunk.text);
    let event = ProgressEvent {
        document_id: head.document_id,
        progress,
        current_chunk: chunk.index + 1,
        total_chunks: total,
        tokens: tokens.len(),
        timestamp: Utc::now(),
    };

    if let Some(err) = reporter.emit(&event).into_iter().next() {
        return Err(failed(format!("progress observer failed: {err}")));
    }

    Ok(event)
}

/// Drains a [`ProcessingQueue`] in a background task, pausing between chunks.
#[derive(Clone)]
pub struct DrainLoop {
    queue: Arc<ProcessingQueue>,
    reporter: Arc<ProgressReporter>,
    yield_interval: Duration,
}

impl DrainLoop {
    /// Create a drain loop over the given queue.
    pub fn new(
        queue: Arc<ProcessingQueue>,
        reporter: Arc<ProgressReporter>,
        yield_interval: Duration,
    ) -> Self {
        Self {
            queue,
            reporter,
            yield_interval,
        }
    }

    /// Start draining unless a drain is already active or there is nothing to do.
    ///
    /// Returns whether a new drain was started. Must be called from within a
    /// tokio runtime.
    pub fn start_if_idle(&self) -> bool {
        let Some(guard) = self.queue.try_begin_drain() else {
            debug!("Drain already active");
            return false;
        };
        if self.queue.is_empty() {
            return false;
        }

        let this = self.clone();
        tokio::spawn(async move { this.run(guard).await });
        true
    }

    async fn run(self, mut guard: DrainGuard) {
        let mut processed = 0usize;
        let mut failed = 0usize;
        let mut current: Option<Uuid> = None;

        info!(queued = self.queue.len(), "Drain started");

        loop {
            while let Some(head) = self.queue.peek() {
                if current != Some(head.document_id) {
                    if let Some(previous) = current {
                        info!(
                            previous = %previous,
                            document_id = %head.document_id,
                            "Queue was replaced, draining superseding document"
                        );
                    }
                    current = Some(head.document_id);
                }

                match process_chunk(&head, &self.reporter) {
                    Ok(_) => processed += 1,
                    Err(e) => {
                        failed += 1;
                        warn!(
                            document_id = %head.document_id,
                            error = %e,
                            "Chunk processing failed, continuing with next chunk"
                        );
                    }
                }

                if !self.queue.complete(head.generation) {
                    debug!(
                        generation = head.generation,
                        "Queue replaced while chunk was in flight"
                    );
                }

                self.pause().await;
            }

            drop(guard);

            // A submission can land between the last peek and the release.
            match self.queue.try_begin_drain() {
                Some(next) if !self.queue.is_empty() => guard = next,
                _ => break,
            }
        }

        info!(processed, failed, "Drain finished");
    }

    async fn pause(&self) {
        if self.yield_interval.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.yield_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;
    use tokio::sync::broadcast;

    use crate::types::{finalize_totals, DocumentChunk};

    const WAIT: Duration = Duration::from_secs(5);

    fn batch(n: usize) -> Vec<DocumentChunk> {
        let mut chunks: Vec<DocumentChunk> = (0..n)
            .map(|i| DocumentChunk::new(format!("Chunk number {i}."), i, 3))
            .collect();
        finalize_totals(&mut chunks);
        chunks
    }

    fn setup(interval_ms: u64) -> (Arc<ProcessingQueue>, Arc<ProgressReporter>, DrainLoop) {
        let queue = Arc::new(ProcessingQueue::new());
        let reporter = Arc::new(ProgressReporter::new(64));
        let drain = DrainLoop::new(
            Arc::clone(&queue),
            Arc::clone(&reporter),
            Duration::from_millis(interval_ms),
        );
        (queue, reporter, drain)
    }

    async fn next_event(rx: &mut broadcast::Receiver<ProgressEvent>) -> ProgressEvent {
        tokio::time::timeout(WAIT, rx.recv())
            .await
            .expect("event before timeout")
            .expect("channel open")
    }

    #[test]
    fn test_process_chunk_event() {
        let reporter = ProgressReporter::default();
        let chunk = DocumentChunk::new("Hello world. This is a test.", 1, 6).with_total(4);
        let head = Head {
            generation: 1,
            document_id: Uuid::nil(),
            chunk,
        };

        let event = process_chunk(&head, &reporter).unwrap();
        assert_eq!(event.current_chunk, 2);
        assert_eq!(event.total_chunks, 4);
        assert_eq!(event.tokens, 6);
        assert_eq!(event.progress, 50.0);
    }

    #[test]
    fn test_process_chunk_without_total_fails() {
        let reporter = ProgressReporter::default();
        let head = Head {
            generation: 1,
            document_id: Uuid::nil(),
            chunk: DocumentChunk::new("Orphan.", 0, 1),
        };

        let err = process_chunk(&head, &reporter).unwrap_err();
        assert!(!err.is_terminal());
    }

    #[tokio::test]
    async fn test_progress_is_exact_and_increasing() {
        let (queue, reporter, drain) = setup(0);
        let mut rx = reporter.subscribe();

        queue.submit(Uuid::new_v4(), batch(4));
        assert!(drain.start_if_idle());

        let mut progress = Vec::new();
        for _ in 0..4 {
            progress.push(next_event(&mut rx).await.progress);
        }
        assert_eq!(progress, vec![25.0, 50.0, 75.0, 100.0]);

        queue.wait_idle().await;
        assert!(queue.is_empty());
        assert!(!queue.is_draining());
    }

    #[tokio::test]
    async fn test_second_start_is_noop() {
        let (queue, _reporter, drain) = setup(10);
        queue.submit(Uuid::new_v4(), batch(3));

        assert!(drain.start_if_idle());
        assert!(!drain.start_if_idle());

        queue.wait_idle().await;
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_empty_queue_does_not_start() {
        let (queue, _reporter, drain) = setup(0);
        assert!(!drain.start_if_idle());
        assert!(!queue.is_draining());
    }

    #[tokio::test]
    async fn test_failed_chunk_does_not_stop_drain() {
        let (queue, reporter, drain) = setup(0);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        reporter.add_observer(Arc::new(move |e: &ProgressEvent| -> anyhow::Result<()> {
            sink.lock().unwrap().push(e.current_chunk);
            Ok(())
        }));

        let mut chunks = batch(3);
        chunks[1].total = None;
        queue.submit(Uuid::new_v4(), chunks);

        assert!(drain.start_if_idle());
        queue.wait_idle().await;

        assert_eq!(*seen.lock().unwrap(), vec![1, 3]);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_observer_failure_is_contained() {
        let (queue, reporter, drain) = setup(0);
        let mut rx = reporter.subscribe();
        reporter.add_observer(Arc::new(|e: &ProgressEvent| -> anyhow::Result<()> {
            if e.current_chunk == 1 {
                anyhow::bail!("downstream unavailable");
            }
            Ok(())
        }));

        queue.submit(Uuid::new_v4(), batch(2));
        assert!(drain.start_if_idle());

        assert_eq!(next_event(&mut rx).await.current_chunk, 1);
        assert_eq!(next_event(&mut rx).await.current_chunk, 2);
        queue.wait_idle().await;
    }

    #[tokio::test]
    async fn test_replacement_mid_drain_switches_documents() {
        let (queue, reporter, drain) = setup(20);
        let mut rx = reporter.subscribe();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        queue.submit(first, batch(5));
        assert!(drain.start_if_idle());

        let event = next_event(&mut rx).await;
        assert_eq!(event.document_id, first);

        let submission = queue.submit(second, batch(2));
        assert_eq!(submission.superseded, Some(first));
        assert!(!drain.start_if_idle());

        let mut second_chunks = Vec::new();
        loop {
            let event = next_event(&mut rx).await;
            if event.document_id == second {
                second_chunks.push(event.current_chunk);
                if event.is_complete() {
                    break;
                }
            }
        }
        assert_eq!(second_chunks, vec![1, 2]);

        queue.wait_idle().await;
        assert!(queue.is_empty());
    }
}
