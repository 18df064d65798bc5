//! Progress reporting for queue drains.
//!
//! Every processed chunk produces one [`ProgressEvent`]. Events go to the
//! registered observers in registration order and then to a broadcast channel
//! that any number of subscribers can read from.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info};
use uuid::Uuid;

use crate::DEFAULT_PROGRESS_CHANNEL_CAPACITY;

/// Progress after one chunk of a document has been processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    /// Document the chunk belongs to
    pub document_id: Uuid,

    /// Percentage of the document processed, 0..=100
    pub progress: f64,

    /// One-based position of the chunk just processed
    pub current_chunk: usize,

    /// Number of chunks in the document
    pub total_chunks: usize,

    /// Tokens in the chunk just processed
    pub tokens: usize,

    /// When the chunk finished processing
    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    /// Whether this event reports the final chunk of its document.
    pub fn is_complete(&self) -> bool {
        self.current_chunk == self.total_chunks
    }
}

/// Receives progress events as chunks are processed.
pub trait ProgressObserver: Send + Sync {
    /// Handle one event. An error marks the chunk as failed; the drain goes on.
    fn on_progress(&self, event: &ProgressEvent) -> anyhow::Result<()>;
}

impl<F> ProgressObserver for F
where
    F: Fn(&ProgressEvent) -> anyhow::Result<()> + Send + Sync,
{
    fn on_progress(&self, event: &ProgressEvent) -> anyhow::Result<()> {
        self(event)
    }
}

/// Observer that writes every event to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl ProgressObserver for LoggingObserver {
    fn on_progress(&self, event: &ProgressEvent) -> anyhow::Result<()> {
        info!(
            document_id = %event.document_id,
            chunk = event.current_chunk,
            total = event.total_chunks,
            tokens = event.tokens,
            progress = event.progress,
            "Document processing progress"
        );
        Ok(())
    }
}

/// Fans progress events out to observers and channel subscribers.
pub struct ProgressReporter {
    observers: RwLock<Vec<Arc<dyn ProgressObserver>>>,
    sender: broadcast::Sender<ProgressEvent>,
}

impl ProgressReporter {
    /// Create a reporter whose channel buffers `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            observers: RwLock::new(Vec::new()),
            sender,
        }
    }

    /// Register an observer.
    pub fn add_observer(&self, observer: Arc<dyn ProgressObserver>) {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Subscribe to the event channel.
    ///
    /// Only events emitted after subscribing are received.
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.sender.subscribe()
    }

    /// Deliver an event to every observer and subscriber.
    ///
    /// All observers are called even if one fails; the collected failures are
    /// returned.
    pub fn emit(&self, event: &ProgressEvent) -> Vec<anyhow::Error> {
        let observers = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let failures: Vec<anyhow::Error> = observers
            .iter()
            .filter_map(|observer| observer.on_progress(event).err())
            .collect();

        // No subscribers is not a failure.
        if self.sender.send(event.clone()).is_err() {
            debug!(document_id = %event.document_id, "No progress subscribers");
        }

        failures
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRESS_CHANNEL_CAPACITY)
    }
}
