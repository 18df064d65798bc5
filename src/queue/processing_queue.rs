//! FIFO of chunks awaiting processing, guarded by a single-flight drain flag.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::sync::Notify;
use uuid::Uuid;

use crate::types::DocumentChunk;

/// Chunks of the current document plus the generation that put them there.
#[derive(Debug, Default)]
struct QueueState {
    chunks: VecDeque<DocumentChunk>,
    generation: u64,
    document_id: Option<Uuid>,
}

/// The chunk at the front of the queue, observed at a given generation.
#[derive(Debug, Clone)]
pub struct Head {
    pub generation: u64,
    pub document_id: Uuid,
    pub chunk: DocumentChunk,
}

/// What a submission replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Generation assigned to the new contents
    pub generation: u64,
    /// Document whose unprocessed chunks were dropped, if any
    pub superseded: Option<Uuid>,
    /// Number of chunks dropped
    pub discarded: usize,
}

/// Point-in-time view of the queue.
#[derive(Debug, Clone, Serialize)]
pub struct QueueStatus {
    pub progress: f64,
    pub remaining: usize,
    pub draining: bool,
    pub generation: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<Uuid>,
}

/// Sequential work queue with at most one active drain.
///
/// Contents are replaced wholesale on every submission. Each replacement bumps
/// the generation so a drain can tell whether the head it peeked is still the
/// head it should remove.
#[derive(Debug, Default)]
pub struct ProcessingQueue {
    state: Mutex<QueueState>,
    active: AtomicBool,
    idle: Notify,
}

impl ProcessingQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the queue contents with a new document's chunks.
    pub fn submit(&self, document_id: Uuid, chunks: Vec<DocumentChunk>) -> Submission {
        let mut state = self.lock();
        let discarded = state.chunks.len();
        let superseded = state.document_id.filter(|_| discarded > 0);

        state.generation += 1;
        state.chunks = chunks.into();
        state.document_id = Some(document_id);

        Submission {
            generation: state.generation,
            superseded,
            discarded,
        }
    }

    /// Replace the queue contents only if no drain is active and nothing is
    /// left to process.
    ///
    /// The check and the replacement happen under one lock, so of two racing
    /// submissions at most one is accepted. On refusal the owner of the
    /// current contents is returned and the queue is unchanged.
    pub fn submit_if_idle(
        &self,
        document_id: Uuid,
        chunks: Vec<DocumentChunk>,
    ) -> Result<Submission, Uuid> {
        let mut state = self.lock();
        if self.is_draining() || !state.chunks.is_empty() {
            return Err(state.document_id.unwrap_or_default());
        }

        state.generation += 1;
        state.chunks = chunks.into();
        state.document_id = Some(document_id);

        Ok(Submission {
            generation: state.generation,
            superseded: None,
            discarded: 0,
        })
    }

    /// Look at the front chunk without removing it.
    pub fn peek(&self) -> Option<Head> {
        let state = self.lock();
        let chunk = state.chunks.front()?.clone();
        Some(Head {
            generation: state.generation,
            document_id: state.document_id.unwrap_or_default(),
            chunk,
        })
    }

    /// Remove the front chunk if the queue still holds the generation it was
    /// peeked at.
    pub fn complete(&self, generation: u64) -> bool {
        let mut state = self.lock();
        if state.generation != generation {
            return false;
        }
        state.chunks.pop_front().is_some()
    }

    /// Number of chunks waiting, including one being processed.
    pub fn len(&self) -> usize {
        self.lock().chunks.len()
    }

    /// Check if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.lock().chunks.is_empty()
    }

    /// Current generation; zero before the first submission.
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Document that owns the current contents.
    pub fn document_id(&self) -> Option<Uuid> {
        self.lock().document_id
    }

    /// Percentage of the current document already processed.
    ///
    /// Measured from the remaining length against the head chunk's batch total;
    /// an empty queue reports 100.
    pub fn progress(&self) -> f64 {
        progress_of(&self.lock())
    }

    /// Snapshot of the queue.
    pub fn status(&self) -> QueueStatus {
        let state = self.lock();
        QueueStatus {
            progress: progress_of(&state),
            remaining: state.chunks.len(),
            draining: self.is_draining(),
            generation: state.generation,
            document_id: state.document_id,
        }
    }

    /// Whether a drain is currently active.
    pub fn is_draining(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Claim the drain slot. Returns `None` if a drain is already active.
    pub fn try_begin_drain(self: &Arc<Self>) -> Option<DrainGuard> {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| DrainGuard {
                queue: Arc::clone(self),
            })
    }

    /// Wait until no drain is active.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if !self.is_draining() {
                return;
            }
            notified.await;
        }
    }
}

fn progress_of(state: &QueueState) -> f64 {
    let Some(head) = state.chunks.front() else {
        return 100.0;
    };
    match head.total {
        Some(total) if total > 0 => {
            let done = total.saturating_sub(state.chunks.len());
            (done as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
        }
        _ => 0.0,
    }
}

/// Holds the drain slot; releasing it, including on unwind, marks the queue idle.
#[derive(Debug)]
pub struct DrainGuard {
    queue: Arc<ProcessingQueue>,
}

impl Drop for DrainGuard {
    fn drop(&mut self) {
        self.queue.active.store(false, Ordering::Release);
        self.queue.idle.notify_waiters();
    }
}
