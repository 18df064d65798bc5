//! Processing queue and its drain loop.

mod drain;
mod processing_queue;

pub use drain::{process_chunk, DrainLoop};
pub use processing_queue::{DrainGuard, Head, ProcessingQueue, QueueStatus, Submission};
