//! Pipeline configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::tokenizer::TokenCounterKind;
use crate::{
    DEFAULT_CHUNK_SIZE, DEFAULT_MAX_CONTENT_SIZE, DEFAULT_MAX_TOKENS,
    DEFAULT_PROGRESS_CHANNEL_CAPACITY, DEFAULT_YIELD_INTERVAL_MS,
};

/// What happens when a document arrives while a drain is still running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// Replace the queued chunks; the running drain moves on to the new batch
    #[default]
    Replace,
    /// Refuse the new document until the drain finishes
    Reject,
}

impl OverlapPolicy {
    /// Parse a policy name as it appears in configuration.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "replace" => Some(OverlapPolicy::Replace),
            "reject" => Some(OverlapPolicy::Reject),
            _ => None,
        }
    }
}

/// Per-pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Soft token target per chunk
    pub chunk_size: usize,

    /// Context window downstream consumers accept; larger chunks are flagged
    pub max_tokens: usize,

    /// Pause between drained chunks, in milliseconds
    pub yield_interval_ms: u64,

    /// Largest document accepted, in bytes
    pub max_document_bytes: usize,

    /// Counter used to size chunks
    pub token_counter: TokenCounterKind,

    /// Behavior for submissions during an active drain
    pub overlap_policy: OverlapPolicy,

    /// Buffered progress events per subscriber
    pub progress_channel_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_tokens: DEFAULT_MAX_TOKENS,
            yield_interval_ms: DEFAULT_YIELD_INTERVAL_MS,
            max_document_bytes: DEFAULT_MAX_CONTENT_SIZE,
            token_counter: TokenCounterKind::default(),
            overlap_policy: OverlapPolicy::default(),
            progress_channel_capacity: DEFAULT_PROGRESS_CHANNEL_CAPACITY,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            chunk_size: std::env::var("CHUNK_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_CHUNK_SIZE),
            max_tokens: std::env::var("MAX_TOKENS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_TOKENS),
            yield_interval_ms: std::env::var("YIELD_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_YIELD_INTERVAL_MS),
            max_document_bytes: std::env::var("MAX_DOCUMENT_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_CONTENT_SIZE),
            token_counter: std::env::var("TOKEN_COUNTER")
                .ok()
                .and_then(|s| TokenCounterKind::parse(&s))
                .unwrap_or_default(),
            overlap_policy: std::env::var("OVERLAP_POLICY")
                .ok()
                .and_then(|s| OverlapPolicy::parse(&s))
                .unwrap_or_default(),
            progress_channel_capacity: std::env::var("PROGRESS_CHANNEL_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or(DEFAULT_PROGRESS_CHANNEL_CAPACITY),
        }
    }

    /// Set the chunk size.
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    /// Set the downstream context window.
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the pause between drained chunks.
    pub fn with_yield_interval(mut self, interval: Duration) -> Self {
        self.yield_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Set the document size limit.
    pub fn with_max_document_bytes(mut self, limit: usize) -> Self {
        self.max_document_bytes = limit;
        self
    }

    /// Set the overlap policy.
    pub fn with_overlap_policy(mut self, policy: OverlapPolicy) -> Self {
        self.overlap_policy = policy;
        self
    }

    /// Set the token counter.
    pub fn with_token_counter(mut self, counter: TokenCounterKind) -> Self {
        self.token_counter = counter;
        self
    }

    /// Pause between drained chunks.
    pub fn yield_interval(&self) -> Duration {
        Duration::from_millis(self.yield_interval_ms)
    }
}
