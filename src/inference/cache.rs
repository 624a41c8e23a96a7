//! Run-scoped memoization of service answers.
//!
//! A cache is passed into each run explicitly; there is no process-wide
//! state. Keys are SHA-256 signatures of the task and prompt, so identical
//! chunks within a run are only sent once.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use sha2::{Digest, Sha256};

use super::{LabelRequest, LabelResponse};

/// Storage for service answers, keyed by [`request_signature`].
pub trait LabelCache: Send + Sync {
    /// Returns the cached answer for `key`.
    fn get(&self, key: &str) -> Option<LabelResponse>;

    /// Stores an answer.
    fn insert(&self, key: String, response: LabelResponse);
}

/// Computes the cache key of a request.
///
/// ```
/// use chatlens::inference::{LabelRequest, LabelTask, request_signature};
///
/// let a = request_signature(&LabelRequest::text(LabelTask::Sentiment, "hi"));
/// let b = request_signature(&LabelRequest::text(LabelTask::Personality, "hi"));
/// assert_eq!(a.len(), 64);
/// assert_ne!(a, b);
/// ```
pub fn request_signature(request: &LabelRequest) -> String {
    let mut hasher = Sha256::new();
    hasher.update(request.task.as_str().as_bytes());
    hasher.update([0u8]);
    hasher.update(request.prompt.as_bytes());
    if let Some(schema) = &request.schema {
        hasher.update([0u8]);
        hasher.update(schema.name.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// In-memory cache living as long as one analysis run.
#[derive(Debug, Default)]
pub struct MemoryLabelCache {
    entries: Mutex<HashMap<String, LabelResponse>>,
}

impl MemoryLabelCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached answers.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LabelCache for MemoryLabelCache {
    fn get(&self, key: &str) -> Option<LabelResponse> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn insert(&self, key: String, response: LabelResponse) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, response);
    }
}

/// A cache that stores nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

impl LabelCache for NoCache {
    fn get(&self, _key: &str) -> Option<LabelResponse> {
        None
    }

    fn insert(&self, _key: String, _response: LabelResponse) {}
}
