//! Advisory bookkeeping for inferred grammars and unparsable documents.
//!
//! Records are write-once blobs keyed by content hash. Nothing here is on
//! the critical path: a failing store produces a warning and the parse
//! result is returned unchanged.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::Result;

/// Durable write-once blob storage.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Returns true if a blob is stored under `key`.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Stores a blob. Callers check [`exists`](Self::exists) first.
    async fn put(&self, key: &str, body: Vec<u8>) -> Result<()>;
}

/// Content hash identifying a document.
///
/// ```
/// use chatlens::audit::document_id;
///
/// assert_eq!(document_id("abc"), document_id("abc"));
/// assert_eq!(document_id("").len(), 64);
/// ```
pub fn document_id(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

/// A grammar inferred for a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternRecord {
    /// Document the grammar was inferred for
    pub document_id: String,
    /// Regex source returned by the service
    pub pattern: String,
    /// Sample the service saw
    pub sample: String,
    /// When the record was written
    pub recorded_at: DateTime<Utc>,
}

/// A document that could not be parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnparsableRecord {
    /// Document id
    pub document_id: String,
    /// Why parsing failed
    pub reason: String,
    /// When the record was written
    pub recorded_at: DateTime<Utc>,
}

/// Stores `body` under `key` unless something is already there.
///
/// Returns `Ok(true)` if the blob was written.
pub async fn write_once(store: &dyn AuditStore, key: &str, body: Vec<u8>) -> Result<bool> {
    if store.exists(key).await? {
        debug!(key, "audit record already present");
        return Ok(false);
    }
    store.put(key, body).await?;
    Ok(true)
}

/// Records an inferred grammar. Failures are logged, never returned.
pub async fn record_pattern(store: &dyn AuditStore, record: &PatternRecord) -> bool {
    let key = format!("patterns/{}.json", record.document_id);
    write_record(store, &key, record).await
}

/// Flags a document as unparsable. Failures are logged, never returned.
pub async fn mark_unparsable(store: &dyn AuditStore, record: &UnparsableRecord) -> bool {
    let key = format!("unparsable/{}.json", record.document_id);
    write_record(store, &key, record).await
}

async fn write_record<T: Serialize + Sync>(store: &dyn AuditStore, key: &str, record: &T) -> bool {
    let body = match serde_json::to_vec_pretty(record) {
        Ok(body) => body,
        Err(err) => {
            warn!(key, error = %err, "could not serialize audit record");
            return false;
        }
    };
    match write_once(store, key, body).await {
        Ok(written) => written,
        Err(err) => {
            warn!(key, error = %err, "audit write failed");
            false
        }
    }
}

/// Audit store kept in memory.
#[derive(Debug, Default)]
pub struct MemoryAuditStore {
    blobs: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryAuditStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the blob stored under `key`.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.blobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Returns all keys in order.
    pub fn keys(&self) -> Vec<String> {
        self.blobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self
            .blobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key))
    }

    async fn put(&self, key: &str, body: Vec<u8>) -> Result<()> {
        self.blobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), body);
        Ok(())
    }
}

/// Audit store writing one file per key below a directory.
#[derive(Debug, Clone)]
pub struct DirAuditStore {
    root: PathBuf,
}

impl DirAuditStore {
    /// Creates a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl AuditStore for DirAuditStore {
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(tokio::fs::try_exists(self.path_for(key)).await?)
    }

    async fn put(&self, key: &str, body: Vec<u8>) -> Result<()> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, body).await?;
        Ok(())
    }
}
