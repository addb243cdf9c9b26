//! Durable storage port for wishlist snapshots.
//!
//! DESIGN
//! ======
//! The store only ever reads, writes, or deletes one snapshot per key, so
//! the port is three typed operations instead of a generic key/value API.
//! Adapters own the encoding and report every failure as `StorageError`;
//! the store decides how to degrade.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use super::snapshot::WishlistSnapshot;

/// Failures reported by a snapshot storage adapter.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The medium cannot be reached at all (disabled, no window, no disk).
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The medium refused the write (quota exceeded, read-only).
    #[error("storage write rejected: {0}")]
    Rejected(String),

    /// The key cannot be represented on this medium.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    #[error("storage io failed: {0}")]
    Io(#[from] std::io::Error),

    /// The stored payload is not a valid snapshot, or a snapshot failed to serialize.
    #[error("snapshot encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Narrow persistence port the wishlist store writes through.
pub trait SnapshotStorage: Send + Sync {
    /// Read the snapshot under `key`. `Ok(None)` when nothing is stored.
    fn read_snapshot(&self, key: &str) -> Result<Option<WishlistSnapshot>, StorageError>;

    /// Replace the snapshot under `key`.
    fn write_snapshot(&self, key: &str, snapshot: &WishlistSnapshot) -> Result<(), StorageError>;

    /// Remove the snapshot under `key`. Succeeds when nothing is stored.
    fn delete_snapshot(&self, key: &str) -> Result<(), StorageError>;
}

/// In-process storage holding encoded snapshots.
///
/// Keeps the raw JSON rather than the typed value so it behaves like a real
/// medium: corrupt payloads are only detected on read. The fault-injection
/// hooks are compiled for tests and under the `test-util` feature.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
    unavailable: AtomicBool,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an arbitrary payload under `key`, bypassing encoding.
    #[cfg(any(test, feature = "test-util"))]
    pub fn insert_raw(&self, key: &str, raw: impl Into<String>) {
        self.entries().insert(key.to_owned(), raw.into());
    }

    /// The payload currently stored under `key`.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    /// Make every subsequent operation fail as if the medium were disabled.
    #[cfg(any(test, feature = "test-util"))]
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("memory storage disabled".into()));
        }
        Ok(())
    }
}

impl SnapshotStorage for MemoryStorage {
    fn read_snapshot(&self, key: &str) -> Result<Option<WishlistSnapshot>, StorageError> {
        self.check_available()?;
        let Some(raw) = self.raw(key) else {
            return Ok(None);
        };
        Ok(Some(WishlistSnapshot::decode(&raw)?))
    }

    fn write_snapshot(&self, key: &str, snapshot: &WishlistSnapshot) -> Result<(), StorageError> {
        self.check_available()?;
        let raw = snapshot.encode()?;
        self.entries().insert(key.to_owned(), raw);
        Ok(())
    }

    fn delete_snapshot(&self, key: &str) -> Result<(), StorageError> {
        self.check_available()?;
        self.entries().remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;
