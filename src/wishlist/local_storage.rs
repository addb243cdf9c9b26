//! Browser `window.localStorage` snapshot adapter.
//!
//! SYSTEM CONTEXT
//! ==============
//! This is the medium the rental site itself uses. Every call re-resolves
//! the storage object so private-mode or disabled storage is reported per
//! operation instead of at construction.

use super::snapshot::WishlistSnapshot;
use super::storage::{SnapshotStorage, StorageError};

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

fn storage() -> Result<web_sys::Storage, StorageError> {
    web_sys::window()
        .ok_or_else(|| StorageError::Unavailable("no window".into()))?
        .local_storage()
        .map_err(|e| StorageError::Unavailable(format!("{e:?}")))?
        .ok_or_else(|| StorageError::Unavailable("localStorage disabled".into()))
}

impl SnapshotStorage for LocalStorage {
    fn read_snapshot(&self, key: &str) -> Result<Option<WishlistSnapshot>, StorageError> {
        let raw = storage()?
            .get_item(key)
            .map_err(|e| StorageError::Unavailable(format!("{e:?}")))?;
        raw.map(|raw| WishlistSnapshot::decode(&raw))
            .transpose()
            .map_err(StorageError::from)
    }

    fn write_snapshot(&self, key: &str, snapshot: &WishlistSnapshot) -> Result<(), StorageError> {
        let raw = snapshot.encode()?;
        // QuotaExceededError is the only failure `setItem` raises.
        storage()?
            .set_item(key, &raw)
            .map_err(|e| StorageError::Rejected(format!("{e:?}")))
    }

    fn delete_snapshot(&self, key: &str) -> Result<(), StorageError> {
        storage()?
            .remove_item(key)
            .map_err(|e| StorageError::Unavailable(format!("{e:?}")))
    }
}
