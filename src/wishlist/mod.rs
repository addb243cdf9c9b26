//! Session wishlist with expiring durable persistence.
//!
//! DESIGN
//! ======
//! `WishlistStore` is a cloneable handle over one shared in-memory set of
//! product identifiers. Every membership change is broadcast to subscribers
//! and written through the narrow `SnapshotStorage` port, so the durable
//! medium (memory, files, browser `localStorage`) can be swapped without
//! touching store logic.

pub mod clock;
pub mod file_storage;
#[cfg(feature = "web")]
pub mod local_storage;
pub mod snapshot;
pub mod storage;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use file_storage::FileStorage;
#[cfg(feature = "web")]
pub use local_storage::LocalStorage;
pub use snapshot::{DEFAULT_EXPIRY_WINDOW, WishlistSnapshot, storage_key};
pub use storage::{MemoryStorage, SnapshotStorage, StorageError};
pub use store::{Hydration, Phase, StoreSettings, Subscription, WishlistError, WishlistState, WishlistStore};
