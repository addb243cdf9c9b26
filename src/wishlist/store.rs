//! Session wishlist store.
//!
//! DESIGN
//! ======
//! `WishlistStore` is a cheap cloneable handle; every clone sees the same
//! in-memory set, observer list, and durable snapshot. The host constructs
//! one store per session and hands clones to each UI surface instead of
//! reaching for a global.
//!
//! A mutation updates the set under the lock, writes (or for `clear`,
//! deletes) the durable snapshot, then notifies observers after the lock is
//! released so an observer may read the store from its callback. Storage
//! failures are logged and swallowed; the in-memory set stays authoritative
//! for the rest of the session.
//!
//! LIFECYCLE
//! =========
//! `Uninitialized -> Hydrating -> Ready`. The first mutation on an
//! uninitialized store hydrates it. Mutations issued while `Hydrating` show
//! up in the provisional set at once, are queued as plain adds and removes,
//! and are replayed in order on top of the hydrated set, so a click that
//! lands before storage has been read is neither lost nor allowed to
//! overwrite the previous session's snapshot. `clear` deletes the snapshot
//! immediately in every phase. Expiry is checked only during hydration; an
//! open session never expires its own set.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::clock::{Clock, SystemClock};
use super::snapshot::{DEFAULT_EXPIRY_WINDOW, WishlistSnapshot, storage_key};
use super::storage::{SnapshotStorage, StorageError};

/// Callback invoked with the ordered identifiers after each change.
pub type Observer = Arc<dyn Fn(&[String]) + Send + Sync>;

// =============================================================================
// ERRORS
// =============================================================================

/// Conditions the store recovers from locally. They are logged, never
/// returned to callers of the public operations.
#[derive(Debug, thiserror::Error)]
pub enum WishlistError {
    /// The previous session's snapshot could not be read.
    #[error("wishlist hydration failed: {0}")]
    Hydration(#[source] StorageError),

    /// A snapshot write or delete failed.
    #[error("wishlist persistence failed: {0}")]
    Persistence(#[source] StorageError),

    /// A caller passed an empty or blank product identifier.
    #[error("invalid product identifier {0:?}")]
    InvalidIdentifier(String),
}

// =============================================================================
// STATE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Hydrating,
    Ready,
}

/// What hydration found in durable storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hydration {
    /// A fresh snapshot was loaded.
    Restored,
    /// A snapshot existed but was past the expiry window and was deleted.
    Expired,
    /// Nothing was stored.
    Absent,
    /// The snapshot or the medium could not be read.
    Unreadable,
}

/// Point-in-time view of the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WishlistState {
    pub phase: Phase,
    pub items: Vec<String>,
    /// Set once the store reaches `Ready`.
    pub hydration: Option<Hydration>,
}

impl WishlistState {
    /// Consumers rendering before this is true must treat `items` as
    /// provisionally empty.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.phase == Phase::Ready
    }
}

/// Storage key and expiry policy for one store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    pub storage_key: String,
    pub expiry_window: Duration,
}

impl StoreSettings {
    #[must_use]
    pub fn for_namespace(namespace: &str) -> Self {
        Self { storage_key: storage_key(namespace), expiry_window: DEFAULT_EXPIRY_WINDOW }
    }

    #[must_use]
    pub fn with_expiry_window(mut self, window: Duration) -> Self {
        self.expiry_window = window;
        self
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self::for_namespace("decor")
    }
}

#[derive(Debug, Clone)]
enum Op {
    Add(String),
    Remove(String),
    Toggle(String),
    Clear,
}

enum Effect {
    Unchanged,
    Changed,
    Cleared { had_items: bool },
}

fn apply(items: &mut Vec<String>, op: Op) -> Effect {
    match op {
        Op::Add(id) => {
            if items.contains(&id) {
                return Effect::Unchanged;
            }
            items.push(id);
            Effect::Changed
        }
        Op::Remove(id) => match items.iter().position(|item| *item == id) {
            Some(idx) => {
                items.remove(idx);
                Effect::Changed
            }
            None => Effect::Unchanged,
        },
        Op::Toggle(id) => {
            match items.iter().position(|item| *item == id) {
                Some(idx) => {
                    items.remove(idx);
                }
                None => items.push(id),
            }
            Effect::Changed
        }
        Op::Clear => {
            let had_items = !items.is_empty();
            items.clear();
            Effect::Cleared { had_items }
        }
    }
}

struct Inner {
    phase: Phase,
    hydration: Option<Hydration>,
    items: Vec<String>,
    pending: Vec<Op>,
    observers: Vec<(u64, Observer)>,
    next_observer_id: u64,
}

impl Inner {
    fn snapshot(&self) -> WishlistState {
        WishlistState { phase: self.phase, items: self.items.clone(), hydration: self.hydration }
    }

    fn observer_list(&self) -> Vec<Observer> {
        self.observers.iter().map(|(_, observer)| Arc::clone(observer)).collect()
    }
}

struct Shared {
    storage: Arc<dyn SnapshotStorage>,
    clock: Arc<dyn Clock>,
    settings: StoreSettings,
    state: Mutex<Inner>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, items: &[String]) {
        let key = self.settings.storage_key.as_str();
        let snapshot = WishlistSnapshot::new(items.iter().cloned(), self.clock.now_millis());
        if let Err(e) = self.storage.write_snapshot(key, &snapshot) {
            warn!(error = %WishlistError::Persistence(e), key, count = items.len(), "wishlist snapshot write failed");
        }
    }

    fn purge(&self) {
        let key = self.settings.storage_key.as_str();
        if let Err(e) = self.storage.delete_snapshot(key) {
            warn!(error = %WishlistError::Persistence(e), key, "wishlist snapshot delete failed");
        }
    }
}

fn notify(observers: &[Observer], items: &[String]) {
    for observer in observers {
        observer(items);
    }
}

// =============================================================================
// STORE
// =============================================================================

/// Shared handle to the session wishlist.
#[derive(Clone)]
pub struct WishlistStore {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for WishlistStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.shared.lock();
        f.debug_struct("WishlistStore")
            .field("storage_key", &self.shared.settings.storage_key)
            .field("phase", &inner.phase)
            .field("items", &inner.items)
            .field("observers", &inner.observers.len())
            .finish_non_exhaustive()
    }
}

impl WishlistStore {
    /// Store over `storage` stamped by the host wall clock.
    #[must_use]
    pub fn new(storage: Arc<dyn SnapshotStorage>, settings: StoreSettings) -> Self {
        Self::with_clock(storage, Arc::new(SystemClock), settings)
    }

    #[must_use]
    pub fn with_clock(storage: Arc<dyn SnapshotStorage>, clock: Arc<dyn Clock>, settings: StoreSettings) -> Self {
        let inner = Inner {
            phase: Phase::Uninitialized,
            hydration: None,
            items: Vec::new(),
            pending: Vec::new(),
            observers: Vec::new(),
            next_observer_id: 0,
        };
        Self { shared: Arc::new(Shared { storage, clock, settings, state: Mutex::new(inner) }) }
    }

    #[must_use]
    pub fn settings(&self) -> &StoreSettings {
        &self.shared.settings
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.shared.lock().phase
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.phase() == Phase::Ready
    }

    #[must_use]
    pub fn state(&self) -> WishlistState {
        self.shared.lock().snapshot()
    }

    // -------------------------------------------------------------------------
    // Hydration
    // -------------------------------------------------------------------------

    /// Hydrate from durable storage and move to `Ready`.
    ///
    /// Never fails: expired snapshots are purged, unreadable ones are logged,
    /// and both start the session empty. Calling it again, or while another
    /// caller is mid-hydration, returns the current state without re-reading.
    pub fn initialize(&self) -> WishlistState {
        if !self.begin_hydration() {
            return self.state();
        }
        let read = self.shared.storage.read_snapshot(&self.shared.settings.storage_key);
        self.finish_hydration(read)
    }

    /// Enter `Hydrating`. Returns `false` if hydration already started.
    ///
    /// For hosts whose storage read is asynchronous: call this, perform the
    /// read, then hand the result to [`Self::finish_hydration`].
    pub fn begin_hydration(&self) -> bool {
        let mut inner = self.shared.lock();
        if inner.phase != Phase::Uninitialized {
            return false;
        }
        inner.phase = Phase::Hydrating;
        true
    }

    /// Complete hydration with the result of reading the snapshot.
    ///
    /// Replays mutations queued since `begin_hydration`, writes once if they
    /// changed membership, and notifies observers of the loaded set. Ignored
    /// unless the store is `Hydrating`.
    pub fn finish_hydration(&self, read: Result<Option<WishlistSnapshot>, StorageError>) -> WishlistState {
        let shared = &self.shared;
        let key = shared.settings.storage_key.as_str();

        let (state, observers) = {
            let mut inner = shared.lock();
            if inner.phase != Phase::Hydrating {
                debug!(key, phase = ?inner.phase, "ignoring hydration result outside hydrating phase");
                return inner.snapshot();
            }

            let now = shared.clock.now_millis();
            let (hydration, restored) = match read {
                Ok(Some(snapshot)) if snapshot.is_fresh(now, shared.settings.expiry_window) => {
                    (Hydration::Restored, snapshot.items)
                }
                Ok(Some(snapshot)) => {
                    info!(key, saved_at = snapshot.saved_at_millis, "discarding expired wishlist snapshot");
                    shared.purge();
                    (Hydration::Expired, Vec::new())
                }
                Ok(None) => (Hydration::Absent, Vec::new()),
                Err(e) => {
                    warn!(error = %WishlistError::Hydration(e), key, "starting with an empty wishlist");
                    (Hydration::Unreadable, Vec::new())
                }
            };

            inner.items = restored;
            let pending = std::mem::take(&mut inner.pending);
            let replayed = pending.len();
            let mut dirty = false;
            for op in pending {
                match apply(&mut inner.items, op) {
                    Effect::Unchanged => {}
                    Effect::Changed => dirty = true,
                    Effect::Cleared { .. } => {
                        shared.purge();
                        dirty = false;
                    }
                }
            }
            if dirty {
                shared.persist(&inner.items);
            }

            inner.phase = Phase::Ready;
            inner.hydration = Some(hydration);
            info!(key, ?hydration, count = inner.items.len(), replayed, "wishlist ready");
            (inner.snapshot(), inner.observer_list())
        };

        notify(&observers, &state.items);
        state
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    /// Append `product_id` if absent.
    pub fn add(&self, product_id: &str) {
        if let Some(id) = checked_id(product_id) {
            self.mutate(Op::Add(id));
        }
    }

    /// Remove `product_id` if present.
    pub fn remove(&self, product_id: &str) {
        if let Some(id) = checked_id(product_id) {
            self.mutate(Op::Remove(id));
        }
    }

    /// Remove `product_id` if present, otherwise append it. One notification.
    pub fn toggle(&self, product_id: &str) {
        if let Some(id) = checked_id(product_id) {
            self.mutate(Op::Toggle(id));
        }
    }

    /// Empty the set and delete the durable snapshot before returning.
    pub fn clear(&self) {
        self.mutate(Op::Clear);
    }

    fn mutate(&self, op: Op) {
        if self.phase() == Phase::Uninitialized {
            debug!(key = %self.shared.settings.storage_key, "hydrating wishlist on first mutation");
            self.initialize();
        }

        let shared = &self.shared;
        let (items, observers) = {
            let mut inner = shared.lock();
            if inner.phase != Phase::Ready {
                let op = resolve_provisional(&inner.items, op);
                if matches!(op, Op::Clear) {
                    shared.purge();
                }
                apply(&mut inner.items, op.clone());
                debug!(?op, phase = ?inner.phase, "queueing wishlist mutation until hydration completes");
                inner.pending.push(op);
                return;
            }

            match apply(&mut inner.items, op) {
                Effect::Unchanged => return,
                Effect::Changed => shared.persist(&inner.items),
                Effect::Cleared { had_items } => {
                    shared.purge();
                    if !had_items {
                        return;
                    }
                }
            }
            (inner.items.clone(), inner.observer_list())
        };

        notify(&observers, &items);
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn contains(&self, product_id: &str) -> bool {
        self.shared.lock().items.iter().any(|item| item == product_id)
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.shared.lock().items.len()
    }

    /// Identifiers in insertion order.
    #[must_use]
    pub fn items(&self) -> Vec<String> {
        self.shared.lock().items.clone()
    }

    // -------------------------------------------------------------------------
    // Subscriptions
    // -------------------------------------------------------------------------

    /// Register `observer` for every membership change and for the move to
    /// `Ready`. The observer stays registered until the returned handle is
    /// unsubscribed or dropped; use [`Subscription::detach`] to keep it for
    /// the life of the store.
    #[must_use = "dropping the subscription unsubscribes the observer"]
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&[String]) + Send + Sync + 'static,
    {
        let mut inner = self.shared.lock();
        let id = inner.next_observer_id;
        inner.next_observer_id += 1;
        inner.observers.push((id, Arc::new(observer)));
        Subscription { id, shared: Arc::downgrade(&self.shared), active: AtomicBool::new(true) }
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.shared.lock().observers.len()
    }
}

// A toggle queued before `Ready` means whatever it meant against the set the
// caller could see, not against the set hydration later restores.
fn resolve_provisional(provisional: &[String], op: Op) -> Op {
    match op {
        Op::Toggle(id) if provisional.contains(&id) => Op::Remove(id),
        Op::Toggle(id) => Op::Add(id),
        other => other,
    }
}

fn checked_id(product_id: &str) -> Option<String> {
    if product_id.trim().is_empty() {
        debug!(error = %WishlistError::InvalidIdentifier(product_id.to_owned()), "ignoring wishlist mutation");
        return None;
    }
    Some(product_id.to_owned())
}

/// Deregistration handle returned by [`WishlistStore::subscribe`].
pub struct Subscription {
    id: u64,
    shared: Weak<Shared>,
    active: AtomicBool,
}

impl Subscription {
    /// Stop notifications. Later calls are no-ops, as is calling this after
    /// the store itself is gone.
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(shared) = self.shared.upgrade() {
            shared.lock().observers.retain(|(id, _)| *id != self.id);
        }
    }

    /// Release the handle but leave the observer registered.
    pub fn detach(self) {
        self.active.store(false, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).field("active", &self.is_active()).finish()
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
