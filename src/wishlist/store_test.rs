use std::sync::Mutex;

use super::*;
use crate::wishlist::clock::FixedClock;
use crate::wishlist::storage::MemoryStorage;

const NOW: i64 = 1_700_000_000_000;
const DAY_MILLIS: i64 = 24 * 60 * 60 * 1000;
const KEY: &str = "decor-wishlist";

struct Fixture {
    store: WishlistStore,
    storage: Arc<MemoryStorage>,
    clock: Arc<FixedClock>,
}

fn fixture() -> Fixture {
    let storage = Arc::new(MemoryStorage::new());
    let clock = Arc::new(FixedClock::new(NOW));
    let store = WishlistStore::with_clock(storage.clone(), clock.clone(), StoreSettings::default());
    Fixture { store, storage, clock }
}

fn ready() -> Fixture {
    let fx = fixture();
    fx.store.initialize();
    fx
}

fn fresh_store(fx: &Fixture) -> WishlistStore {
    WishlistStore::with_clock(fx.storage.clone(), fx.clock.clone(), StoreSettings::default())
}

fn plant(storage: &MemoryStorage, items: &[&str], saved_at: i64) {
    let snapshot = WishlistSnapshot::new(items.iter().map(|s| (*s).to_owned()), saved_at);
    storage.write_snapshot(KEY, &snapshot).unwrap();
}

type Calls = Arc<Mutex<Vec<Vec<String>>>>;

fn record(store: &WishlistStore) -> (Subscription, Calls) {
    let calls: Calls = Arc::new(Mutex::new(Vec::new()));
    let sink = calls.clone();
    let sub = store.subscribe(move |items| sink.lock().unwrap().push(items.to_vec()));
    (sub, calls)
}

fn call_count(calls: &Calls) -> usize {
    calls.lock().unwrap().len()
}

fn stored_items(storage: &MemoryStorage) -> Option<Vec<String>> {
    storage.read_snapshot(KEY).unwrap().map(|s| s.items)
}

// =============================================================
// Lifecycle
// =============================================================

#[test]
fn new_store_is_uninitialized_and_empty() {
    let fx = fixture();
    assert_eq!(fx.store.phase(), Phase::Uninitialized);
    assert!(!fx.store.is_loaded());
    assert_eq!(fx.store.count(), 0);
    assert_eq!(fx.store.state().hydration, None);
}

#[test]
fn initialize_without_snapshot_is_absent() {
    let fx = fixture();
    let state = fx.store.initialize();
    assert!(state.is_loaded());
    assert_eq!(state.hydration, Some(Hydration::Absent));
    assert!(state.items.is_empty());
}

#[test]
fn initialize_restores_fresh_snapshot_in_order() {
    let fx = fixture();
    plant(&fx.storage, &["c", "a", "b"], NOW - DAY_MILLIS);
    let state = fx.store.initialize();
    assert_eq!(state.hydration, Some(Hydration::Restored));
    assert_eq!(state.items, vec!["c", "a", "b"]);
}

#[test]
fn initialize_twice_does_not_reread_storage() {
    let fx = fixture();
    fx.store.initialize();
    plant(&fx.storage, &["late"], NOW);
    let state = fx.store.initialize();
    assert_eq!(state.hydration, Some(Hydration::Absent));
    assert!(!fx.store.contains("late"));
}

#[test]
fn phases_advance_through_two_step_hydration() {
    let fx = fixture();
    assert!(fx.store.begin_hydration());
    assert_eq!(fx.store.phase(), Phase::Hydrating);
    assert!(!fx.store.begin_hydration());

    let state = fx.store.finish_hydration(Ok(None));
    assert_eq!(state.phase, Phase::Ready);
    assert!(!fx.store.begin_hydration());
}

#[test]
fn finish_hydration_outside_hydrating_is_ignored() {
    let fx = ready();
    fx.store.add("a");
    let snapshot = WishlistSnapshot::new(vec!["other".to_owned()], NOW);
    let state = fx.store.finish_hydration(Ok(Some(snapshot)));
    assert_eq!(state.items, vec!["a"]);
    assert_eq!(state.hydration, Some(Hydration::Absent));
}

#[test]
fn corrupt_snapshot_starts_empty() {
    let fx = fixture();
    fx.storage.insert_raw(KEY, "{\"items\": [oops");
    let state = fx.store.initialize();
    assert!(state.is_loaded());
    assert_eq!(state.hydration, Some(Hydration::Unreadable));
    assert!(state.items.is_empty());
}

#[test]
fn unavailable_storage_starts_empty() {
    let fx = fixture();
    fx.storage.set_unavailable(true);
    let state = fx.store.initialize();
    assert_eq!(state.hydration, Some(Hydration::Unreadable));
    assert_eq!(fx.store.count(), 0);
}

// =============================================================
// Expiry
// =============================================================

#[test]
fn snapshot_older_than_thirty_days_is_rejected_and_deleted() {
    let fx = fixture();
    plant(&fx.storage, &["a", "b"], NOW - 31 * DAY_MILLIS);
    let state = fx.store.initialize();
    assert_eq!(state.hydration, Some(Hydration::Expired));
    assert!(state.items.is_empty());
    assert!(fx.storage.raw(KEY).is_none());
}

#[test]
fn custom_expiry_window_is_honored() {
    let storage = Arc::new(MemoryStorage::new());
    let clock = Arc::new(FixedClock::new(NOW));
    let settings = StoreSettings::default().with_expiry_window(Duration::from_secs(60));
    plant(&storage, &["a"], NOW - 61_000);
    let store = WishlistStore::with_clock(storage.clone(), clock, settings);
    assert_eq!(store.initialize().hydration, Some(Hydration::Expired));
}

#[test]
fn open_session_never_expires_its_own_set() {
    let fx = ready();
    fx.store.add("a");
    fx.clock.advance(90 * DAY_MILLIS);
    assert!(fx.store.contains("a"));
    assert_eq!(fx.store.initialize().items, vec!["a"]);
}

// =============================================================
// Mutations
// =============================================================

#[test]
fn add_is_idempotent() {
    let fx = ready();
    let (_sub, calls) = record(&fx.store);
    fx.store.add("p");
    assert_eq!(fx.store.count(), 1);
    fx.store.add("p");
    assert_eq!(fx.store.count(), 1);
    assert_eq!(call_count(&calls), 1);
}

#[test]
fn remove_absent_is_noop() {
    let fx = ready();
    fx.store.add("a");
    let (_sub, calls) = record(&fx.store);
    fx.store.remove("missing");
    assert_eq!(fx.store.items(), vec!["a"]);
    assert_eq!(call_count(&calls), 0);
}

#[test]
fn toggle_twice_restores_state_with_two_notifications() {
    let fx = ready();
    fx.store.add("a");
    let before = fx.store.items();
    let (_sub, calls) = record(&fx.store);

    fx.store.toggle("b");
    assert!(fx.store.contains("b"));
    fx.store.toggle("b");

    assert_eq!(fx.store.items(), before);
    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], vec!["a", "b"]);
    assert_eq!(calls[1], vec!["a"]);
}

#[test]
fn blank_identifiers_are_ignored() {
    let fx = ready();
    let (_sub, calls) = record(&fx.store);
    fx.store.add("");
    fx.store.add("   ");
    fx.store.toggle("");
    fx.store.remove("\t");
    assert_eq!(fx.store.count(), 0);
    assert_eq!(call_count(&calls), 0);
    assert!(fx.storage.raw(KEY).is_none());
}

#[test]
fn insertion_order_is_preserved() {
    let fx = ready();
    for id in ["c", "a", "b"] {
        fx.store.add(id);
    }
    fx.store.remove("a");
    fx.store.add("a");
    assert_eq!(fx.store.items(), vec!["c", "b", "a"]);
    assert_eq!(stored_items(&fx.storage), Some(vec!["c".to_owned(), "b".to_owned(), "a".to_owned()]));
}

#[test]
fn every_change_is_written_with_current_timestamp() {
    let fx = ready();
    fx.store.add("a");
    assert_eq!(fx.storage.read_snapshot(KEY).unwrap().unwrap().saved_at_millis, NOW);

    fx.clock.advance(5_000);
    fx.store.remove("a");
    let snapshot = fx.storage.read_snapshot(KEY).unwrap().unwrap();
    assert!(snapshot.items.is_empty());
    assert_eq!(snapshot.saved_at_millis, NOW + 5_000);
}

#[test]
fn noop_mutation_does_not_rewrite_snapshot() {
    let fx = ready();
    fx.store.add("a");
    fx.clock.advance(1_000);
    fx.store.add("a");
    fx.store.remove("zzz");
    assert_eq!(fx.storage.read_snapshot(KEY).unwrap().unwrap().saved_at_millis, NOW);
}

#[test]
fn write_failure_keeps_memory_authoritative() {
    let fx = ready();
    fx.storage.set_unavailable(true);
    let (_sub, calls) = record(&fx.store);
    fx.store.add("a");
    fx.store.clear();
    fx.store.add("b");
    assert_eq!(fx.store.items(), vec!["b"]);
    assert_eq!(call_count(&calls), 3);

    fx.storage.set_unavailable(false);
    fx.store.add("c");
    assert_eq!(stored_items(&fx.storage), Some(vec!["b".to_owned(), "c".to_owned()]));
}

#[test]
fn clones_share_one_wishlist() {
    let fx = ready();
    let header = fx.store.clone();
    let catalog_page = fx.store.clone();
    catalog_page.add("bar-magnolia");
    assert!(header.contains("bar-magnolia"));
    assert_eq!(fx.store.count(), 1);
}

// =============================================================
// Persistence round trip and clear
// =============================================================

#[test]
fn snapshot_round_trips_into_fresh_store() {
    let fx = ready();
    for id in ["A", "B", "C"] {
        fx.store.add(id);
    }

    let restarted = fresh_store(&fx);
    let state = restarted.initialize();
    assert_eq!(state.hydration, Some(Hydration::Restored));
    assert_eq!(state.items, vec!["A", "B", "C"]);
}

#[test]
fn clear_deletes_snapshot_before_returning() {
    let fx = ready();
    fx.store.add("a");
    fx.store.add("b");
    fx.store.clear();
    assert_eq!(fx.store.count(), 0);
    assert!(fx.storage.raw(KEY).is_none());

    let restarted = fresh_store(&fx);
    let state = restarted.initialize();
    assert_eq!(state.hydration, Some(Hydration::Absent));
    assert!(state.items.is_empty());
}

#[test]
fn clear_on_empty_set_purges_without_notifying() {
    let fx = ready();
    plant(&fx.storage, &["stale"], NOW);
    let (_sub, calls) = record(&fx.store);
    fx.store.clear();
    assert!(fx.storage.raw(KEY).is_none());
    assert_eq!(call_count(&calls), 0);
}

// =============================================================
// Mutations during hydration
// =============================================================

#[test]
fn mutations_before_ready_are_replayed_after_hydration() {
    let fx = fixture();
    plant(&fx.storage, &["a"], NOW - DAY_MILLIS);

    assert!(fx.store.begin_hydration());
    fx.store.add("x");
    fx.store.toggle("a");
    fx.store.add("y");
    // Provisional view: nothing is loaded yet, so the toggle added "a".
    assert_eq!(fx.store.items(), vec!["x", "a", "y"]);
    assert_eq!(fx.store.count(), 3);
    // The previous session's snapshot is untouched until hydration completes.
    assert_eq!(stored_items(&fx.storage), Some(vec!["a".to_owned()]));

    let read = fx.storage.read_snapshot(KEY);
    let state = fx.store.finish_hydration(read);
    assert_eq!(state.items, vec!["a", "x", "y"]);
    assert_eq!(stored_items(&fx.storage), Some(vec!["a".to_owned(), "x".to_owned(), "y".to_owned()]));
}

#[test]
fn queued_toggle_off_removes_hydrated_item() {
    let fx = fixture();
    plant(&fx.storage, &["a", "b"], NOW);

    fx.store.begin_hydration();
    fx.store.toggle("c");
    fx.store.toggle("c");
    assert_eq!(fx.store.count(), 0);

    fx.store.remove("b");
    let read = fx.storage.read_snapshot(KEY);
    let state = fx.store.finish_hydration(read);
    assert_eq!(state.items, vec!["a"]);
}

#[test]
fn mutations_before_initialize_are_not_lost() {
    let fx = fixture();
    plant(&fx.storage, &["a"], NOW);
    fx.store.add("b");
    let state = fx.store.initialize();
    assert_eq!(state.items, vec!["a", "b"]);
}

#[test]
fn first_mutation_hydrates_uninitialized_store() {
    let fx = fixture();
    plant(&fx.storage, &["a"], NOW);
    let (_sub, calls) = record(&fx.store);

    fx.store.add("b");
    assert!(fx.store.is_loaded());
    assert_eq!(fx.store.state().hydration, Some(Hydration::Restored));
    assert_eq!(fx.store.items(), vec!["a", "b"]);
    assert!(fx.store.contains("b"));
    assert_eq!(stored_items(&fx.storage), Some(vec!["a".to_owned(), "b".to_owned()]));
    // One call for the move to Ready, one for the add.
    assert_eq!(*calls.lock().unwrap(), vec![vec!["a".to_owned()], vec!["a".to_owned(), "b".to_owned()]]);
}

#[test]
fn clear_on_uninitialized_store_deletes_snapshot() {
    let fx = fixture();
    plant(&fx.storage, &["a"], NOW);
    fx.store.clear();
    assert!(fx.store.is_loaded());
    assert_eq!(fx.store.count(), 0);
    assert!(fx.storage.raw(KEY).is_none());
}

#[test]
fn queued_clear_deletes_restored_snapshot() {
    let fx = fixture();
    plant(&fx.storage, &["a", "b"], NOW);
    fx.store.begin_hydration();
    let read = fx.storage.read_snapshot(KEY);

    fx.store.clear();
    assert!(fx.storage.raw(KEY).is_none());
    fx.store.add("c");
    fx.store.clear();
    assert!(fx.storage.raw(KEY).is_none());

    let state = fx.store.finish_hydration(read);
    assert!(state.items.is_empty());
    assert!(fx.storage.raw(KEY).is_none());
}

#[test]
fn queued_noops_do_not_rewrite_snapshot() {
    let fx = fixture();
    plant(&fx.storage, &["a"], NOW - DAY_MILLIS);
    fx.store.begin_hydration();
    fx.store.add("a");
    let read = fx.storage.read_snapshot(KEY);
    fx.store.finish_hydration(read);
    assert_eq!(fx.storage.read_snapshot(KEY).unwrap().unwrap().saved_at_millis, NOW - DAY_MILLIS);
}

// =============================================================
// Subscriptions
// =============================================================

#[test]
fn observers_hear_transition_to_ready() {
    let fx = fixture();
    plant(&fx.storage, &["a"], NOW);
    let (_sub, calls) = record(&fx.store);
    fx.store.initialize();
    assert_eq!(*calls.lock().unwrap(), vec![vec!["a".to_owned()]]);
}

#[test]
fn three_subscribers_fan_out_and_unsubscribe_stops_one() {
    let fx = ready();
    let (sub_a, calls_a) = record(&fx.store);
    let (_sub_b, calls_b) = record(&fx.store);
    let (_sub_c, calls_c) = record(&fx.store);

    fx.store.add("p");
    for calls in [&calls_a, &calls_b, &calls_c] {
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].contains(&"p".to_owned()));
    }

    sub_a.unsubscribe();
    fx.store.add("q");
    assert_eq!(call_count(&calls_a), 1);
    assert_eq!(call_count(&calls_b), 2);
    assert_eq!(call_count(&calls_c), 2);
}

#[test]
fn unsubscribe_twice_is_safe() {
    let fx = ready();
    let (sub, _calls) = record(&fx.store);
    let (_other, _other_calls) = record(&fx.store);
    assert_eq!(fx.store.subscriber_count(), 2);

    sub.unsubscribe();
    assert!(!sub.is_active());
    sub.unsubscribe();
    assert_eq!(fx.store.subscriber_count(), 1);
}

#[test]
fn unsubscribe_after_store_dropped_is_safe() {
    let fx = ready();
    let (sub, _calls) = record(&fx.store);
    drop(fx);
    sub.unsubscribe();
    assert!(!sub.is_active());
}

#[test]
fn dropping_subscription_unsubscribes() {
    let fx = ready();
    let (sub, calls) = record(&fx.store);
    fx.store.add("a");
    drop(sub);
    assert_eq!(fx.store.subscriber_count(), 0);
    fx.store.add("b");
    assert_eq!(call_count(&calls), 1);
}

#[test]
fn detached_subscription_keeps_observer() {
    let fx = ready();
    let (sub, calls) = record(&fx.store);
    sub.detach();
    assert_eq!(fx.store.subscriber_count(), 1);
    fx.store.add("a");
    fx.store.add("b");
    assert_eq!(call_count(&calls), 2);
}

#[test]
fn observer_may_read_store_during_notification() {
    let fx = ready();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let reader = fx.store.clone();
    let sink = seen.clone();
    let _sub = fx.store.subscribe(move |items| {
        sink.lock().unwrap().push((items.len(), reader.count()));
    });
    fx.store.add("a");
    fx.store.add("b");
    assert_eq!(*seen.lock().unwrap(), vec![(1, 1), (2, 2)]);
}

// =============================================================
// Scenario
// =============================================================

#[test]
fn consultation_wishlist_scenario() {
    let fx = ready();
    fx.store.add("bar-magnolia");
    assert_eq!(fx.store.count(), 1);
    assert!(fx.store.contains("bar-magnolia"));

    fx.store.add("decor-camellia");
    assert_eq!(fx.store.count(), 2);

    fx.store.remove("bar-magnolia");
    assert_eq!(fx.store.count(), 1);
    assert!(!fx.store.contains("bar-magnolia"));
    assert!(fx.store.contains("decor-camellia"));

    fx.store.clear();
    assert_eq!(fx.store.count(), 0);
    assert!(fx.storage.read_snapshot(KEY).unwrap().is_none());
}
