//! Wishlist core for the event-decor rental site.
//!
//! ARCHITECTURE
//! ============
//! `wishlist` owns the session store and its expiring durable snapshot.
//! `catalog` and `notify` are the boundary collaborators the store never
//! depends on directly: the catalog resolves identifiers for display and the
//! notifier relays a resolved wishlist to the business inbox. `config` turns
//! environment variables into typed settings for all three.

pub mod catalog;
pub mod config;
pub mod notify;
pub mod wishlist;
