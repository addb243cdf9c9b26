//! Durable wishlist snapshot and its expiry rule.
//!
//! The serialized form is the one contract shared with previous sessions:
//! `{"items": [...], "timestamp": <epoch millis>}` under
//! `"<namespace>-wishlist"`.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How long a saved snapshot stays eligible for hydration.
pub const DEFAULT_EXPIRY_WINDOW: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Storage key for a namespace's wishlist snapshot.
#[must_use]
pub fn storage_key(namespace: &str) -> String {
    format!("{namespace}-wishlist")
}

/// Timestamped, ordered wishlist contents as written to durable storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistSnapshot {
    /// Product identifiers in insertion order.
    pub items: Vec<String>,
    /// Epoch milliseconds of the write that produced this snapshot.
    #[serde(rename = "timestamp")]
    pub saved_at_millis: i64,
}

impl WishlistSnapshot {
    /// Build a snapshot, dropping blank and repeated identifiers while
    /// keeping first-seen order.
    #[must_use]
    pub fn new(items: impl IntoIterator<Item = String>, saved_at_millis: i64) -> Self {
        Self { items: dedupe(items), saved_at_millis }
    }

    /// Whether this snapshot is still inside `window` at `now_millis`.
    ///
    /// Timestamps from the future (clock skew between sessions) count as
    /// fresh.
    #[must_use]
    pub fn is_fresh(&self, now_millis: i64, window: Duration) -> bool {
        let window_millis = i64::try_from(window.as_millis()).unwrap_or(i64::MAX);
        now_millis.saturating_sub(self.saved_at_millis) < window_millis
    }

    /// Serialize to the durable JSON layout.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse the durable JSON layout. Duplicate or blank identifiers written
    /// by an older session are collapsed.
    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        let parsed: Self = serde_json::from_str(raw)?;
        Ok(Self::new(parsed.items, parsed.saved_at_millis))
    }
}

fn dedupe(items: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|id| !id.trim().is_empty())
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

#[cfg(test)]
#[path = "snapshot_test.rs"]
mod tests;
