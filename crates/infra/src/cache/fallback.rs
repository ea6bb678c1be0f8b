//! In-process fallback store
//!
//! A time-bounded key/value map that keeps the gateway caching when the
//! external store is unreachable. Entries live only as long as the process.
//! There is no background sweeper: an expired entry is removed the next time
//! it is read.

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct FallbackEntry {
    value: Value,
    expires_at: Instant,
}

/// Process-local cache store guarded by a single mutex
#[derive(Debug, Default)]
pub struct FallbackStore {
    entries: Mutex<HashMap<String, FallbackEntry>>,
}

impl FallbackStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value, replacing any existing entry for `key`
    ///
    /// # Arguments
    ///
    /// * `key` - Cache key
    /// * `value` - Payload to store
    /// * `ttl` - Time after which the entry is no longer served
    ///
    /// # Examples
    ///
    /// ```
    /// use clawsearch_infra::cache::FallbackStore;
    /// use std::time::Duration;
    ///
    /// let store = FallbackStore::new();
    /// store.set("k", serde_json::json!({"hits": 3}), Duration::from_secs(60));
    /// assert_eq!(store.len(), 1);
    /// ```
    pub fn set(&self, key: &str, value: Value, ttl: Duration) {
        let entry = FallbackEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.lock().insert(key.to_string(), entry);
    }

    /// Gets a value if present and not yet expired
    ///
    /// An entry whose expiry has been reached is deleted and reported as
    /// absent.
    pub fn get(&self, key: &str) -> Option<Value> {
        let mut entries = self.entries.lock();

        let expired = match entries.get(key) {
            None => return None,
            Some(entry) => Instant::now() >= entry.expires_at,
        };

        if expired {
            entries.remove(key);
            tracing::trace!(key, "Expired fallback entry removed");
            return None;
        }

        entries.get(key).map(|entry| entry.value.clone())
    }

    /// Removes an entry, returning whether one existed
    pub fn remove(&self, key: &str) -> bool {
        self.entries.lock().remove(key).is_some()
    }

    /// Number of stored entries, including expired ones not yet read
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the store holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drops every entry
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}
