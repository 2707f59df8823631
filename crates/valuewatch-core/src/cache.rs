//! In-memory TTL cache for validation and filtering results.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::clock::Clock;
use crate::UtcDateTime;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    stored_at: UtcDateTime,
}

/// String-keyed cache whose entries expire `ttl` after insertion.
///
/// Expired entries are evicted lazily by [`TtlCache::get`] and in bulk by
/// [`TtlCache::sweep`], which owners call from their write paths; nothing runs
/// in the background.
pub struct TtlCache<V> {
    map: HashMap<String, CacheEntry<V>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    last_sweep: UtcDateTime,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let last_sweep = clock.now();
        Self {
            map: HashMap::new(),
            ttl,
            clock,
            last_sweep,
        }
    }

    /// Returns a clone of the live entry for `key`, evicting it if expired.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let expired = match self.map.get(key) {
            None => return None,
            Some(entry) => now.duration_since(entry.stored_at) > self.ttl,
        };

        if expired {
            self.map.remove(key);
            return None;
        }

        self.map.get(key).map(|entry| entry.value.clone())
    }

    /// Inserts or replaces the entry for `key`, stamped with the current time.
    pub fn put(&mut self, key: impl Into<String>, value: V) {
        let stored_at = self.clock.now();
        self.map.insert(key.into(), CacheEntry { value, stored_at });
    }

    pub fn remove(&mut self, key: &str) -> Option<V> {
        self.map.remove(key).map(|entry| entry.value)
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn clear_expired(&mut self) -> usize {
        let now = self.clock.now();
        let ttl = self.ttl;
        let before = self.map.len();
        self.map
            .retain(|_, entry| now.duration_since(entry.stored_at) <= ttl);
        before - self.map.len()
    }

    /// [`TtlCache::clear_expired`] at most once per `interval`; `None` when throttled.
    pub fn sweep(&mut self, interval: Duration) -> Option<usize> {
        let now = self.clock.now();
        if now.duration_since(self.last_sweep) < interval {
            return None;
        }
        self.last_sweep = now;
        Some(self.clear_expired())
    }

    /// True when an entry is held for `key`, expired or not.
    pub fn contains_key(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub fn clear(&mut self) -> usize {
        let removed = self.map.len();
        self.map.clear();
        removed
    }

    /// Number of entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl<V> std::fmt::Debug for TtlCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("entries", &self.map.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}
