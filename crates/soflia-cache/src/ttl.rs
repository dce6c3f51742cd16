//! Generic key/value cache with per-entry absolute expiry.
//!
//! Expiry is lazy: an entry past its deadline is removed by the read that
//! discovers it. Nothing sweeps in the background; callers that want to
//! reclaim space for keys that are never read again call
//! [`TtlCache::purge_expired`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, trace};

/// Entry stored in the cache.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,

    /// `None` when `now + ttl` does not fit in an `Instant`.
    expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    fn new(value: V, now: Instant, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: now.checked_add(ttl),
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(deadline) if now > deadline)
    }
}

/// Process-wide map from string key to value with absolute expiry.
///
/// Cloning shares the underlying map. There is no size bound and no
/// eviction beyond TTL.
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: Arc<Mutex<HashMap<String, CacheEntry<V>>>>,
    default_ttl: Duration,
}

impl<V> Clone for TtlCache<V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            default_ttl: self.default_ttl,
        }
    }
}

impl<V> TtlCache<V> {
    /// Create an empty cache. `default_ttl` is used by [`set_default`](Self::set_default).
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            default_ttl,
        }
    }

    /// The TTL applied by [`set_default`](Self::set_default).
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Store `value` under `key`, replacing any previous value and expiry.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        let entry = CacheEntry::new(value, Instant::now(), ttl);
        let mut entries = self.entries.lock();
        trace!(key = %key, ttl_ms = ttl.as_millis() as u64, "Cache set");
        entries.insert(key, entry);
    }

    /// Store `value` with the default TTL.
    pub fn set_default(&self, key: impl Into<String>, value: V) {
        self.set(key, value, self.default_ttl);
    }

    /// Run `f` against the live value for `key`.
    ///
    /// Follows the same expiry rule as [`get`](Self::get) without cloning.
    pub fn with_value<F, R>(&self, key: &str, f: F) -> Option<R>
    where
        F: FnOnce(&V) -> R,
    {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        let expired = entries.get(key)?.is_expired(now);
        if expired {
            trace!(key = %key, "Cache entry expired, removing");
            entries.remove(key);
            return None;
        }

        entries.get(key).map(|entry| f(&entry.value))
    }

    /// Mutate the value for `key` in place and push its expiry to `now + ttl`.
    ///
    /// Missing or expired entries start from `V::default()`. The whole
    /// read-modify-write happens under one lock.
    pub fn update<F, R>(&self, key: &str, ttl: Duration, f: F) -> R
    where
        V: Default,
        F: FnOnce(&mut V) -> R,
    {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| CacheEntry::new(V::default(), now, ttl));
        if entry.is_expired(now) {
            trace!(key = %key, "Cache entry expired, starting fresh");
            entry.value = V::default();
        }
        entry.expires_at = now.checked_add(ttl);

        f(&mut entry.value)
    }

    /// Remove `key`, returning its value if it had not expired.
    pub fn remove(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        self.entries
            .lock()
            .remove(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value)
    }

    /// Whether `key` holds a live value. Does not evict.
    pub fn contains(&self, key: &str) -> bool {
        let now = Instant::now();
        self.entries
            .lock()
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now))
    }

    /// Number of stored entries, including expired ones not yet discovered.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Check if the cache holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Remove all expired entries and return how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        let purged = before - entries.len();

        if purged > 0 {
            debug!(count = purged, "Purged expired cache entries");
        }

        purged
    }

    /// Snapshot of occupancy.
    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let entries = self.entries.lock();
        CacheStats {
            entries: entries.len(),
            expired: entries.values().filter(|e| e.is_expired(now)).count(),
        }
    }
}

impl<V: Clone> TtlCache<V> {
    /// Look up `key`.
    ///
    /// An entry past its deadline is deleted and reported as missing. Reads
    /// never extend expiry.
    pub fn get(&self, key: &str) -> Option<V> {
        self.with_value(key, V::clone)
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Entries currently occupying the map.
    pub entries: usize,

    /// Entries past their deadline that no read has discovered yet.
    pub expired: usize,
}
