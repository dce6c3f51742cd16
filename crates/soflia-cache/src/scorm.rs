//! Per-attempt store for SCORM CMI runtime values.
//!
//! Holds the values a SCORM package writes through `SetValue` so that
//! `GetValue` calls within the same browser session do not hit the
//! database. The store is never the system of record: values are flushed
//! by `Commit` and the attempt is dropped on `Terminate`.
//!
//! Keys and values are taken as-is. Shape validation and sanitization
//! happen in [`cmi`](crate::cmi) before anything reaches this module.

use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, trace};

use crate::ttl::TtlCache;

/// CMI key/value pairs for one attempt.
pub type CmiValues = HashMap<String, String>;

/// Attempt-keyed overlay on a [`TtlCache`].
///
/// Each attempt owns a sub-map that is created on first write and refreshed
/// on every later write. An attempt that goes unwritten for longer than the
/// session TTL is dropped the next time anything reads it.
#[derive(Debug, Clone)]
pub struct ScormSessionStore {
    attempts: TtlCache<CmiValues>,
}

impl ScormSessionStore {
    /// Create an empty store with the given per-attempt TTL.
    pub fn new(session_ttl: Duration) -> Self {
        Self {
            attempts: TtlCache::new(session_ttl),
        }
    }

    /// Per-attempt TTL.
    pub fn session_ttl(&self) -> Duration {
        self.attempts.default_ttl()
    }

    /// Store an already-sanitized value under `(attempt_id, key)`.
    pub fn set_session_value(&self, attempt_id: &str, key: &str, value: impl Into<String>) {
        let value = value.into();
        let size = self.attempts.update(attempt_id, self.session_ttl(), |values| {
            values.insert(key.to_string(), value);
            values.len()
        });

        trace!(attempt_id = %attempt_id, key = %key, attempt_keys = size, "SCORM value cached");
    }

    /// Read a cached value.
    pub fn get_session_value(&self, attempt_id: &str, key: &str) -> Option<String> {
        self.attempts
            .with_value(attempt_id, |values| values.get(key).cloned())
            .flatten()
    }

    /// Seed an attempt with several values at once, replacing whatever it held.
    pub fn load_session(&self, attempt_id: &str, values: CmiValues) {
        let count = values.len();
        self.attempts.set(attempt_id, values, self.session_ttl());
        debug!(attempt_id = %attempt_id, count = count, "SCORM session loaded");
    }

    /// Copy of every value cached for the attempt.
    pub fn session_values(&self, attempt_id: &str) -> Option<CmiValues> {
        self.attempts.get(attempt_id)
    }

    /// Drop everything cached for the attempt.
    ///
    /// Returns whether there was a live sub-map to drop. A later
    /// `set_session_value` starts from an empty map.
    pub fn clear_session_cache(&self, attempt_id: &str) -> bool {
        let cleared = self.attempts.remove(attempt_id).is_some();
        debug!(attempt_id = %attempt_id, cleared = cleared, "SCORM session cache cleared");
        cleared
    }

    /// Whether the attempt currently has a live sub-map.
    pub fn is_active(&self, attempt_id: &str) -> bool {
        self.attempts.contains(attempt_id)
    }

    /// Number of attempts occupying the store.
    pub fn active_attempts(&self) -> usize {
        self.attempts.len()
    }

    /// Drop attempts whose TTL has lapsed.
    pub fn purge_expired(&self) -> usize {
        self.attempts.purge_expired()
    }
}
