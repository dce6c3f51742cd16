//! Configuration for the runtime caches.

use std::time::Duration;

/// Default TTL for generic cache entries written with [`TtlCache::set_default`].
///
/// [`TtlCache::set_default`]: crate::TtlCache::set_default
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Default lifetime of an idle SCORM attempt sub-map.
pub const DEFAULT_SCORM_SESSION_TTL: Duration = Duration::from_secs(2 * 60 * 60);

/// SCORM 2004 `cmi.suspend_data` limit, used as the general value bound.
pub const DEFAULT_MAX_VALUE_LEN: usize = 64_000;

/// Configuration for the cache context.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL applied by `set_default` on the generic cache.
    pub default_ttl: Duration,

    /// How long an attempt's CMI values survive without a write.
    pub scorm_session_ttl: Duration,

    /// Values longer than this are truncated by sanitization.
    pub max_value_len: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL,
            scorm_session_ttl: DEFAULT_SCORM_SESSION_TTL,
            max_value_len: DEFAULT_MAX_VALUE_LEN,
        }
    }
}

impl CacheConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default TTL for generic cache entries.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Set the SCORM attempt TTL.
    pub fn with_scorm_session_ttl(mut self, ttl: Duration) -> Self {
        self.scorm_session_ttl = ttl;
        self
    }

    /// Set the maximum sanitized value length.
    pub fn with_max_value_len(mut self, len: usize) -> Self {
        self.max_value_len = len;
        self
    }
}
