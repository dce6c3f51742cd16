//! Process-scoped owner of the runtime caches.

use serde_json::Value;

use crate::config::CacheConfig;
use crate::persistence::AttemptStore;
use crate::ratelimit::{RateLimitConfig, RateLimiter};
use crate::runtime::ScormRuntime;
use crate::scorm::ScormSessionStore;
use crate::ttl::TtlCache;

/// Every in-memory cache a process needs, created once at startup.
///
/// Handlers receive a clone (all members share state). Dropping the last
/// clone releases everything, which gives tests a clean slate per context.
#[derive(Debug, Clone)]
pub struct CacheContext {
    config: CacheConfig,
    values: TtlCache<Value>,
    scorm: ScormSessionStore,
    rate_limiter: RateLimiter,
}

impl CacheContext {
    pub fn new(config: CacheConfig, rate_limit: RateLimitConfig) -> Self {
        tracing::debug!(
            default_ttl_secs = config.default_ttl.as_secs(),
            scorm_session_ttl_secs = config.scorm_session_ttl.as_secs(),
            rate_limiting = rate_limit.enabled,
            "Cache context created"
        );

        Self {
            values: TtlCache::new(config.default_ttl),
            scorm: ScormSessionStore::new(config.scorm_session_ttl),
            rate_limiter: RateLimiter::new(rate_limit),
            config,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// General-purpose cache for computed responses.
    pub fn values(&self) -> &TtlCache<Value> {
        &self.values
    }

    pub fn scorm(&self) -> &ScormSessionStore {
        &self.scorm
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// SCORM runtime sharing this context's session store.
    pub fn scorm_runtime<S: AttemptStore>(&self, attempts: S) -> ScormRuntime<S> {
        ScormRuntime::new(self.scorm.clone(), attempts, self.config.max_value_len)
    }
}

impl Default for CacheContext {
    fn default() -> Self {
        Self::new(CacheConfig::default(), RateLimitConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::InMemoryAttempts;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_clones_share_state() {
        let ctx = CacheContext::default();
        let handler_ctx = ctx.clone();

        handler_ctx
            .values()
            .set("course:rust:outline", json!({"modules": 3}), Duration::from_secs(30));
        assert_eq!(
            ctx.values().get("course:rust:outline"),
            Some(json!({"modules": 3}))
        );
    }

    #[test]
    fn test_contexts_are_independent() {
        let first = CacheContext::default();
        let second = CacheContext::default();

        first.scorm().set_session_value("a1", "cmi.location", "1");
        assert_eq!(second.scorm().get_session_value("a1", "cmi.location"), None);
    }

    #[test]
    fn test_runtime_writes_into_context_store() {
        let ctx = CacheContext::new(
            CacheConfig::new().with_max_value_len(4),
            RateLimitConfig::default(),
        );
        let attempts = InMemoryAttempts::new();
        attempts.register("a1", "u1");
        let runtime = ctx.scorm_runtime(attempts);

        runtime.initialize("u1", "a1").unwrap();
        runtime
            .set_value("u1", "a1", "cmi.suspend_data", "abcdefgh")
            .unwrap();

        assert_eq!(
            ctx.scorm().get_session_value("a1", "cmi.suspend_data"),
            Some("abcd".to_string())
        );
    }
}
