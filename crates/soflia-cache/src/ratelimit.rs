//! Tiered, in-memory rate limiting.
//!
//! Each `(tier, identifier)` pair gets a fixed counting window. Going over
//! the tier's limit blocks the identifier for the tier's block duration,
//! independent of the window. Records live in a process-wide map that is
//! swept by [`RateLimiter::cleanup_expired`], either on demand or from the
//! task started by [`RateLimiter::spawn_cleanup`].

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::error::{Error, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Tiers and policies
// ─────────────────────────────────────────────────────────────────────────────

/// Endpoint class, from most to least restrictive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitTier {
    /// Login, registration, password reset.
    Auth,
    /// Administration endpoints.
    Admin,
    /// POST, PUT, PATCH and DELETE requests.
    ApiMutation,
    /// Other API reads.
    ApiRead,
    /// Everything else.
    Public,
}

impl RateLimitTier {
    pub const ALL: [RateLimitTier; 5] = [
        RateLimitTier::Auth,
        RateLimitTier::Admin,
        RateLimitTier::ApiMutation,
        RateLimitTier::ApiRead,
        RateLimitTier::Public,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RateLimitTier::Auth => "auth",
            RateLimitTier::Admin => "admin",
            RateLimitTier::ApiMutation => "api_mutation",
            RateLimitTier::ApiRead => "api_read",
            RateLimitTier::Public => "public",
        }
    }

    /// Pick the tier for a request path and HTTP method.
    pub fn from_path(path: &str, method: &str) -> Self {
        const AUTH_MARKERS: [&str; 4] =
            ["/api/auth/", "/login", "/register", "/reset-password"];

        if AUTH_MARKERS.iter().any(|marker| path.contains(marker)) {
            RateLimitTier::Auth
        } else if path.contains("/api/admin/") {
            RateLimitTier::Admin
        } else if ["POST", "PUT", "DELETE", "PATCH"]
            .iter()
            .any(|m| m.eq_ignore_ascii_case(method))
        {
            RateLimitTier::ApiMutation
        } else if path.starts_with("/api/") {
            RateLimitTier::ApiRead
        } else {
            RateLimitTier::Public
        }
    }
}

impl fmt::Display for RateLimitTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RateLimitTier {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        RateLimitTier::ALL
            .into_iter()
            .find(|tier| tier.as_str() == s)
            .ok_or_else(|| format!("unknown rate limit tier '{s}'"))
    }
}

/// Limits for one tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierPolicy {
    /// Requests allowed per window.
    pub max_requests: u32,
    /// Length of the counting window.
    pub window: Duration,
    /// How long an identifier stays blocked after exceeding the limit.
    pub block_duration: Duration,
    /// User-facing message for denied requests.
    pub message: String,
}

impl TierPolicy {
    /// Built-in policy for a tier.
    pub fn default_for(tier: RateLimitTier) -> Self {
        const MINUTE: u64 = 60;
        let (max_requests, window, block, message) = match tier {
            RateLimitTier::Auth => (
                5,
                15 * MINUTE,
                60 * MINUTE,
                "Too many attempts. Try again in 15 minutes.",
            ),
            RateLimitTier::Admin => (
                50,
                15 * MINUTE,
                30 * MINUTE,
                "Too many administrative requests. Try again later.",
            ),
            RateLimitTier::ApiMutation => (
                100,
                MINUTE,
                5 * MINUTE,
                "Too many requests. Try again in a moment.",
            ),
            RateLimitTier::ApiRead => (
                300,
                MINUTE,
                2 * MINUTE,
                "Too many requests. Please wait a moment.",
            ),
            RateLimitTier::Public => (
                1000,
                MINUTE,
                MINUTE,
                "Too many requests. Please wait a moment.",
            ),
        };

        Self {
            max_requests,
            window: Duration::from_secs(window),
            block_duration: Duration::from_secs(block),
            message: message.to_string(),
        }
    }
}

/// Rate limiter configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// When false every check is allowed.
    pub enabled: bool,
    /// Period of the background cleanup task.
    pub cleanup_interval: Duration,
    /// Per-tier overrides; tiers not listed use [`TierPolicy::default_for`].
    pub policies: HashMap<RateLimitTier, TierPolicy>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cleanup_interval: Duration::from_secs(5 * 60),
            policies: HashMap::new(),
        }
    }
}

impl RateLimitConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    /// Override the policy for one tier.
    pub fn with_policy(mut self, tier: RateLimitTier, policy: TierPolicy) -> Self {
        self.policies.insert(tier, policy);
        self
    }

    /// Effective policy for a tier.
    pub fn policy(&self, tier: RateLimitTier) -> TierPolicy {
        self.policies
            .get(&tier)
            .cloned()
            .unwrap_or_else(|| TierPolicy::default_for(tier))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Decisions
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome of a rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// The tier's request limit.
    pub limit: u32,
    /// Requests left in the current window.
    pub remaining: u32,
    /// When the current window ends.
    pub reset_at: DateTime<Utc>,
    /// How long the caller should wait before retrying (denied only).
    pub retry_after: Option<Duration>,
    /// End of the active block, if any.
    pub blocked_until: Option<DateTime<Utc>>,
}

impl RateLimitDecision {
    /// Seconds to advertise in `Retry-After`, rounded up.
    pub fn retry_after_secs(&self) -> Option<u64> {
        self.retry_after.map(ceil_secs)
    }

    /// JSON body for a 429 response.
    pub fn error_body(&self, message: &str) -> Value {
        json!({
            "success": false,
            "error": {
                "message": message,
                "code": RATE_LIMIT_EXCEEDED,
                "retryAfter": self.retry_after_secs(),
                "resetTime": self.reset_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            },
        })
    }

    /// Response headers for this decision.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = vec![
            ("X-RateLimit-Limit", self.limit.to_string()),
            ("X-RateLimit-Remaining", self.remaining.to_string()),
            ("X-RateLimit-Reset", self.reset_at.timestamp().to_string()),
        ];
        if !self.allowed {
            let retry = self.retry_after_secs().unwrap_or(60);
            headers.push(("Retry-After", retry.to_string()));
        }
        headers
    }
}

/// Rate limiter statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStats {
    /// Records in the map.
    pub size: usize,
    /// Records currently blocked.
    pub blocked: usize,
}

// ─────────────────────────────────────────────────────────────────────────────
// Limiter
// ─────────────────────────────────────────────────────────────────────────────

/// Default duration for [`RateLimiter::block`].
pub const DEFAULT_BLOCK: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone)]
struct RequestRecord {
    count: u32,
    reset_at: Instant,
    blocked_until: Option<Instant>,
}

impl RequestRecord {
    fn is_blocked(&self, now: Instant) -> bool {
        self.blocked_until.is_some_and(|until| until > now)
    }
}

/// Shared tiered rate limiter. Cloning shares the records.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    records: Arc<Mutex<HashMap<String, RequestRecord>>>,
    config: Arc<RateLimitConfig>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            records: Arc::new(Mutex::new(HashMap::new())),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Count a request from `identifier` against `tier`.
    pub fn check(&self, identifier: &str, tier: RateLimitTier) -> RateLimitDecision {
        let policy = self.config.policy(tier);

        if !self.config.enabled {
            return RateLimitDecision {
                allowed: true,
                limit: policy.max_requests,
                remaining: policy.max_requests,
                reset_at: wall_clock_after(policy.window),
                retry_after: None,
                blocked_until: None,
            };
        }

        let key = record_key(identifier, tier);
        let now = Instant::now();
        let mut records = self.records.lock();

        if let Some(record) = records.get(&key).filter(|r| r.is_blocked(now)) {
            let until = record.blocked_until.unwrap_or(now);
            return RateLimitDecision {
                allowed: false,
                limit: policy.max_requests,
                remaining: 0,
                reset_at: wall_clock_at(record.reset_at, now),
                retry_after: Some(until.saturating_duration_since(now)),
                blocked_until: Some(wall_clock_at(until, now)),
            };
        }

        let fresh = RequestRecord {
            count: 0,
            reset_at: deadline(now, policy.window),
            blocked_until: None,
        };
        let record = records.entry(key).or_insert_with(|| fresh.clone());
        if record.reset_at < now {
            *record = fresh;
        }
        record.count = record.count.saturating_add(1);

        if record.count > policy.max_requests {
            let until = deadline(now, policy.block_duration);
            record.blocked_until = Some(until);
            warn!(
                identifier = %identifier,
                tier = %tier,
                block_secs = policy.block_duration.as_secs(),
                "Rate limit exceeded, blocking"
            );
            return RateLimitDecision {
                allowed: false,
                limit: policy.max_requests,
                remaining: 0,
                reset_at: wall_clock_at(record.reset_at, now),
                retry_after: Some(policy.block_duration),
                blocked_until: Some(wall_clock_at(until, now)),
            };
        }

        RateLimitDecision {
            allowed: true,
            limit: policy.max_requests,
            remaining: policy.max_requests.saturating_sub(record.count),
            reset_at: wall_clock_at(record.reset_at, now),
            retry_after: None,
            blocked_until: None,
        }
    }

    /// Like [`check`](Self::check), but a denial becomes [`Error::RateLimited`].
    pub fn enforce(&self, identifier: &str, tier: RateLimitTier) -> Result<RateLimitDecision> {
        let decision = self.check(identifier, tier);
        if decision.allowed {
            Ok(decision)
        } else {
            Err(Error::RateLimited {
                message: self.config.policy(tier).message,
                retry_after_secs: decision.retry_after_secs().unwrap_or(60),
            })
        }
    }

    /// Forget `identifier` for `tier`, lifting any block. Returns whether a record existed.
    pub fn reset(&self, identifier: &str, tier: RateLimitTier) -> bool {
        self.records
            .lock()
            .remove(&record_key(identifier, tier))
            .is_some()
    }

    /// Block `identifier` for `tier` for `duration` (default 24 hours).
    pub fn block(&self, identifier: &str, tier: RateLimitTier, duration: Option<Duration>) {
        let duration = duration.unwrap_or(DEFAULT_BLOCK);
        let now = Instant::now();
        let until = deadline(now, duration);

        self.records.lock().insert(
            record_key(identifier, tier),
            RequestRecord {
                count: u32::MAX,
                reset_at: until,
                blocked_until: Some(until),
            },
        );
        warn!(
            identifier = %identifier,
            tier = %tier,
            block_secs = duration.as_secs(),
            "Identifier blocked"
        );
    }

    pub fn stats(&self) -> RateLimitStats {
        let now = Instant::now();
        let records = self.records.lock();
        RateLimitStats {
            size: records.len(),
            blocked: records.values().filter(|r| r.is_blocked(now)).count(),
        }
    }

    /// Drop records whose window has ended and that are not blocked.
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let mut records = self.records.lock();
        let before = records.len();
        records.retain(|_, r| r.reset_at >= now || r.is_blocked(now));
        let removed = before - records.len();

        if removed > 0 {
            debug!(count = removed, "Cleaned up expired rate limit records");
        }

        removed
    }

    /// Drop every record.
    pub fn clear(&self) {
        self.records.lock().clear();
    }

    /// Run [`cleanup_expired`](Self::cleanup_expired) every `cleanup_interval`.
    ///
    /// Must be called from within a tokio runtime. Abort the handle to stop.
    pub fn spawn_cleanup(&self) -> tokio::task::JoinHandle<()> {
        let limiter = self.clone();
        let period = self.config.cleanup_interval.max(Duration::from_millis(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                limiter.cleanup_expired();
            }
        })
    }
}

/// Error code carried in 429 bodies.
pub const RATE_LIMIT_EXCEEDED: &str = "RATE_LIMIT_EXCEEDED";

/// Identifier used when no proxy header names the client.
pub const FALLBACK_IDENTIFIER: &str = "127.0.0.1";

/// Proxy headers naming the client, in order of precedence.
const CLIENT_IP_HEADERS: [&str; 3] = ["x-forwarded-for", "x-real-ip", "cf-connecting-ip"];

/// Rate limit identifier for a request, taken from proxy headers.
///
/// `header` looks a header up by lowercase name. The first hop of
/// `X-Forwarded-For` wins, then `X-Real-IP`, then `CF-Connecting-IP`.
/// Blank values are skipped. Without any of them the request counts as
/// [`FALLBACK_IDENTIFIER`].
pub fn client_identifier<'a>(header: impl Fn(&str) -> Option<&'a str>) -> String {
    CLIENT_IP_HEADERS
        .into_iter()
        .find_map(|name| {
            let first_hop = header(name)?.split(',').next()?.trim();
            (!first_hop.is_empty()).then(|| first_hop.to_string())
        })
        .unwrap_or_else(|| FALLBACK_IDENTIFIER.to_string())
}

fn record_key(identifier: &str, tier: RateLimitTier) -> String {
    format!("ratelimit:{tier}:{identifier}")
}

fn deadline(now: Instant, after: Duration) -> Instant {
    now.checked_add(after)
        .unwrap_or_else(|| now + Duration::from_secs(100 * 365 * 24 * 60 * 60))
}

fn wall_clock_at(instant: Instant, now: Instant) -> DateTime<Utc> {
    wall_clock_after(instant.saturating_duration_since(now))
}

fn wall_clock_after(after: Duration) -> DateTime<Utc> {
    let now = Utc::now();
    TimeDelta::from_std(after)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

fn ceil_secs(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn tight_policy(max_requests: u32, window_ms: u64, block_ms: u64) -> TierPolicy {
        TierPolicy {
            max_requests,
            window: Duration::from_millis(window_ms),
            block_duration: Duration::from_millis(block_ms),
            message: "slow down".to_string(),
        }
    }

    #[test]
    fn test_auth_tier_blocks_after_five() {
        let limiter = RateLimiter::new(RateLimitConfig::default());

        for expected_remaining in (0..5).rev() {
            let decision = limiter.check("10.0.0.1", RateLimitTier::Auth);
            assert!(decision.allowed);
            assert_eq!(decision.remaining, expected_remaining);
        }

        let denied = limiter.check("10.0.0.1", RateLimitTier::Auth);
        assert!(!denied.allowed);
        assert_eq!(denied.retry_after, Some(Duration::from_secs(3600)));
        assert_eq!(denied.retry_after_secs(), Some(3600));
        assert!(denied.blocked_until.is_some());

        // Stays blocked
        let again = limiter.check("10.0.0.1", RateLimitTier::Auth);
        assert!(!again.allowed);
        assert_eq!(limiter.stats().blocked, 1);
    }

    #[test]
    fn test_tiers_and_identifiers_are_isolated() {
        let config = RateLimitConfig::new()
            .with_policy(RateLimitTier::Auth, tight_policy(1, 60_000, 60_000));
        let limiter = RateLimiter::new(config);

        assert!(limiter.check("a", RateLimitTier::Auth).allowed);
        assert!(!limiter.check("a", RateLimitTier::Auth).allowed);

        assert!(limiter.check("b", RateLimitTier::Auth).allowed);
        assert!(limiter.check("a", RateLimitTier::ApiRead).allowed);
    }

    #[test]
    fn test_window_resets() {
        let config = RateLimitConfig::new()
            .with_policy(RateLimitTier::Public, tight_policy(2, 30, 0));
        let limiter = RateLimiter::new(config);

        assert!(limiter.check("a", RateLimitTier::Public).allowed);
        assert!(limiter.check("a", RateLimitTier::Public).allowed);

        thread::sleep(Duration::from_millis(60));

        let decision = limiter.check("a", RateLimitTier::Public);
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 1);
    }

    #[test]
    fn test_reset_lifts_block() {
        let config = RateLimitConfig::new()
            .with_policy(RateLimitTier::Auth, tight_policy(1, 60_000, 60_000));
        let limiter = RateLimiter::new(config);

        limiter.check("a", RateLimitTier::Auth);
        assert!(!limiter.check("a", RateLimitTier::Auth).allowed);

        assert!(limiter.reset("a", RateLimitTier::Auth));
        assert!(limiter.check("a", RateLimitTier::Auth).allowed);
    }

    #[test]
    fn test_manual_block() {
        let limiter = RateLimiter::new(RateLimitConfig::default());
        limiter.block("bad-actor", RateLimitTier::Public, None);

        let decision = limiter.check("bad-actor", RateLimitTier::Public);
        assert!(!decision.allowed);
        assert!(decision.retry_after.unwrap() > Duration::from_secs(23 * 60 * 60));
    }

    #[test]
    fn test_disabled_always_allows() {
        let config = RateLimitConfig::new()
            .with_enabled(false)
            .with_policy(RateLimitTier::Auth, tight_policy(1, 60_000, 60_000));
        let limiter = RateLimiter::new(config);

        for _ in 0..10 {
            assert!(limiter.check("a", RateLimitTier::Auth).allowed);
        }
        assert_eq!(limiter.stats().size, 0);
    }

    #[test]
    fn test_enforce_maps_to_error() {
        let config = RateLimitConfig::new()
            .with_policy(RateLimitTier::Admin, tight_policy(1, 60_000, 2_500));
        let limiter = RateLimiter::new(config);

        assert!(limiter.enforce("a", RateLimitTier::Admin).is_ok());
        let err = limiter.enforce("a", RateLimitTier::Admin).unwrap_err();
        match err {
            Error::RateLimited {
                message,
                retry_after_secs,
            } => {
                assert_eq!(message, "slow down");
                assert_eq!(retry_after_secs, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_cleanup_expired_keeps_blocked_records() {
        let config = RateLimitConfig::new()
            .with_policy(RateLimitTier::Public, tight_policy(1, 20, 60_000))
            .with_policy(RateLimitTier::ApiRead, tight_policy(10, 20, 0));
        let limiter = RateLimiter::new(config);

        limiter.check("blocked", RateLimitTier::Public);
        limiter.check("blocked", RateLimitTier::Public);
        limiter.check("idle", RateLimitTier::ApiRead);

        thread::sleep(Duration::from_millis(50));

        assert_eq!(limiter.cleanup_expired(), 1);
        assert_eq!(
            limiter.stats(),
            RateLimitStats {
                size: 1,
                blocked: 1
            }
        );
    }

    #[test]
    fn test_headers() {
        let limiter = RateLimiter::new(RateLimitConfig::default());
        let decision = limiter.check("a", RateLimitTier::ApiRead);
        let headers = decision.headers();

        assert!(headers.contains(&("X-RateLimit-Limit", "300".to_string())));
        assert!(headers.contains(&("X-RateLimit-Remaining", "299".to_string())));
        assert!(!headers.iter().any(|(name, _)| *name == "Retry-After"));
    }

    #[test]
    fn test_tier_from_path() {
        assert_eq!(
            RateLimitTier::from_path("/api/auth/login", "POST"),
            RateLimitTier::Auth
        );
        assert_eq!(
            RateLimitTier::from_path("/reset-password", "GET"),
            RateLimitTier::Auth
        );
        assert_eq!(
            RateLimitTier::from_path("/api/admin/users", "GET"),
            RateLimitTier::Admin
        );
        assert_eq!(
            RateLimitTier::from_path("/api/courses", "post"),
            RateLimitTier::ApiMutation
        );
        assert_eq!(
            RateLimitTier::from_path("/api/courses", "GET"),
            RateLimitTier::ApiRead
        );
        assert_eq!(
            RateLimitTier::from_path("/courses/rust", "GET"),
            RateLimitTier::Public
        );
    }

    #[test]
    fn test_tier_parse() {
        assert_eq!(
            "api_read".parse::<RateLimitTier>(),
            Ok(RateLimitTier::ApiRead)
        );
        assert!("bogus".parse::<RateLimitTier>().is_err());
    }

    #[tokio::test]
    async fn test_spawned_cleanup_runs() {
        let config = RateLimitConfig::new()
            .with_cleanup_interval(Duration::from_millis(20))
            .with_policy(RateLimitTier::Public, tight_policy(10, 10, 0));
        let limiter = RateLimiter::new(config);
        limiter.check("a", RateLimitTier::Public);

        let handle = limiter.spawn_cleanup();
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.abort();

        assert_eq!(limiter.stats().size, 0);
    }

    fn headers_from<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<&'a str> {
        move |name: &str| {
            pairs
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| *value)
        }
    }

    #[test]
    fn test_client_identifier_prefers_forwarded_for() {
        let pairs = [
            ("X-Forwarded-For", " 203.0.113.7 , 10.0.0.2"),
            ("X-Real-IP", "198.51.100.1"),
            ("CF-Connecting-IP", "192.0.2.9"),
        ];
        assert_eq!(client_identifier(headers_from(&pairs)), "203.0.113.7");
    }

    #[test]
    fn test_client_identifier_falls_through_headers() {
        let pairs = [("X-Real-IP", " 198.51.100.1 "), ("CF-Connecting-IP", "192.0.2.9")];
        assert_eq!(client_identifier(headers_from(&pairs)), "198.51.100.1");

        let pairs = [("CF-Connecting-IP", "192.0.2.9")];
        assert_eq!(client_identifier(headers_from(&pairs)), "192.0.2.9");

        let pairs = [("X-Forwarded-For", "  "), ("CF-Connecting-IP", "192.0.2.9")];
        assert_eq!(client_identifier(headers_from(&pairs)), "192.0.2.9");
    }

    #[test]
    fn test_client_identifier_fallback() {
        assert_eq!(client_identifier(headers_from(&[])), FALLBACK_IDENTIFIER);
        assert_eq!(
            client_identifier(headers_from(&[("User-Agent", "curl/8.0")])),
            "127.0.0.1"
        );
    }

    #[test]
    fn test_error_body_for_denial() {
        let limiter = RateLimiter::new(RateLimitConfig::default());
        limiter.block("10.0.0.9", RateLimitTier::Admin, Some(Duration::from_secs(90)));

        let denied = limiter.check("10.0.0.9", RateLimitTier::Admin);
        let body = denied.error_body("Too many administrative requests. Try again later.");

        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], RATE_LIMIT_EXCEEDED);
        assert_eq!(body["error"]["retryAfter"], 90);
        assert_eq!(
            body["error"]["message"],
            "Too many administrative requests. Try again later."
        );
        let reset = body["error"]["resetTime"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(reset).is_ok());
        assert!(reset.ends_with('Z'));
    }
}
