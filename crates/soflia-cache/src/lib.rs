//! In-memory runtime caches for the SofLIA learning platform.
//!
//! This crate provides:
//! - [`TtlCache`]: a generic key/value cache with per-entry expiry and lazy
//!   eviction on read
//! - [`ScormSessionStore`]: per-attempt CMI values for in-progress SCORM
//!   sessions, cleared on `Terminate`
//! - [`ScormRuntime`]: the authorized, validating caller in front of the store
//! - [`RateLimiter`]: tiered request limiting keyed by client identifier
//! - [`CacheContext`]: one owner for all of the above per process
//!
//! None of these are a system of record. Losing them costs a recomputation
//! or a stale SCORM field, never persistent state.
//!
//! # Example
//!
//! ```rust,ignore
//! use soflia_cache::{CacheConfig, CacheContext, RateLimitConfig};
//!
//! let ctx = CacheContext::new(CacheConfig::default(), RateLimitConfig::default());
//! ctx.scorm().set_session_value("attempt-1", "cmi.core.lesson_status", "completed");
//! ```

pub mod cmi;
mod config;
mod context;
mod error;
mod persistence;
pub mod ratelimit;
mod runtime;
mod scorm;
mod ttl;

pub use config::CacheConfig;
pub use context::CacheContext;
pub use error::{Error, Result};
pub use persistence::{AttemptStore, InMemoryAttempts};
pub use ratelimit::{
    RateLimitConfig, RateLimitDecision, RateLimitStats, RateLimitTier, RateLimiter, TierPolicy,
    client_identifier,
};
pub use runtime::ScormRuntime;
pub use scorm::{CmiValues, ScormSessionStore};
pub use ttl::{CacheStats, TtlCache};
