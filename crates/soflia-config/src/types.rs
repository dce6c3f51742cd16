//! Configuration types.
//!
//! ```toml
//! [cache]
//! default_ttl_secs = 300
//!
//! [scorm]
//! session_ttl_secs = 7200
//! max_value_len = 64000
//!
//! [rate_limit]
//! enabled = true
//! cleanup_interval_secs = 300
//!
//! [rate_limit.tiers.auth]
//! max_requests = 5
//! window_secs = 900
//! block_secs = 3600
//!
//! [logging]
//! level = "info"
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use soflia_cache::{CacheConfig, RateLimitConfig, RateLimitTier, TierPolicy};

use crate::error::{ConfigError, Result};

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g. project-local
/// overrides) can be loaded and merged section by section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SofliaConfig {
    /// Generic TTL cache settings.
    pub cache: Option<CacheSection>,

    /// SCORM session store settings.
    pub scorm: Option<ScormSection>,

    /// Rate limiter settings.
    pub rate_limit: Option<RateLimitSection>,

    /// Log output settings.
    pub logging: Option<LoggingSection>,
}

impl SofliaConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: SofliaConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one. Sections present in `other` win.
    pub fn merge(&mut self, other: SofliaConfig) {
        if other.cache.is_some() {
            self.cache = other.cache;
        }

        if other.scorm.is_some() {
            self.scorm = other.scorm;
        }

        if other.rate_limit.is_some() {
            self.rate_limit = other.rate_limit;
        }

        if other.logging.is_some() {
            self.logging = other.logging;
        }
    }

    /// Copy with every missing section filled in with defaults.
    pub fn resolved(&self) -> Self {
        Self {
            cache: Some(self.cache.clone().unwrap_or_default()),
            scorm: Some(self.scorm.clone().unwrap_or_default()),
            rate_limit: Some(self.rate_limit.clone().unwrap_or_default()),
            logging: Some(self.logging.clone().unwrap_or_default()),
        }
    }

    /// Check values that parse but cannot be used.
    pub fn validate(&self) -> Result<()> {
        if let Some(scorm) = &self.scorm {
            scorm.validate()?;
        }
        if let Some(rate_limit) = &self.rate_limit {
            rate_limit.validate()?;
        }
        if let Some(logging) = &self.logging {
            logging.validate()?;
        }
        Ok(())
    }

    /// Remove every section that fails validation, returning why each went.
    ///
    /// Sections are independent, so one bad value does not discard the
    /// rest of a file.
    pub fn drop_invalid_sections(&mut self) -> Vec<ConfigError> {
        let mut problems = Vec::new();

        if let Some(Err(e)) = self.scorm.as_ref().map(ScormSection::validate) {
            self.scorm = None;
            problems.push(e);
        }
        if let Some(Err(e)) = self.rate_limit.as_ref().map(RateLimitSection::validate) {
            self.rate_limit = None;
            problems.push(e);
        }
        if let Some(Err(e)) = self.logging.as_ref().map(LoggingSection::validate) {
            self.logging = None;
            problems.push(e);
        }

        problems
    }

    /// Runtime settings for the cache context.
    pub fn cache_config(&self) -> CacheConfig {
        let cache = self.cache.clone().unwrap_or_default();
        let scorm = self.scorm.clone().unwrap_or_default();

        CacheConfig::new()
            .with_default_ttl(Duration::from_secs(cache.default_ttl_secs))
            .with_scorm_session_ttl(Duration::from_secs(scorm.session_ttl_secs))
            .with_max_value_len(scorm.max_value_len)
    }

    /// Runtime settings for the rate limiter.
    ///
    /// Tier sections only override the fields they set. Unknown tier names
    /// are rejected by [`validate`](Self::validate) and skipped here.
    pub fn rate_limit_config(&self) -> RateLimitConfig {
        let section = self.rate_limit.clone().unwrap_or_default();
        let mut config = RateLimitConfig::new()
            .with_enabled(section.enabled)
            .with_cleanup_interval(Duration::from_secs(section.cleanup_interval_secs));

        for (name, overrides) in section.tiers {
            let Ok(tier) = name.parse::<RateLimitTier>() else {
                continue;
            };
            config = config.with_policy(tier, overrides.apply(TierPolicy::default_for(tier)));
        }

        config
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cache
// ─────────────────────────────────────────────────────────────────────────────

/// Generic TTL cache configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    /// TTL in seconds for entries stored without an explicit TTL.
    pub default_ttl_secs: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            default_ttl_secs: CacheConfig::default().default_ttl.as_secs(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SCORM
// ─────────────────────────────────────────────────────────────────────────────

/// SCORM session store configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScormSection {
    /// Seconds an attempt's cached values survive without a write.
    pub session_ttl_secs: u64,
    /// Maximum characters kept from a sanitized value.
    pub max_value_len: usize,
}

impl ScormSection {
    fn validate(&self) -> Result<()> {
        if self.max_value_len == 0 {
            return Err(invalid("scorm.max_value_len", "must be greater than zero"));
        }
        Ok(())
    }
}

impl Default for ScormSection {
    fn default() -> Self {
        let defaults = CacheConfig::default();
        Self {
            session_ttl_secs: defaults.scorm_session_ttl.as_secs(),
            max_value_len: defaults.max_value_len,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rate limiting
// ─────────────────────────────────────────────────────────────────────────────

/// Rate limiter configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSection {
    /// Enable rate limiting.
    pub enabled: bool,
    /// Seconds between sweeps of expired records.
    pub cleanup_interval_secs: u64,
    /// Per-tier overrides keyed by tier name (`auth`, `admin`, `api_mutation`,
    /// `api_read`, `public`).
    pub tiers: BTreeMap<String, TierSection>,
}

impl RateLimitSection {
    fn validate(&self) -> Result<()> {
        for (name, tier) in &self.tiers {
            let field = |f: &str| format!("rate_limit.tiers.{name}.{f}");
            name.parse::<RateLimitTier>()
                .map_err(|reason| invalid(&format!("rate_limit.tiers.{name}"), &reason))?;
            if tier.max_requests == Some(0) {
                return Err(invalid(&field("max_requests"), "must be greater than zero"));
            }
            if tier.window_secs == Some(0) {
                return Err(invalid(&field("window_secs"), "must be greater than zero"));
            }
        }
        Ok(())
    }
}

impl Default for RateLimitSection {
    fn default() -> Self {
        let defaults = RateLimitConfig::default();
        Self {
            enabled: defaults.enabled,
            cleanup_interval_secs: defaults.cleanup_interval.as_secs(),
            tiers: BTreeMap::new(),
        }
    }
}

/// Partial override of one tier's policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierSection {
    pub max_requests: Option<u32>,
    pub window_secs: Option<u64>,
    pub block_secs: Option<u64>,
    pub message: Option<String>,
}

impl TierSection {
    /// Overlay the fields this section sets on `base`.
    pub fn apply(&self, base: TierPolicy) -> TierPolicy {
        TierPolicy {
            max_requests: self.max_requests.unwrap_or(base.max_requests),
            window: self
                .window_secs
                .map(Duration::from_secs)
                .unwrap_or(base.window),
            block_duration: self
                .block_secs
                .map(Duration::from_secs)
                .unwrap_or(base.block_duration),
            message: self.message.clone().unwrap_or(base.message),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging
// ─────────────────────────────────────────────────────────────────────────────

/// Log output configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Console filter level for SofLIA targets.
    pub level: String,
    /// Directory for the rolling JSON log. Defaults to `<config dir>/logs`.
    pub dir: Option<PathBuf>,
    /// Write the JSON log file at all.
    pub file: bool,
}

/// Levels accepted by `[logging] level`.
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl LoggingSection {
    fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.level.as_str()) {
            return Err(invalid(
                "logging.level",
                &format!("expected one of {}", LOG_LEVELS.join(", ")),
            ));
        }
        Ok(())
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
            file: true,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
