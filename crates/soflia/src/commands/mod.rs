//! CLI command handlers.

pub mod config;
pub mod ratelimit;
pub mod replay;

use std::path::PathBuf;

use soflia_cache::CacheContext;
use soflia_config::LoadedConfig;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
    /// Explicit user config directory from `--config-dir`.
    pub config_dir: Option<PathBuf>,
    /// Configuration discovered at startup.
    pub loaded: LoadedConfig,
}

impl Context {
    /// Directory holding the user config file.
    pub fn user_config_dir(&self) -> Option<PathBuf> {
        self.config_dir.clone().or_else(soflia_config::config_dir)
    }

    /// Build a fresh cache context from the loaded configuration.
    pub fn cache_context(&self) -> CacheContext {
        let config = &self.loaded.config;
        CacheContext::new(config.cache_config(), config.rate_limit_config())
    }
}
