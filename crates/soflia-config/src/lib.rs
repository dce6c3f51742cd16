//! Configuration system for the SofLIA runtime caches.
//!
//! Provides TOML-based configuration with:
//! - `[cache]`, `[scorm]`, `[rate_limit]` and `[logging]` sections
//! - Config file layering (user config dir + project-local overrides)
//! - Conversion into the runtime configs of `soflia-cache`

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    config_dir, load_config, load_config_file, load_config_with_options, save_config,
    user_config_path, ConfigLayer, ConfigSource, LoadedConfig,
};
pub use error::{ConfigError, Result};
pub use types::*;
