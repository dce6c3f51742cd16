//! Layered discovery of SofLIA config files.
//!
//! Layers, lowest precedence first:
//! 1. [`ConfigLayer::User`]: `config.toml` in the config dir (`--config-dir`,
//!    then `SOFLIA_CONFIG_DIR`, then the platform config dir plus `soflia`)
//! 2. [`ConfigLayer::Project`]: `soflia.toml` in the project directory
//!
//! A layer that cannot be read or parsed is skipped whole. A layer that
//! parses but has an unusable section keeps its other sections; the bad
//! section is reported and the lower layer (or the default) stays in effect.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::{ConfigError, Result, SofliaConfig};

const PROJECT_CONFIG_FILE: &str = "soflia.toml";
const USER_CONFIG_FILE: &str = "config.toml";
const APP_NAME: &str = "soflia";
const CONFIG_DIR_ENV: &str = "SOFLIA_CONFIG_DIR";

/// Which layer a config file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayer {
    User,
    Project,
}

impl ConfigLayer {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigLayer::User => "user",
            ConfigLayer::Project => "project",
        }
    }
}

impl fmt::Display for ConfigLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One config file that discovery looked at.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    pub layer: ConfigLayer,
    pub path: PathBuf,
    /// Whether any of the file made it into the merged config.
    pub loaded: bool,
}

/// Merged configuration plus what went into it.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: SofliaConfig,
    /// Files checked, lowest precedence first.
    pub sources: Vec<ConfigSource>,
    /// Skipped files and dropped sections, one line each.
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    /// Paths of the files that contributed to the config.
    pub fn loaded_from(&self) -> Vec<&Path> {
        self.sources
            .iter()
            .filter(|s| s.loaded)
            .map(|s| s.path.as_path())
            .collect()
    }

    /// The file checked for `layer`, if that layer had a location at all.
    pub fn source(&self, layer: ConfigLayer) -> Option<&ConfigSource> {
        self.sources.iter().find(|s| s.layer == layer)
    }
}

/// Discover and merge the config layers with the default config dir.
pub fn load_config(project_dir: Option<&Path>) -> Result<LoadedConfig> {
    load_config_with_options(project_dir, None)
}

/// Discover and merge the config layers.
///
/// `project_dir` defaults to the current directory. `config_dir` takes
/// precedence over `SOFLIA_CONFIG_DIR` and the platform default.
pub fn load_config_with_options(
    project_dir: Option<&Path>,
    config_dir: Option<&Path>,
) -> Result<LoadedConfig> {
    let user_path = config_dir
        .map(|dir| dir.join(USER_CONFIG_FILE))
        .or_else(user_config_path);
    let project_path = project_dir
        .map(|dir| dir.join(PROJECT_CONFIG_FILE))
        .unwrap_or_else(|| PathBuf::from(PROJECT_CONFIG_FILE));

    let layers = [
        (ConfigLayer::User, user_path),
        (ConfigLayer::Project, Some(project_path)),
    ];

    let mut loaded = LoadedConfig {
        config: SofliaConfig::new(),
        sources: Vec::new(),
        warnings: Vec::new(),
    };
    for (layer, path) in layers {
        let Some(path) = path else {
            continue;
        };
        let source = merge_layer(&mut loaded, layer, path);
        loaded.sources.push(source);
    }

    Ok(loaded)
}

/// Read, parse and validate a single config file.
///
/// Unlike discovery, any invalid section fails the whole file.
pub fn load_config_file(path: &Path) -> Result<SofliaConfig> {
    let config = parse_file(path)?;
    config.validate()?;
    Ok(config)
}

/// Write `config` to `path`, creating parent directories.
pub fn save_config(config: &SofliaConfig, path: &Path) -> Result<()> {
    let write_error = |path: &Path, source| ConfigError::WriteFile {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| write_error(parent, e))?;
    }
    std::fs::write(path, config.to_toml()?).map_err(|e| write_error(path, e))
}

/// Location of the user config file.
pub fn user_config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(USER_CONFIG_FILE))
}

/// The SofLIA config directory: `SOFLIA_CONFIG_DIR` if set and non-empty,
/// else the platform config dir plus `soflia`.
pub fn config_dir() -> Option<PathBuf> {
    match std::env::var(CONFIG_DIR_ENV) {
        Ok(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => dirs::config_dir().map(|dir| dir.join(APP_NAME)),
    }
}

fn parse_file(path: &Path) -> Result<SofliaConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(toml::from_str(&contents)?)
}

fn merge_layer(loaded: &mut LoadedConfig, layer: ConfigLayer, path: PathBuf) -> ConfigSource {
    let mut source = ConfigSource {
        layer,
        path,
        loaded: false,
    };
    if !source.path.is_file() {
        return source;
    }

    match parse_file(&source.path) {
        Ok(mut layer_config) => {
            for problem in layer_config.drop_invalid_sections() {
                loaded.warnings.push(format!(
                    "{} ({layer}): {problem}; section ignored",
                    source.path.display()
                ));
            }
            loaded.config.merge(layer_config);
            source.loaded = true;
        }
        Err(e) => loaded
            .warnings
            .push(format!("Failed to load {}: {}", source.path.display(), e)),
    }

    source
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// Project and user dirs with the given file contents.
    fn layout(user: Option<&str>, project: Option<&str>) -> (TempDir, TempDir) {
        let user_dir = TempDir::new().unwrap();
        let project_dir = TempDir::new().unwrap();
        if let Some(contents) = user {
            fs::write(user_dir.path().join("config.toml"), contents).unwrap();
        }
        if let Some(contents) = project {
            fs::write(project_dir.path().join("soflia.toml"), contents).unwrap();
        }
        (user_dir, project_dir)
    }

    fn load(user_dir: &TempDir, project_dir: &TempDir) -> LoadedConfig {
        load_config_with_options(Some(project_dir.path()), Some(user_dir.path())).unwrap()
    }

    #[test]
    fn test_load_config_file() {
        let (user_dir, _) = layout(Some("[scorm]\nsession_ttl_secs = 120\n"), None);
        let config = load_config_file(&user_dir.path().join("config.toml")).unwrap();
        assert_eq!(config.scorm.unwrap().session_ttl_secs, 120);
    }

    #[test]
    fn test_load_config_file_errors() {
        let err = load_config_file(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));

        let (user_dir, _) = layout(Some("this is not valid toml {{{{"), None);
        let err = load_config_file(&user_dir.path().join("config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));

        let (user_dir, _) = layout(Some("[scorm]\nmax_value_len = 0\n"), None);
        let err = load_config_file(&user_dir.path().join("config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_no_files_gives_defaults() {
        let (user_dir, project_dir) = layout(None, None);
        let loaded = load(&user_dir, &project_dir);

        assert_eq!(loaded.config, SofliaConfig::new());
        assert!(loaded.loaded_from().is_empty());
        assert!(loaded.warnings.is_empty());
        assert_eq!(loaded.sources.len(), 2);
        assert!(!loaded.source(ConfigLayer::User).unwrap().loaded);
    }

    #[test]
    fn test_project_overrides_user() {
        let (user_dir, project_dir) = layout(
            Some("[cache]\ndefault_ttl_secs = 30\n\n[scorm]\nsession_ttl_secs = 100\n"),
            Some("[scorm]\nsession_ttl_secs = 900\n"),
        );
        let loaded = load(&user_dir, &project_dir);

        assert_eq!(loaded.config.scorm.as_ref().unwrap().session_ttl_secs, 900);
        assert_eq!(loaded.config.cache.as_ref().unwrap().default_ttl_secs, 30);
        assert_eq!(loaded.loaded_from().len(), 2);
        assert_eq!(
            loaded.source(ConfigLayer::Project).unwrap().path,
            project_dir.path().join("soflia.toml")
        );
    }

    #[test]
    fn test_unparseable_layer_is_skipped() {
        let (user_dir, project_dir) = layout(
            Some("[cache]\ndefault_ttl_secs = 30\n"),
            Some("not valid toml {{{{"),
        );
        let loaded = load(&user_dir, &project_dir);

        assert_eq!(loaded.warnings.len(), 1);
        assert!(loaded.warnings[0].starts_with("Failed to load"));
        assert!(!loaded.source(ConfigLayer::Project).unwrap().loaded);
        assert_eq!(loaded.config.cache.unwrap().default_ttl_secs, 30);
    }

    #[test]
    fn test_invalid_section_falls_back_to_lower_layer() {
        let (user_dir, project_dir) = layout(
            Some("[scorm]\nmax_value_len = 2048\n"),
            Some("[cache]\ndefault_ttl_secs = 15\n\n[scorm]\nmax_value_len = 0\n"),
        );
        let loaded = load(&user_dir, &project_dir);

        assert_eq!(loaded.warnings.len(), 1);
        assert!(loaded.warnings[0].contains("(project)"));
        assert!(loaded.warnings[0].contains("scorm.max_value_len"));

        // The rest of the project file still applies
        assert!(loaded.source(ConfigLayer::Project).unwrap().loaded);
        assert_eq!(loaded.config.cache.as_ref().unwrap().default_ttl_secs, 15);
        assert_eq!(loaded.config.scorm.as_ref().unwrap().max_value_len, 2048);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = SofliaConfig::new().resolved();

        save_config(&config, &path).unwrap();
        assert_eq!(load_config_file(&path).unwrap(), config);
    }
}
