//! Locating, layering and writing config files.
//!
//! Two layers are read, the second overriding the first:
//! the user file `<config dir>/config.toml` and the project file
//! `./aily.toml`. Command-line flags are applied by the caller.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::secrets::AUTH_TOKEN_ENV;
use crate::{ClientConfig, ConfigError, Result};

const USER_FILE: &str = "config.toml";
const PROJECT_FILE: &str = "aily.toml";
const CONFIG_DIR_ENV: &str = "AILY_CONFIG_DIR";

/// One place a config file can live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayer {
    /// Per-user file in the config directory.
    User,
    /// `aily.toml` in the project directory.
    Project,
}

impl fmt::Display for ConfigLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigLayer::User => f.write_str("user"),
            ConfigLayer::Project => f.write_str("project"),
        }
    }
}

/// What happened when a layer was read.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    pub layer: ConfigLayer,
    pub path: PathBuf,
    /// The file existed and parsed.
    pub loaded: bool,
    /// The file sets `auth_token` in plaintext.
    pub plaintext_token: bool,
}

/// Merged configuration plus where it came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: ClientConfig,
    /// Every layer checked, lowest precedence first.
    pub sources: Vec<ConfigSource>,
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    /// Paths of the layers that were actually read.
    pub fn loaded_from(&self) -> Vec<&Path> {
        self.sources
            .iter()
            .filter(|s| s.loaded)
            .map(|s| s.path.as_path())
            .collect()
    }
}

/// Discover and merge config from the default user dir and the current
/// directory (or `project_dir`).
pub fn load_config(project_dir: Option<&Path>) -> Result<LoadedConfig> {
    load_config_with_options(project_dir, None)
}

/// Like [`load_config`], with `config_dir` replacing the user config dir.
pub fn load_config_with_options(
    project_dir: Option<&Path>,
    config_dir: Option<&Path>,
) -> Result<LoadedConfig> {
    let mut loaded = LoadedConfig {
        config: ClientConfig::new(),
        sources: Vec::new(),
        warnings: Vec::new(),
    };

    let layers = [
        (ConfigLayer::User, user_file(config_dir)),
        (ConfigLayer::Project, Some(project_file(project_dir))),
    ];
    for (layer, path) in layers {
        let Some(path) = path else { continue };
        let source = read_layer(layer, path, &mut loaded);
        loaded.sources.push(source);
    }

    for source in loaded.sources.iter().filter(|s| s.plaintext_token) {
        loaded.warnings.push(format!(
            "{} contains a plaintext auth_token. \
             Consider setting the {} environment variable instead.",
            source.path.display(),
            AUTH_TOKEN_ENV
        ));
    }

    Ok(loaded)
}

/// Parse a single config file.
pub fn load_config_file(path: &Path) -> Result<ClientConfig> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.display().to_string(),
        source,
    })?;
    ClientConfig::from_toml(&text)
}

/// Write `config` to `path`, creating missing parent directories.
pub fn save_config(config: &ClientConfig, path: &Path) -> Result<()> {
    let write_err = |path: &Path, source| ConfigError::WriteFile {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| write_err(parent, e))?;
    }
    std::fs::write(path, config.to_toml()?).map_err(|e| write_err(path, e))
}

/// File backing `layer`. `None` when no user config dir can be found.
pub fn layer_path(layer: ConfigLayer) -> Option<PathBuf> {
    match layer {
        ConfigLayer::User => user_file(None),
        ConfigLayer::Project => Some(project_file(None)),
    }
}

/// `<config dir>/config.toml`.
pub fn xdg_config_path() -> Option<PathBuf> {
    user_file(None)
}

/// `$AILY_CONFIG_DIR` when set and non-empty, else the platform config
/// dir joined with `aily`.
pub fn xdg_config_dir() -> Option<PathBuf> {
    match std::env::var(CONFIG_DIR_ENV) {
        Ok(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => dirs::config_dir().map(|d| d.join("aily")),
    }
}

fn user_file(config_dir: Option<&Path>) -> Option<PathBuf> {
    match config_dir {
        Some(dir) => Some(dir.join(USER_FILE)),
        None => xdg_config_dir().map(|d| d.join(USER_FILE)),
    }
}

fn project_file(project_dir: Option<&Path>) -> PathBuf {
    project_dir.map_or_else(|| PathBuf::from(PROJECT_FILE), |d| d.join(PROJECT_FILE))
}

/// Merge one layer into `loaded`. Unreadable files become warnings.
fn read_layer(layer: ConfigLayer, path: PathBuf, loaded: &mut LoadedConfig) -> ConfigSource {
    let mut source = ConfigSource {
        layer,
        path,
        loaded: false,
        plaintext_token: false,
    };
    if !source.path.is_file() {
        return source;
    }

    match load_config_file(&source.path) {
        Ok(config) => {
            source.loaded = true;
            source.plaintext_token = config.has_plaintext_auth_token();
            loaded.config.merge(config);
        }
        Err(e) => loaded
            .warnings
            .push(format!("Failed to load {}: {}", source.path.display(), e)),
    }
    source
}
