//! Configuration loading.
//!
//! The config file is TOML. Its path comes from `GEOSCRUB_CONFIG`, falling
//! back to `geoscrub.toml` in the data directory. A missing or empty file
//! yields the defaults.

use std::path::{Path, PathBuf};

use geoscrub_gazetteer_models::GazetteerConfig;

use crate::{GazetteerError, paths};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "GEOSCRUB_CONFIG";

/// Path of the config file to load.
#[must_use]
pub fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .filter(|v| !v.is_empty())
        .map_or_else(paths::default_config_path, PathBuf::from)
}

/// Loads the config from [`config_path`].
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config() -> Result<GazetteerConfig, GazetteerError> {
    load_config_from(&config_path())
}

/// Loads the config from `path`.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config_from(path: &Path) -> Result<GazetteerConfig, GazetteerError> {
    if !path.exists() {
        log::warn!("{} does not exist, using default config", path.display());
        return Ok(GazetteerConfig::default());
    }

    let contents = std::fs::read_to_string(path)?;
    let config: GazetteerConfig =
        toml::from_str(&contents).map_err(|e| GazetteerError::Config {
            path: path.display().to_string(),
            source: e,
        })?;

    log::debug!("Loaded config from {}: {config:?}", path.display());
    Ok(config)
}

/// Snapshot path configured in `config`, or the default.
#[must_use]
pub fn snapshot_path(config: &GazetteerConfig) -> PathBuf {
    config
        .snapshot_path
        .as_ref()
        .map_or_else(paths::default_snapshot_path, PathBuf::from)
}
