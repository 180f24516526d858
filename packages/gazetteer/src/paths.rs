//! Canonical file paths for gazetteer data.
//!
//! Paths are relative to the project root's `data/` directory unless
//! `GEOSCRUB_DATA_DIR` points elsewhere.

use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "GEOSCRUB_DATA_DIR";

/// Default snapshot file name inside the data directory.
pub const DEFAULT_SNAPSHOT_NAME: &str = "gazetteer.msgpack.zst";

/// Default config file name inside the data directory.
pub const DEFAULT_CONFIG_NAME: &str = "geoscrub.toml";

/// Returns the workspace root directory.
///
/// Resolved at compile time from `CARGO_MANIFEST_DIR`.
///
/// # Panics
///
/// Panics if the project root cannot be resolved.
#[must_use]
pub fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .expect("Failed to find project root from CARGO_MANIFEST_DIR")
        .to_path_buf()
}

/// Returns the data directory.
#[must_use]
pub fn data_dir() -> PathBuf {
    std::env::var_os(DATA_DIR_ENV)
        .filter(|v| !v.is_empty())
        .map_or_else(|| project_root().join("data"), PathBuf::from)
}

/// Returns the default snapshot path.
#[must_use]
pub fn default_snapshot_path() -> PathBuf {
    data_dir().join(DEFAULT_SNAPSHOT_NAME)
}

/// Returns the default config file path.
#[must_use]
pub fn default_config_path() -> PathBuf {
    data_dir().join(DEFAULT_CONFIG_NAME)
}

/// Ensures a directory exists, creating it if necessary.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
