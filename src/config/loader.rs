// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw
/// `RawConfigFile`.
///
/// A missing file is not an error: the project simply uses the built-in
/// defaults. This only performs TOML deserialization; use
/// [`load_and_validate`] for semantic checks.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();

    if !path.exists() {
        debug!(?path, "no config file found; using defaults");
        return Ok(RawConfigFile::default());
    }

    let contents = fs::read_to_string(path)?;
    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run validation.
///
/// - Reads TOML (if present).
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks queue sanity, lint rule names, script target and the
///   script/template ordering manifests.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Default config location: `Assetflow.toml` in the working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Assetflow.toml")
}
