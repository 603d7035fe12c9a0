// src/errors.rs

//! Crate-wide error type.
//!
//! Startup and wiring code returns [`Result`]. Per-file transform failures are
//! not errors: they are reported as values (`tasks::StepFailure`) so a single
//! broken source never tears down the watch loop.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssetflowError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid glob pattern: {0}")]
    GlobError(#[from] globset::Error),

    #[error("Cycle detected in {0}")]
    ManifestCycle(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Live reload server error: {0}")]
    ServerError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, AssetflowError>;
