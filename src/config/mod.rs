// src/config/mod.rs

//! Configuration loading and validation for assetflow.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load an optional config file from disk (`loader.rs`).
//! - Validate invariants such as queue length, rule names and manifest
//!   ordering (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{
    BrowserTargets, ConfigFile, ConfigSection, ImagesSection, LintSection, PathsSection,
    RawConfigFile, ScriptLintSection, ScriptsSection, ServerSection, Severity, StyleLintSection,
    StylesSection, TemplatesSection,
};
