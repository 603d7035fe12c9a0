// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile, Severity};
use crate::errors::{AssetflowError, Result};
use crate::manifest::OrderManifest;
use crate::tasks::lint;
use crate::tasks::scripts::parse_target;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = AssetflowError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_global_config(cfg)?;
    validate_paths(cfg)?;
    validate_lint_rules(cfg)?;
    validate_scripts(cfg)?;
    validate_manifests(cfg)?;
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.queue_length == 0 {
        return Err(AssetflowError::ConfigError(
            "[config].queue_length must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.images.png_level > 6 {
        return Err(AssetflowError::ConfigError(format!(
            "[images].png_level must be between 0 and 6 (got {})",
            cfg.images.png_level
        )));
    }

    Ok(())
}

fn validate_paths(cfg: &RawConfigFile) -> Result<()> {
    let paths = &cfg.paths;
    if paths.production_dir.trim().is_empty() || paths.development_dir.trim().is_empty() {
        return Err(AssetflowError::ConfigError(
            "[paths] output directories must not be empty".to_string(),
        ));
    }
    if paths.production_dir == paths.source_root || paths.development_dir == paths.source_root {
        return Err(AssetflowError::ConfigError(format!(
            "[paths] output directory must differ from source_root '{}'",
            paths.source_root
        )));
    }
    Ok(())
}

fn validate_lint_rules(cfg: &RawConfigFile) -> Result<()> {
    for name in cfg.lint.styles.rules.keys() {
        if !lint::styles::RULES.contains(&name.as_str()) {
            return Err(AssetflowError::ConfigError(format!(
                "unknown stylesheet lint rule '{}' (known: {})",
                name,
                lint::styles::RULES.join(", ")
            )));
        }
    }

    for name in cfg.lint.scripts.rules.keys() {
        if !lint::scripts::RULES.contains(&name.as_str()) {
            return Err(AssetflowError::ConfigError(format!(
                "unknown script lint rule '{}' (known: {})",
                name,
                lint::scripts::RULES.join(", ")
            )));
        }
    }

    let nesting_enabled = cfg
        .lint
        .styles
        .rules
        .get("max-nesting-depth")
        .is_some_and(|s| *s != Severity::Off);
    if nesting_enabled && cfg.lint.styles.max_nesting_depth == 0 {
        return Err(AssetflowError::ConfigError(
            "[lint.styles].max_nesting_depth must be >= 1 when the rule is enabled".to_string(),
        ));
    }

    Ok(())
}

fn validate_scripts(cfg: &RawConfigFile) -> Result<()> {
    parse_target(&cfg.scripts.target).map_err(AssetflowError::ConfigError)?;

    if cfg.scripts.bundle_name == cfg.scripts.minified_name {
        return Err(AssetflowError::ConfigError(format!(
            "[scripts] bundle_name and minified_name must differ (both '{}')",
            cfg.scripts.bundle_name
        )));
    }

    Ok(())
}

fn validate_manifests(cfg: &RawConfigFile) -> Result<()> {
    OrderManifest::new(&cfg.scripts.entry, &cfg.scripts.after)
        .check_acyclic()
        .map_err(|e| with_section(e, "[scripts.after]"))?;

    OrderManifest::new(&cfg.templates.entry, &cfg.templates.after)
        .check_acyclic()
        .map_err(|e| with_section(e, "[templates.after]"))?;

    Ok(())
}

fn with_section(err: AssetflowError, section: &str) -> AssetflowError {
    match err {
        AssetflowError::ManifestCycle(msg) => {
            AssetflowError::ManifestCycle(format!("{section}: {msg}"))
        }
        other => other,
    }
}
