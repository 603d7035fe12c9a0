#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use assetflow::config::{ConfigFile, RawConfigFile, Severity};
use assetflow::errors::AssetflowError;
use assetflow::mode::BuildSettings;
use assetflow::notify::Notifier;
use assetflow::tasks::TaskContext;
use assetflow::types::{BuildMode, Layout, TriggerWhileRunningBehaviour};
use tempfile::TempDir;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn with_behaviour(mut self, behaviour: TriggerWhileRunningBehaviour) -> Self {
        self.config.config.triggered_while_running_behaviour = behaviour;
        self
    }

    pub fn with_queue_length(mut self, len: usize) -> Self {
        self.config.config.queue_length = len;
        self
    }

    /// Declare that `file` is bundled after `dep`.
    pub fn with_script_after(mut self, file: &str, dep: &str) -> Self {
        self.config
            .scripts
            .after
            .entry(file.to_string())
            .or_default()
            .push(dep.to_string());
        self
    }

    pub fn with_script_entry(mut self, entry: &str) -> Self {
        self.config.scripts.entry = entry.to_string();
        self
    }

    pub fn with_style_rule(mut self, rule: &str, severity: Severity) -> Self {
        self.config
            .lint
            .styles
            .rules
            .insert(rule.to_string(), severity);
        self
    }

    pub fn with_template_var(mut self, key: &str, value: &str) -> Self {
        self.config
            .templates
            .vars
            .insert(key.to_string(), value.to_string());
        self
    }

    /// Make PNG optimization fast in tests.
    pub fn with_png_level(mut self, level: u8) -> Self {
        self.config.images.png_level = level;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn try_build(self) -> Result<ConfigFile, AssetflowError> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A throwaway project directory with the default `src/` layout.
pub struct ProjectFixture {
    dir: TempDir,
}

impl ProjectFixture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp project dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Write a file below the project root, creating parent directories.
    pub fn write(&self, rel: &str, contents: impl AsRef<[u8]>) -> &Self {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, contents).expect("write fixture file");
        self
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel))
            .unwrap_or_else(|e| panic!("reading {rel}: {e}"))
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path(rel).exists()
    }

    /// Every file below `rel`, as sorted forward-slash paths relative to the
    /// project root.
    pub fn files_under(&self, rel: &str) -> Vec<String> {
        let mut out = Vec::new();
        collect(self.root(), &self.path(rel), &mut out);
        out.sort();
        out
    }

    pub fn context(
        &self,
        mode: BuildMode,
        layout: Layout,
        config: ConfigFile,
        notifier: Arc<dyn Notifier>,
    ) -> Arc<TaskContext> {
        let settings = BuildSettings::new(mode, layout, self.root(), &config.paths);
        Arc::new(TaskContext::new(settings, config, notifier))
    }
}

impl Default for ProjectFixture {
    fn default() -> Self {
        Self::new()
    }
}

fn collect(root: &Path, dir: &Path, out: &mut Vec<String>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect(root, &path, out);
        } else if let Ok(rel) = path.strip_prefix(root) {
            out.push(rel.to_string_lossy().replace('\\', "/"));
        }
    }
}
