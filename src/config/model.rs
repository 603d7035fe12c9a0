// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::types::TriggerWhileRunningBehaviour;

/// Top-level configuration as read from `Assetflow.toml`.
///
/// ```toml
/// [config]
/// triggered_while_running_behaviour = "queue"
/// queue_length = 1
///
/// [scripts]
/// entry = "app.js"
///
/// [scripts.after]
/// "libs/02.plugins.js" = ["libs/01.jquery.js"]
///
/// [lint.styles.rules]
/// no-important = "error"
/// ```
///
/// Every section is optional. A project without a config file gets the
/// built-in defaults.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,
    #[serde(default)]
    pub paths: PathsSection,
    #[serde(default)]
    pub scripts: ScriptsSection,
    #[serde(default)]
    pub templates: TemplatesSection,
    #[serde(default)]
    pub styles: StylesSection,
    #[serde(default)]
    pub lint: LintSection,
    #[serde(default)]
    pub images: ImagesSection,
    #[serde(default)]
    pub server: ServerSection,
}

/// Validated configuration. Construct via `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub paths: PathsSection,
    pub scripts: ScriptsSection,
    pub templates: TemplatesSection,
    pub styles: StylesSection,
    pub lint: LintSection,
    pub images: ImagesSection,
    pub server: ServerSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            config: raw.config,
            paths: raw.paths,
            scripts: raw.scripts,
            templates: raw.templates,
            styles: raw.styles,
            lint: raw.lint,
            images: raw.images,
            server: raw.server,
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        ConfigFile::new_unchecked(RawConfigFile::default())
    }
}

/// `[config]` section: what happens when a category is triggered while it is
/// already running.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    #[serde(default)]
    pub triggered_while_running_behaviour: TriggerWhileRunningBehaviour,

    /// Maximum number of pending runs remembered per category (queue mode).
    #[serde(default = "default_queue_length")]
    pub queue_length: usize,
}

fn default_queue_length() -> usize {
    1
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            triggered_while_running_behaviour: TriggerWhileRunningBehaviour::default(),
            queue_length: default_queue_length(),
        }
    }
}

/// `[paths]` section: where sources live and the two output roots.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsSection {
    #[serde(default = "default_source_root")]
    pub source_root: String,
    #[serde(default = "default_production_dir")]
    pub production_dir: String,
    #[serde(default = "default_development_dir")]
    pub development_dir: String,
}

fn default_source_root() -> String {
    "src".to_string()
}

fn default_production_dir() -> String {
    "public".to_string()
}

fn default_development_dir() -> String {
    "publicDev".to_string()
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            source_root: default_source_root(),
            production_dir: default_production_dir(),
            development_dir: default_development_dir(),
        }
    }
}

/// `[scripts]` section: bundle manifest and output names.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptsSection {
    /// Entry script, relative to the script source base. Always bundled last.
    #[serde(default = "default_script_entry")]
    pub entry: String,

    /// Declared ordering: file -> files it must be bundled after.
    #[serde(default)]
    pub after: BTreeMap<String, Vec<String>>,

    #[serde(default = "default_bundle_name")]
    pub bundle_name: String,

    #[serde(default = "default_minified_name")]
    pub minified_name: String,

    /// Syntax target of the emitted bundle (e.g. `"es5"`, `"es2015"`).
    #[serde(default = "default_script_target")]
    pub target: String,
}

fn default_script_entry() -> String {
    "app.js".to_string()
}

fn default_bundle_name() -> String {
    "app.js".to_string()
}

fn default_minified_name() -> String {
    "app.min.js".to_string()
}

fn default_script_target() -> String {
    "es5".to_string()
}

impl Default for ScriptsSection {
    fn default() -> Self {
        Self {
            entry: default_script_entry(),
            after: BTreeMap::new(),
            bundle_name: default_bundle_name(),
            minified_name: default_minified_name(),
            target: default_script_target(),
        }
    }
}

/// `[templates]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplatesSection {
    /// Entry template, rendered after every other template.
    #[serde(default = "default_template_entry")]
    pub entry: String,

    #[serde(default)]
    pub after: BTreeMap<String, Vec<String>>,

    /// Extra variables available to every template.
    #[serde(default)]
    pub vars: BTreeMap<String, String>,

    /// Indent width used when pretty-printing in development.
    #[serde(default = "default_indent_size")]
    pub indent_size: usize,
}

fn default_template_entry() -> String {
    "index.kit".to_string()
}

fn default_indent_size() -> usize {
    4
}

impl Default for TemplatesSection {
    fn default() -> Self {
        Self {
            entry: default_template_entry(),
            after: BTreeMap::new(),
            vars: BTreeMap::new(),
            indent_size: default_indent_size(),
        }
    }
}

/// `[styles]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StylesSection {
    /// Suffix appended to the file stem of right-to-left variants.
    #[serde(default = "default_rtl_suffix")]
    pub rtl_suffix: String,

    #[serde(default)]
    pub targets: BrowserTargets,
}

fn default_rtl_suffix() -> String {
    "-rtl".to_string()
}

impl Default for StylesSection {
    fn default() -> Self {
        Self {
            rtl_suffix: default_rtl_suffix(),
            targets: BrowserTargets::default(),
        }
    }
}

/// Oldest browser major versions to emit vendor prefixes for.
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserTargets {
    pub chrome: Option<u32>,
    pub firefox: Option<u32>,
    pub safari: Option<u32>,
    pub edge: Option<u32>,
    pub ie: Option<u32>,
    pub ios_saf: Option<u32>,
    pub android: Option<u32>,
    pub opera: Option<u32>,
}

impl Default for BrowserTargets {
    fn default() -> Self {
        Self {
            chrome: Some(60),
            firefox: Some(60),
            safari: Some(11),
            edge: Some(17),
            ie: Some(11),
            ios_saf: Some(11),
            android: Some(67),
            opera: Some(50),
        }
    }
}

/// Rule severity in lint configs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Off,
    Warning,
    Error,
}

/// `[lint]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct LintSection {
    #[serde(default)]
    pub styles: StyleLintSection,
    #[serde(default)]
    pub scripts: ScriptLintSection,
}

/// `[lint.styles]`: only rules listed here run.
#[derive(Debug, Clone, Deserialize)]
pub struct StyleLintSection {
    #[serde(default = "default_style_rules")]
    pub rules: BTreeMap<String, Severity>,

    #[serde(default = "default_max_nesting_depth")]
    pub max_nesting_depth: usize,
}

fn default_style_rules() -> BTreeMap<String, Severity> {
    [
        "no-important",
        "no-ids",
        "max-nesting-depth",
        "no-trailing-whitespace",
        "no-empty-rulesets",
        "no-debug",
    ]
    .into_iter()
    .map(|r| (r.to_string(), Severity::Error))
    .collect()
}

fn default_max_nesting_depth() -> usize {
    3
}

impl Default for StyleLintSection {
    fn default() -> Self {
        Self {
            rules: default_style_rules(),
            max_nesting_depth: default_max_nesting_depth(),
        }
    }
}

/// `[lint.scripts]`.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptLintSection {
    #[serde(default = "default_script_rules")]
    pub rules: BTreeMap<String, Severity>,
}

fn default_script_rules() -> BTreeMap<String, Severity> {
    [
        ("no-debugger", Severity::Warning),
        ("no-with", Severity::Error),
        ("no-eval", Severity::Warning),
        ("eqeqeq", Severity::Warning),
    ]
    .into_iter()
    .map(|(r, s)| (r.to_string(), s))
    .collect()
}

impl Default for ScriptLintSection {
    fn default() -> Self {
        Self {
            rules: default_script_rules(),
        }
    }
}

/// `[images]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ImagesSection {
    /// oxipng preset (0..=6).
    #[serde(default = "default_png_level")]
    pub png_level: u8,

    #[serde(default = "default_gifsicle")]
    pub gifsicle: String,

    #[serde(default = "default_jpegtran")]
    pub jpegtran: String,
}

fn default_png_level() -> u8 {
    5
}

fn default_gifsicle() -> String {
    "gifsicle".to_string()
}

fn default_jpegtran() -> String {
    "jpegtran".to_string()
}

impl Default for ImagesSection {
    fn default() -> Self {
        Self {
            png_level: default_png_level(),
            gifsicle: default_gifsicle(),
            jpegtran: default_jpegtran(),
        }
    }
}

/// `[server]` section for the live reload server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}
