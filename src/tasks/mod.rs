// src/tasks/mod.rs

//! Transform and validation tasks, and the chains that sequence them.
//!
//! Every step receives the shared, immutable [`TaskContext`] and returns a
//! [`StepReport`]. Per-file failures are values inside the report; a chain
//! turns them into notifications and a [`ChainOutcome`] for the runtime
//! core. Nothing in here propagates a transform error to the caller.

pub mod fonts;
pub mod images;
pub mod lint;
pub mod output;
pub mod rtl;
pub mod scripts;
pub mod styles;
pub mod templates;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error};

use crate::config::ConfigFile;
use crate::engine::ChainOutcome;
use crate::errors::Result;
use crate::mode::BuildSettings;
use crate::notify::{Notification, Notifier};
use crate::paths::{PathEntry, PathTable};
use crate::server::{ReloadHandle, ReloadMessage};
use crate::types::Category;
use crate::watch::path_utils::relative_str;
use crate::watch::{collect_matching_files, CategoryWatchProfile, SourceFile};

/// Everything a task needs, built once at startup and shared by `Arc`.
#[derive(Debug)]
pub struct TaskContext {
    pub settings: BuildSettings,
    pub paths: PathTable,
    pub config: ConfigFile,
    pub notifier: Arc<dyn Notifier>,
    pub reload: Option<ReloadHandle>,
}

impl TaskContext {
    pub fn new(settings: BuildSettings, config: ConfigFile, notifier: Arc<dyn Notifier>) -> Self {
        let paths = PathTable::new(&settings, &config.paths);
        Self {
            settings,
            paths,
            config,
            notifier,
            reload: None,
        }
    }

    pub fn with_reload(mut self, reload: ReloadHandle) -> Self {
        self.reload = Some(reload);
        self
    }

    /// Resolve a project-relative path.
    pub fn project_path(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.settings.project_root.join(rel)
    }

    pub fn entry(&self, category: Category) -> &PathEntry {
        self.paths.entry(category)
    }

    /// Absolute source base directory of a category.
    pub fn source_dir(&self, category: Category) -> PathBuf {
        self.project_path(&self.entry(category).base)
    }

    /// Absolute destination directory of a category.
    pub fn dest_dir(&self, category: Category) -> PathBuf {
        self.project_path(&self.entry(category).dest)
    }

    /// Current source files of a category, sorted by relative path.
    pub fn sources(&self, category: Category) -> Result<Vec<SourceFile>> {
        let profile = CategoryWatchProfile::from_entry(self.entry(category))?;
        collect_matching_files(&self.settings.project_root, &profile)
    }

    /// URL path (`/assets/css/main.css`) of a file below the output root.
    pub fn url_path(&self, output: &Path) -> Option<String> {
        relative_str(&self.settings.output_root(), output).map(|rel| format!("/{rel}"))
    }

    pub fn notify(&self, notification: Notification) {
        self.notifier.notify(&notification);
    }

    fn send_reload(&self, message: ReloadMessage) {
        if let Some(reload) = &self.reload {
            reload.send(message);
        }
    }
}

/// One step of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    LintStyles,
    LintScripts,
    CompileStyles,
    BundleScripts,
    RenderTemplates,
    CopyFonts,
    OptimizeImages,
}

impl Step {
    pub fn name(self) -> &'static str {
        match self {
            Step::LintStyles => "lint-styles",
            Step::LintScripts => "lint-scripts",
            Step::CompileStyles => "compile-styles",
            Step::BundleScripts => "bundle-scripts",
            Step::RenderTemplates => "render-templates",
            Step::CopyFonts => "copy-fonts",
            Step::OptimizeImages => "optimize-images",
        }
    }

    pub fn is_validation(self) -> bool {
        matches!(self, Step::LintStyles | Step::LintScripts)
    }

    fn success_message(self) -> Option<&'static str> {
        match self {
            Step::CompileStyles => Some("SCSS Compiling Completed!"),
            Step::BundleScripts => Some("JS Bundling Completed!"),
            Step::RenderTemplates => Some("KIT Files Compiled!"),
            Step::CopyFonts => Some("Fonts copied to the assets public folder!"),
            Step::OptimizeImages => Some("Images minified and copied to the assets public folder!"),
            Step::LintStyles | Step::LintScripts => None,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a chain is bound: a plain build, or a watch binding (which also runs
/// the category's validation step first).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainKind {
    OneShot,
    Watch,
}

/// Ordered steps applied to one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskChain {
    pub category: Category,
    pub steps: Vec<Step>,
}

impl TaskChain {
    pub fn for_category(category: Category, kind: ChainKind) -> Self {
        let watch = kind == ChainKind::Watch;
        let steps = match category {
            Category::Styles if watch => vec![Step::LintStyles, Step::CompileStyles],
            Category::Styles => vec![Step::CompileStyles],
            Category::Scripts if watch => vec![Step::LintScripts, Step::BundleScripts],
            Category::Scripts => vec![Step::BundleScripts],
            Category::Templates => vec![Step::RenderTemplates],
            Category::Fonts => vec![Step::CopyFonts],
            Category::Images => vec![Step::OptimizeImages],
        };
        Self { category, steps }
    }
}

/// A reported failure of one file (or of a whole step).
#[derive(Debug, Clone)]
pub struct StepFailure {
    /// Name of the failing transform, e.g. `"sass"`.
    pub transform: &'static str,
    pub file: Option<PathBuf>,
    pub message: String,
}

impl StepFailure {
    pub fn new(transform: &'static str, file: Option<&Path>, message: impl Into<String>) -> Self {
        Self {
            transform,
            file: file.map(Path::to_path_buf),
            message: message.into(),
        }
    }

    pub fn notification(&self) -> Notification {
        let message = match &self.file {
            Some(file) => format!("{}\n{}", file.display(), self.message),
            None => self.message.clone(),
        };
        Notification::error(self.transform, message)
    }
}

/// What one step did.
#[derive(Debug, Default)]
pub struct StepReport {
    /// Output files whose contents changed on disk.
    pub written: Vec<PathBuf>,
    /// Outputs that were already up to date.
    pub unchanged: usize,
    pub failures: Vec<StepFailure>,
    /// Set by validation steps: the rest of the chain must not run.
    pub blocked: bool,
}

impl StepReport {
    pub fn from_failure(failure: StepFailure) -> Self {
        Self {
            failures: vec![failure],
            ..Self::default()
        }
    }

    /// Write one output and record the result; write errors become failures.
    pub(crate) fn write(&mut self, transform: &'static str, path: &Path, contents: &[u8]) {
        match output::write_if_changed(path, contents) {
            Ok(output::WriteStatus::Written) => self.written.push(path.to_path_buf()),
            Ok(output::WriteStatus::Unchanged) => self.unchanged += 1,
            Err(err) => self
                .failures
                .push(StepFailure::new(transform, Some(path), format!("{err:#}"))),
        }
    }
}

/// Run every step of `chain` in order.
///
/// Failures are notified and counted; a blocked validation step stops the
/// chain. The outcome is always returned, never an error.
pub async fn run_chain(ctx: Arc<TaskContext>, chain: &TaskChain) -> ChainOutcome {
    let mut failed = 0;

    for &step in &chain.steps {
        let report = run_step(Arc::clone(&ctx), step).await;

        debug!(
            category = %chain.category,
            %step,
            written = report.written.len(),
            unchanged = report.unchanged,
            failures = report.failures.len(),
            "step finished"
        );

        for failure in &report.failures {
            ctx.notify(failure.notification());
        }
        failed += report.failures.len();

        if report.blocked {
            return ChainOutcome::Blocked;
        }

        if let Some(message) = reload_message(&ctx, step, &report) {
            ctx.send_reload(message);
        }

        if report.failures.is_empty() {
            if let Some(message) = step.success_message() {
                ctx.notify(Notification::success(message));
            }
        }
    }

    if failed == 0 {
        ChainOutcome::Success
    } else {
        ChainOutcome::Failed(failed)
    }
}

async fn run_step(ctx: Arc<TaskContext>, step: Step) -> StepReport {
    let blocking: fn(&TaskContext) -> StepReport = match step {
        Step::OptimizeImages => return images::optimize_images(&ctx).await,
        Step::LintStyles => lint::styles::lint_styles,
        Step::LintScripts => lint::scripts::lint_scripts,
        Step::CompileStyles => styles::compile_styles,
        Step::BundleScripts => scripts::bundle_scripts,
        Step::RenderTemplates => templates::render_templates,
        Step::CopyFonts => fonts::copy_fonts,
    };

    match tokio::task::spawn_blocking(move || blocking(&ctx)).await {
        Ok(report) => report,
        Err(err) => {
            error!(%step, "step panicked: {err}");
            StepReport::from_failure(StepFailure::new(step.name(), None, err.to_string()))
        }
    }
}

/// Styles push an in-place stylesheet swap; templates and scripts reload the
/// page. Nothing is sent when no output changed.
fn reload_message(ctx: &TaskContext, step: Step, report: &StepReport) -> Option<ReloadMessage> {
    if report.written.is_empty() {
        return None;
    }

    match step {
        Step::CompileStyles => {
            let paths: Vec<String> = report
                .written
                .iter()
                .filter(|p| p.extension().is_some_and(|e| e == "css"))
                .filter_map(|p| ctx.url_path(p))
                .collect();
            (!paths.is_empty()).then_some(ReloadMessage::Inject { paths })
        }
        Step::RenderTemplates | Step::BundleScripts => Some(ReloadMessage::Reload),
        _ => None,
    }
}

/// Sass partials (`_vars.scss`) and template partials (`_header.kit`) are
/// only ever included by other files.
pub(crate) fn is_partial(rel: &str) -> bool {
    rel.rsplit('/').next().is_some_and(|name| name.starts_with('_'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watch_bindings_prepend_validation() {
        let chain = TaskChain::for_category(Category::Styles, ChainKind::Watch);
        assert_eq!(chain.steps, vec![Step::LintStyles, Step::CompileStyles]);

        let chain = TaskChain::for_category(Category::Scripts, ChainKind::OneShot);
        assert_eq!(chain.steps, vec![Step::BundleScripts]);
        assert!(!chain.steps.iter().any(|s| s.is_validation()));

        let chain = TaskChain::for_category(Category::Images, ChainKind::Watch);
        assert_eq!(chain.steps, vec![Step::OptimizeImages]);
    }

    #[test]
    fn partials_are_detected_by_file_name() {
        assert!(is_partial("_vars.scss"));
        assert!(is_partial("partials/_header.kit"));
        assert!(!is_partial("main.scss"));
        assert!(!is_partial("_dir/main.scss"));
    }

    #[test]
    fn failure_notification_names_file_and_transform() {
        let f = StepFailure::new("sass", Some(Path::new("src/scss/main.scss")), "bad");
        let n = f.notification();
        assert_eq!(n.title, "Compiling error with \"sass\"");
        assert!(n.message.starts_with("src/scss/main.scss"));
    }
}
