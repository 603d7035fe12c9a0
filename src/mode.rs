// src/mode.rs

//! Mode resolution: decide the build mode, stylesheet layout and output
//! root once at startup.

use std::path::PathBuf;

use crate::cli::CliArgs;
use crate::config::PathsSection;
use crate::types::{BuildMode, Layout};

/// Immutable process-wide build settings. Built once and shared by reference
/// with every task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSettings {
    pub mode: BuildMode,
    pub layout: Layout,
    /// Directory all sources and outputs are resolved against.
    pub project_root: PathBuf,
    /// Output root relative to `project_root` (`public` or `publicDev`).
    pub output_dir: String,
}

impl BuildSettings {
    pub fn new(
        mode: BuildMode,
        layout: Layout,
        project_root: impl Into<PathBuf>,
        paths: &PathsSection,
    ) -> Self {
        let output_dir = match mode {
            BuildMode::Production => paths.production_dir.clone(),
            BuildMode::Development => paths.development_dir.clone(),
        };

        Self {
            mode,
            layout,
            project_root: project_root.into(),
            output_dir,
        }
    }

    /// Resolve settings from the CLI (which already folds in the
    /// `ASSETFLOW_MODE` / `ASSETFLOW_DIR` environment variables).
    ///
    /// Absent flags mean development mode and LTR only.
    pub fn resolve(
        args: &CliArgs,
        project_root: impl Into<PathBuf>,
        paths: &PathsSection,
    ) -> Self {
        let mode = if args.production {
            BuildMode::Production
        } else if args.development {
            BuildMode::Development
        } else {
            args.mode.unwrap_or_default()
        };

        let layout = Layout::from_selector(args.dir.as_deref());

        Self::new(mode, layout, project_root, paths)
    }

    /// Absolute (or project-relative) path of the output root.
    pub fn output_root(&self) -> PathBuf {
        self.project_root.join(&self.output_dir)
    }

    pub fn emits_sourcemaps(&self) -> bool {
        self.mode.is_development()
    }

    pub fn minifies(&self) -> bool {
        self.mode.is_production()
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn resolve(argv: &[&str]) -> BuildSettings {
        let args = CliArgs::try_parse_from(argv).unwrap();
        BuildSettings::resolve(&args, "/project", &PathsSection::default())
    }

    #[test]
    fn defaults_to_development_ltr() {
        let s = resolve(&["assetflow", "buildStyles"]);
        assert_eq!(s.mode, BuildMode::Development);
        assert_eq!(s.layout, Layout::Ltr);
        assert_eq!(s.output_dir, "publicDev");
        assert!(s.emits_sourcemaps());
        assert!(!s.minifies());
    }

    #[test]
    fn production_flag_selects_public_dir() {
        let s = resolve(&["assetflow", "--production", "--dir", "rtl"]);
        assert_eq!(s.mode, BuildMode::Production);
        assert_eq!(s.layout, Layout::LtrAndRtl);
        assert_eq!(s.output_root(), PathBuf::from("/project/public"));
        assert!(!s.emits_sourcemaps());
    }

    #[test]
    fn explicit_mode_value() {
        let s = resolve(&["assetflow", "--mode", "production"]);
        assert_eq!(s.mode, BuildMode::Production);
    }
}
