// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::types::{BuildMode, Category};

/// Command-line arguments for `assetflow`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "assetflow",
    version,
    about = "Build, watch and live-reload front-end assets.",
    long_about = None
)]
pub struct CliArgs {
    /// Task to run. `default` watches and serves in development, and builds
    /// everything once in production.
    #[arg(value_enum, default_value = "default")]
    pub task: TaskSelector,

    /// Path to the config file (TOML). A missing file means built-in defaults.
    #[arg(long, value_name = "PATH", default_value = "Assetflow.toml")]
    pub config: String,

    /// Build mode.
    #[arg(long, value_enum, env = "ASSETFLOW_MODE", conflicts_with_all = ["production", "development"])]
    pub mode: Option<BuildMode>,

    /// Shorthand for `--mode production`.
    #[arg(long)]
    pub production: bool,

    /// Shorthand for `--mode development`.
    #[arg(long, conflicts_with = "production")]
    pub development: bool,

    /// Stylesheet direction. `rtl` also generates a right-to-left variant of
    /// every stylesheet.
    #[arg(long, value_name = "DIR", env = "ASSETFLOW_DIR")]
    pub dir: Option<String>,

    /// Override the live reload server port from the config.
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ASSETFLOW_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve settings and print the build plan, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Named tasks that can be invoked independently.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum TaskSelector {
    Default,
    #[value(name = "buildStyles", alias = "build-styles")]
    BuildStyles,
    #[value(name = "buildJS", alias = "build-js")]
    BuildJs,
    #[value(name = "buildKitFiles", alias = "build-kit-files")]
    BuildKitFiles,
    #[value(name = "minifyImages", alias = "minify-images")]
    MinifyImages,
    #[value(name = "copyFonts", alias = "copy-fonts")]
    CopyFonts,
    #[value(name = "watchStyleFiles", alias = "watch-style-files")]
    WatchStyleFiles,
    #[value(name = "watchJsFiles", alias = "watch-js-files")]
    WatchJsFiles,
    #[value(name = "watchKitFiles", alias = "watch-kit-files")]
    WatchKitFiles,
    #[value(name = "watchImagesFiles", alias = "watch-images-files")]
    WatchImagesFiles,
    #[value(name = "watchFontsFiles", alias = "watch-fonts-files")]
    WatchFontsFiles,
}

impl TaskSelector {
    /// Category a single-category task operates on; `None` for `default`.
    pub fn category(self) -> Option<Category> {
        match self {
            TaskSelector::Default => None,
            TaskSelector::BuildStyles | TaskSelector::WatchStyleFiles => Some(Category::Styles),
            TaskSelector::BuildJs | TaskSelector::WatchJsFiles => Some(Category::Scripts),
            TaskSelector::BuildKitFiles | TaskSelector::WatchKitFiles => {
                Some(Category::Templates)
            }
            TaskSelector::MinifyImages | TaskSelector::WatchImagesFiles => Some(Category::Images),
            TaskSelector::CopyFonts | TaskSelector::WatchFontsFiles => Some(Category::Fonts),
        }
    }

    pub fn is_watch(self) -> bool {
        matches!(
            self,
            TaskSelector::WatchStyleFiles
                | TaskSelector::WatchJsFiles
                | TaskSelector::WatchKitFiles
                | TaskSelector::WatchImagesFiles
                | TaskSelector::WatchFontsFiles
        )
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
