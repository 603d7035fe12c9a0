// src/paths.rs

//! The path table: which source globs feed each category and where its
//! outputs go.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::config::PathsSection;
use crate::mode::BuildSettings;
use crate::types::Category;

/// Static routing information for one asset category.
///
/// Globs and directories are relative to the project root; globs use forward
/// slashes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEntry {
    pub category: Category,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    /// Directory that relative output paths are computed from.
    pub base: PathBuf,
    pub dest: PathBuf,
}

/// Immutable mapping from category to [`PathEntry`].
#[derive(Debug, Clone)]
pub struct PathTable {
    entries: BTreeMap<Category, PathEntry>,
}

impl PathTable {
    pub fn new(settings: &BuildSettings, paths: &PathsSection) -> Self {
        let src = paths.source_root.trim_end_matches('/');
        let out = PathBuf::from(&settings.output_dir);
        let assets = out.join("assets");

        let entries = [
            PathEntry {
                category: Category::Scripts,
                include: vec![format!("{src}/js/**/*.js")],
                exclude: vec![],
                base: PathBuf::from(format!("{src}/js")),
                dest: assets.join("js"),
            },
            PathEntry {
                category: Category::Styles,
                include: vec![format!("{src}/scss/**/*.scss")],
                exclude: vec![],
                base: PathBuf::from(format!("{src}/scss")),
                dest: assets.join("css"),
            },
            PathEntry {
                category: Category::Templates,
                include: vec![format!("{src}/kit/**/*.kit")],
                exclude: vec![],
                base: PathBuf::from(format!("{src}/kit")),
                dest: out.clone(),
            },
            PathEntry {
                category: Category::Fonts,
                include: vec![format!("{src}/fonts/**/*")],
                exclude: vec![format!("{src}/fonts/**/.gitkeep")],
                base: PathBuf::from(format!("{src}/fonts")),
                dest: assets.join("fonts"),
            },
            PathEntry {
                category: Category::Images,
                include: vec![format!("{src}/images/**/*")],
                exclude: vec![format!("{src}/images/**/.gitkeep")],
                base: PathBuf::from(format!("{src}/images")),
                dest: assets.join("images"),
            },
        ]
        .into_iter()
        .map(|e| (e.category, e))
        .collect();

        Self { entries }
    }

    pub fn entry(&self, category: Category) -> &PathEntry {
        // Every category is inserted in `new`.
        &self.entries[&category]
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathEntry> {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BuildMode, Layout};

    fn table(mode: BuildMode) -> PathTable {
        let paths = PathsSection::default();
        let settings = BuildSettings::new(mode, Layout::Ltr, ".", &paths);
        PathTable::new(&settings, &paths)
    }

    #[test]
    fn destinations_follow_the_output_root() {
        let t = table(BuildMode::Production);
        assert_eq!(t.entry(Category::Scripts).dest, PathBuf::from("public/assets/js"));
        assert_eq!(t.entry(Category::Styles).dest, PathBuf::from("public/assets/css"));
        assert_eq!(t.entry(Category::Templates).dest, PathBuf::from("public"));

        let t = table(BuildMode::Development);
        assert_eq!(
            t.entry(Category::Images).dest,
            PathBuf::from("publicDev/assets/images")
        );
    }

    #[test]
    fn fonts_and_images_exclude_keep_files() {
        let t = table(BuildMode::Development);
        assert_eq!(t.entry(Category::Fonts).exclude, vec!["src/fonts/**/.gitkeep"]);
        assert_eq!(t.entry(Category::Images).exclude, vec!["src/images/**/.gitkeep"]);
        assert_eq!(t.iter().count(), 5);
    }
}
