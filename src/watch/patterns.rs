// src/watch/patterns.rs

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::errors::Result;
use crate::paths::{PathEntry, PathTable};
use crate::types::Category;
use crate::watch::path_utils::relative_str;

/// Compiled include/exclude glob patterns for one category.
///
/// The patterns are relative to the project root. The watcher passes
/// relative paths (e.g. `"src/scss/main.scss"`) into `matches`.
#[derive(Clone)]
pub struct CategoryWatchProfile {
    category: Category,
    base: PathBuf,
    include_set: GlobSet,
    exclude_set: Option<GlobSet>,
}

impl fmt::Debug for CategoryWatchProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CategoryWatchProfile")
            .field("category", &self.category)
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

impl CategoryWatchProfile {
    pub fn from_entry(entry: &PathEntry) -> Result<Self> {
        let include_set = build_globset(&entry.include)
            .with_context(|| format!("building include globset for {}", entry.category))?;

        let exclude_set = if entry.exclude.is_empty() {
            None
        } else {
            Some(
                build_globset(&entry.exclude)
                    .with_context(|| format!("building exclude globset for {}", entry.category))?,
            )
        };

        Ok(Self {
            category: entry.category,
            base: entry.base.clone(),
            include_set,
            exclude_set,
        })
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Returns true if this category is interested in the given path
    /// (relative to project root).
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.include_set.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude_set {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }
}

/// Build one profile per requested category.
pub fn build_profiles(
    table: &PathTable,
    categories: &[Category],
) -> Result<Vec<CategoryWatchProfile>> {
    categories
        .iter()
        .map(|c| CategoryWatchProfile::from_entry(table.entry(*c)))
        .collect()
}

/// A source file found for a category.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SourceFile {
    /// Path relative to the category base, forward slashes (`libs/a.js`).
    pub rel: String,
    /// Path on disk.
    pub abs: PathBuf,
}

/// Walk the category's base directory and collect every file matching the
/// profile, sorted by relative path. A missing base directory yields no
/// files.
pub fn collect_matching_files(
    root: &Path,
    profile: &CategoryWatchProfile,
) -> Result<Vec<SourceFile>> {
    let base = root.join(&profile.base);
    if !base.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(&base).follow_links(true) {
        let entry = entry.with_context(|| format!("walking {:?}", base))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let Some(rel_to_root) = relative_str(root, entry.path()) else {
            continue;
        };
        if !profile.matches(&rel_to_root) {
            continue;
        }

        if let Some(rel) = relative_str(&base, entry.path()) {
            files.push(SourceFile {
                rel,
                abs: entry.path().to_path_buf(),
            });
        }
    }

    files.sort();
    Ok(files)
}

/// Build a GlobSet from simple string patterns.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        builder.add(Glob::new(pat)?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::config::PathsSection;
    use crate::mode::BuildSettings;
    use crate::types::{BuildMode, Layout};

    fn table() -> PathTable {
        let paths = PathsSection::default();
        let settings = BuildSettings::new(BuildMode::Development, Layout::Ltr, ".", &paths);
        PathTable::new(&settings, &paths)
    }

    #[test]
    fn profile_applies_excludes() {
        let profile = CategoryWatchProfile::from_entry(table().entry(Category::Fonts)).unwrap();
        assert!(profile.matches("src/fonts/roboto/regular.woff2"));
        assert!(!profile.matches("src/fonts/.gitkeep"));
        assert!(!profile.matches("src/images/a.png"));
    }

    #[test]
    fn style_profile_only_matches_scss() {
        let profile = CategoryWatchProfile::from_entry(table().entry(Category::Styles)).unwrap();
        assert!(profile.matches("src/scss/main.scss"));
        assert!(profile.matches("src/scss/partials/_vars.scss"));
        assert!(!profile.matches("src/scss/main.css"));
    }

    #[test]
    fn collects_sorted_relative_files() {
        let dir = tempfile::tempdir().unwrap();
        let js = dir.path().join("src/js/libs");
        fs::create_dir_all(&js).unwrap();
        fs::write(dir.path().join("src/js/app.js"), "a").unwrap();
        fs::write(js.join("02.b.js"), "b").unwrap();
        fs::write(js.join("01.a.js"), "c").unwrap();
        fs::write(js.join("notes.txt"), "d").unwrap();

        let profile = CategoryWatchProfile::from_entry(table().entry(Category::Scripts)).unwrap();
        let files = collect_matching_files(dir.path(), &profile).unwrap();
        let rels: Vec<_> = files.iter().map(|f| f.rel.as_str()).collect();
        assert_eq!(rels, vec!["app.js", "libs/01.a.js", "libs/02.b.js"]);
    }

    #[test]
    fn missing_base_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let profile = CategoryWatchProfile::from_entry(table().entry(Category::Images)).unwrap();
        assert!(collect_matching_files(dir.path(), &profile).unwrap().is_empty());
    }
}
