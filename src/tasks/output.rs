// src/tasks/output.rs

//! Output writing: atomic, and only when the contents changed.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tempfile::NamedTempFile;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    Written,
    Unchanged,
}

/// Write `contents` to `path` unless the file already holds the same bytes.
///
/// The new contents go to a temporary file in the same directory which is
/// then renamed over `path`, so readers (and the live reload server) never
/// see a half-written file.
pub fn write_if_changed(path: &Path, contents: &[u8]) -> Result<WriteStatus> {
    if let Ok(existing) = fs::read(path) {
        if blake3::hash(&existing) == blake3::hash(contents) {
            debug!(?path, "output unchanged");
            return Ok(WriteStatus::Unchanged);
        }
    }

    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;

    let mut tmp = NamedTempFile::new_in(parent)
        .with_context(|| format!("creating temporary file in {:?}", parent))?;
    tmp.write_all(contents)
        .with_context(|| format!("writing temporary file for {:?}", path))?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("replacing {:?}", path))?;

    debug!(?path, bytes = contents.len(), "output written");
    Ok(WriteStatus::Written)
}
