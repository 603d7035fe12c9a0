// src/tasks/fonts.rs

use std::fs;

use tracing::info;

use crate::tasks::{StepFailure, StepReport, TaskContext};
use crate::types::Category;

/// Copy every font file verbatim into the fonts destination, keeping its
/// relative path.
pub fn copy_fonts(ctx: &TaskContext) -> StepReport {
    let files = match ctx.sources(Category::Fonts) {
        Ok(files) => files,
        Err(err) => {
            return StepReport::from_failure(StepFailure::new("fonts", None, err.to_string()));
        }
    };

    let dest = ctx.dest_dir(Category::Fonts);
    let mut report = StepReport::default();
    for file in &files {
        match fs::read(&file.abs) {
            Ok(bytes) => report.write("fonts", &dest.join(&file.rel), &bytes),
            Err(err) => report
                .failures
                .push(StepFailure::new("fonts", Some(&file.abs), err.to_string())),
        }
    }

    info!(
        files = files.len(),
        written = report.written.len(),
        "fonts copied"
    );
    report
}
