// src/tasks/lint/mod.rs

//! Validation tasks and the shared "stylish" report formatter.

pub mod scripts;
pub mod styles;

use std::fmt::Write as _;
use std::path::PathBuf;

use console::style;

use crate::config::Severity;

/// One rule violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 1-based.
    pub line: usize,
    /// 1-based.
    pub column: usize,
    pub severity: Severity,
    pub message: String,
    pub rule: &'static str,
}

impl Diagnostic {
    pub fn new(
        line: usize,
        column: usize,
        severity: Severity,
        rule: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            line,
            column,
            severity,
            message: message.into(),
            rule,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub diagnostics: Vec<Diagnostic>,
}

/// Diagnostics for every linted file.
#[derive(Debug, Clone, Default)]
pub struct LintReport {
    pub files: Vec<FileReport>,
}

impl LintReport {
    pub fn push(&mut self, path: PathBuf, mut diagnostics: Vec<Diagnostic>) {
        if diagnostics.is_empty() {
            return;
        }
        diagnostics.sort_by_key(|d| (d.line, d.column));
        self.files.push(FileReport { path, diagnostics });
    }

    fn count(&self, severity: Severity) -> usize {
        self.files
            .iter()
            .flat_map(|f| &f.diagnostics)
            .filter(|d| d.severity == severity)
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Render in the "stylish" layout:
    ///
    /// ```text
    /// src/scss/main.scss
    ///   3:5   error    !important not allowed  no-important
    ///
    /// ✖ 1 problem (1 error, 0 warnings)
    /// ```
    pub fn format_stylish(&self) -> String {
        let mut out = String::new();
        if self.is_empty() {
            return out;
        }

        for file in &self.files {
            let _ = writeln!(out, "{}", style(file.path.display()).underlined());
            for d in &file.diagnostics {
                let pos = format!("{}:{}", d.line, d.column);
                let severity = match d.severity {
                    Severity::Error => style("error").red(),
                    _ => style("warning").yellow(),
                };
                let _ = writeln!(
                    out,
                    "  {pos:<7} {severity:<7}  {}  {}",
                    d.message,
                    style(d.rule).dim()
                );
            }
            out.push('\n');
        }

        let errors = self.error_count();
        let warnings = self.warning_count();
        let total = errors + warnings;
        let summary = format!(
            "\u{2716} {total} problem{} ({errors} error{}, {warnings} warning{})",
            plural(total),
            plural(errors),
            plural(warnings)
        );
        let summary = if errors > 0 {
            style(summary).red().bold()
        } else {
            style(summary).yellow().bold()
        };
        let _ = writeln!(out, "{summary}");
        out
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

/// 1-based line and column of byte offset `pos` in `src`.
pub(crate) fn line_col(src: &str, pos: usize) -> (usize, usize) {
    let before = &src[..pos.min(src.len())];
    let line = before.matches('\n').count() + 1;
    let col = before
        .rfind('\n')
        .map_or(before.chars().count(), |nl| before[nl + 1..].chars().count())
        + 1;
    (line, col)
}
