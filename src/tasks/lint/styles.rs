// src/tasks/lint/styles.rs

//! Stylesheet validation over SCSS sources.

use std::fs;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, warn};

use crate::config::{Severity, StyleLintSection};
use crate::tasks::lint::{line_col, Diagnostic, LintReport};
use crate::tasks::{StepFailure, StepReport, TaskContext};

static IMPORTANT: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)!\s*important"));
static DEBUG_AT_RULE: LazyLock<Regex> = LazyLock::new(|| compile(r"@debug\b"));
static ID_SELECTOR: LazyLock<Regex> = LazyLock::new(|| compile(r"#[A-Za-z_][\w-]*"));

fn compile(pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(err) => panic!("lint pattern {pattern} is invalid: {err}"),
    }
}
use crate::types::Category;

/// Every rule this linter knows.
pub const RULES: &[&str] = &[
    "no-important",
    "no-ids",
    "max-nesting-depth",
    "no-trailing-whitespace",
    "no-empty-rulesets",
    "no-debug",
];

/// Lint every stylesheet source (partials included). Error-severity
/// violations block the rest of the chain.
pub fn lint_styles(ctx: &TaskContext) -> StepReport {
    let files = match ctx.sources(Category::Styles) {
        Ok(files) => files,
        Err(err) => {
            return StepReport::from_failure(StepFailure::new("style-lint", None, err.to_string()));
        }
    };

    let cfg = &ctx.config.lint.styles;
    let base = &ctx.entry(Category::Styles).base;

    let mut step = StepReport::default();
    let mut lint = LintReport::default();
    for file in &files {
        match fs::read_to_string(&file.abs) {
            Ok(src) => lint.push(base.join(&file.rel), lint_source(&src, cfg)),
            Err(err) => step.failures.push(StepFailure::new(
                "style-lint",
                Some(&file.abs),
                err.to_string(),
            )),
        }
    }

    if !lint.is_empty() {
        println!("{}", lint.format_stylish());
    }
    info!(
        files = files.len(),
        errors = lint.error_count(),
        warnings = lint.warning_count(),
        "stylesheets linted"
    );

    if lint.has_errors() {
        warn!("stylesheet lint errors, skipping compilation");
        step.blocked = true;
        step.failures.push(StepFailure::new(
            "style-lint",
            None,
            format!("{} lint error(s) in stylesheets", lint.error_count()),
        ));
    }
    step
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Rule,
    AtRule,
}

struct OpenBlock {
    kind: Block,
    open: usize,
    prelude_at: usize,
}

/// Lint one SCSS source with the rules enabled in `cfg`.
pub fn lint_source(src: &str, cfg: &StyleLintSection) -> Vec<Diagnostic> {
    let enabled = |rule: &str| {
        cfg.rules
            .get(rule)
            .copied()
            .filter(|s| *s != Severity::Off)
    };

    let mut out = Vec::new();

    if let Some(sev) = enabled("no-trailing-whitespace") {
        for (i, line) in src.lines().enumerate() {
            let trimmed = line.trim_end_matches([' ', '\t']);
            if trimmed.len() != line.len() {
                out.push(Diagnostic::new(
                    i + 1,
                    trimmed.chars().count() + 1,
                    sev,
                    "no-trailing-whitespace",
                    "Trailing whitespace not allowed",
                ));
            }
        }
    }

    let masked = mask(src);

    if let Some(sev) = enabled("no-important") {
        for m in IMPORTANT.find_iter(&masked) {
            let (line, col) = line_col(src, m.start());
            out.push(Diagnostic::new(
                line,
                col,
                sev,
                "no-important",
                "!important not allowed",
            ));
        }
    }

    if let Some(sev) = enabled("no-debug") {
        for m in DEBUG_AT_RULE.find_iter(&masked) {
            let (line, col) = line_col(src, m.start());
            out.push(Diagnostic::new(line, col, sev, "no-debug", "@debug not allowed"));
        }
    }

    let ids = enabled("no-ids");
    let nesting = enabled("max-nesting-depth");
    let empty = enabled("no-empty-rulesets");
    if ids.is_none() && nesting.is_none() && empty.is_none() {
        return out;
    }

    let bytes = masked.as_bytes();
    let mut stack: Vec<OpenBlock> = Vec::new();
    let mut stmt_start = 0;

    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'{' => {
                let raw = &masked[stmt_start..i];
                let lead = raw.len() - raw.trim_start().len();
                let prelude = raw.trim();
                let prelude_at = stmt_start + lead;
                let kind = if prelude.starts_with('@') {
                    Block::AtRule
                } else {
                    Block::Rule
                };

                if kind == Block::Rule {
                    if let Some(sev) = ids {
                        for m in ID_SELECTOR.find_iter(prelude) {
                            let (line, col) = line_col(src, prelude_at + m.start());
                            out.push(Diagnostic::new(
                                line,
                                col,
                                sev,
                                "no-ids",
                                "ID selectors not allowed",
                            ));
                        }
                    }

                    let depth = stack.iter().filter(|b| b.kind == Block::Rule).count();
                    if let Some(sev) = nesting {
                        if depth > cfg.max_nesting_depth {
                            let (line, col) = line_col(src, prelude_at);
                            out.push(Diagnostic::new(
                                line,
                                col,
                                sev,
                                "max-nesting-depth",
                                format!(
                                    "Nesting depth {depth} greater than max of {}",
                                    cfg.max_nesting_depth
                                ),
                            ));
                        }
                    }
                }

                stack.push(OpenBlock {
                    kind,
                    open: i,
                    prelude_at,
                });
                stmt_start = i + 1;
            }
            b'}' => {
                if let Some(block) = stack.pop() {
                    let body = &masked[block.open + 1..i];
                    if let Some(sev) = empty {
                        if block.kind == Block::Rule && body.trim().is_empty() {
                            let (line, col) = line_col(src, block.prelude_at);
                            out.push(Diagnostic::new(
                                line,
                                col,
                                sev,
                                "no-empty-rulesets",
                                "No empty rulesets allowed",
                            ));
                        }
                    }
                }
                stmt_start = i + 1;
            }
            b';' => stmt_start = i + 1,
            _ => {}
        }
    }

    out
}

/// Blank out comments, string literals and `#{}` interpolation with spaces.
/// Newlines and byte offsets are preserved.
fn mask(src: &str) -> String {
    let bytes = src.as_bytes();
    let mut out = bytes.to_vec();
    let mut i = 0;

    let blank = |out: &mut Vec<u8>, from: usize, to: usize| {
        for b in &mut out[from..to] {
            if *b != b'\n' {
                *b = b' ';
            }
        }
    };

    while i < bytes.len() {
        match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let end = src[i + 2..].find("*/").map_or(bytes.len(), |e| i + 2 + e + 2);
                blank(&mut out, i, end);
                i = end;
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') && (i == 0 || bytes[i - 1] != b':') => {
                let end = src[i..].find('\n').map_or(bytes.len(), |e| i + e);
                blank(&mut out, i, end);
                i = end;
            }
            q @ (b'"' | b'\'') => {
                let mut j = i + 1;
                while j < bytes.len() && bytes[j] != q && bytes[j] != b'\n' {
                    if bytes[j] == b'\\' {
                        j += 1;
                    }
                    j += 1;
                }
                let end = (j + 1).min(bytes.len());
                blank(&mut out, i, end);
                i = end;
            }
            b'#' if bytes.get(i + 1) == Some(&b'{') => {
                let mut depth = 0;
                let mut j = i + 1;
                while j < bytes.len() {
                    match bytes[j] {
                        b'{' => depth += 1,
                        b'}' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                    j += 1;
                }
                let end = (j + 1).min(bytes.len());
                blank(&mut out, i, end);
                i = end;
            }
            _ => i += 1,
        }
    }

    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> StyleLintSection {
        StyleLintSection::default()
    }

    fn rules(diags: &[Diagnostic]) -> Vec<&'static str> {
        diags.iter().map(|d| d.rule).collect()
    }

    #[test]
    fn clean_source_has_no_diagnostics() {
        let src = "$c: #fff;\n.a {\n  color: $c;\n  .b { margin: 0; }\n}\n";
        assert!(lint_source(src, &cfg()).is_empty());
    }

    #[test]
    fn flags_important_ids_and_debug() {
        let src = "#main {\n  color: red !important;\n}\n@debug \"x\";\n";
        let diags = lint_source(src, &cfg());
        let found = rules(&diags);
        assert!(found.contains(&"no-ids"));
        assert!(found.contains(&"no-important"));
        assert!(found.contains(&"no-debug"));

        let important = diags.iter().find(|d| d.rule == "no-important").unwrap();
        assert_eq!((important.line, important.column), (2, 14));
    }

    #[test]
    fn patterns_compile_and_are_reused() {
        for re in [&*IMPORTANT, &*DEBUG_AT_RULE, &*ID_SELECTOR] {
            assert!(!re.as_str().is_empty());
        }
        let src = "#a { color: red !important; }\n";
        assert_eq!(lint_source(src, &cfg()), lint_source(src, &cfg()));
        assert!(std::ptr::eq(&*IMPORTANT, &*IMPORTANT));
    }

    #[test]
    fn ignores_comments_strings_and_interpolation() {
        let src = "// #id !important\n/* @debug */\n.a-#{$x} {\n  content: \"#nope {}\";\n}\n";
        assert!(lint_source(src, &cfg()).is_empty());
    }

    #[test]
    fn nesting_depth_counts_rules_not_at_rules() {
        let src = ".a { .b { .c { .d { .e { x: y; } } } } }\n";
        let diags = lint_source(src, &cfg());
        assert_eq!(rules(&diags), vec!["max-nesting-depth"]);

        let src = "@media print { .a { .b { .c { .d { x: y; } } } } }\n";
        assert!(lint_source(src, &cfg()).is_empty());
    }

    #[test]
    fn flags_empty_rulesets_and_trailing_whitespace() {
        let src = ".a {}  \n.b {\n}\n";
        let diags = lint_source(src, &cfg());
        assert_eq!(
            rules(&diags)
                .iter()
                .filter(|r| **r == "no-empty-rulesets")
                .count(),
            2
        );
        let ws = diags.iter().find(|d| d.rule == "no-trailing-whitespace").unwrap();
        assert_eq!((ws.line, ws.column), (1, 6));
    }

    #[test]
    fn only_enabled_rules_run() {
        let mut cfg = cfg();
        cfg.rules.clear();
        cfg.rules.insert("no-ids".to_string(), Severity::Warning);
        cfg.rules.insert("no-important".to_string(), Severity::Off);

        let diags = lint_source("#a { color: red !important; }\n", &cfg);
        assert_eq!(rules(&diags), vec!["no-ids"]);
        assert_eq!(diags[0].severity, Severity::Warning);
    }
}
