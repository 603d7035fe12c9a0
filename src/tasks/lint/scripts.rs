// src/tasks/lint/scripts.rs

//! Script validation of the entry script. Reports only; never blocks.

use std::fs;

use swc_common::{sync::Lrc, FileName, SourceMap, Span, Spanned};
use swc_ecma_ast::{BinExpr, BinaryOp, CallExpr, Callee, DebuggerStmt, EsVersion, Expr, WithStmt};
use swc_ecma_parser::{parse_file_as_script, EsSyntax, Syntax};
use swc_ecma_visit::{Visit, VisitWith};
use tracing::{debug, info};

use crate::config::{ScriptLintSection, Severity};
use crate::tasks::lint::{Diagnostic, LintReport};
use crate::tasks::{StepFailure, StepReport, TaskContext};
use crate::types::Category;

/// Every rule this linter knows. Syntax errors are always reported.
pub const RULES: &[&str] = &["no-debugger", "no-with", "no-eval", "eqeqeq"];

pub fn lint_scripts(ctx: &TaskContext) -> StepReport {
    let entry = &ctx.config.scripts.entry;
    let path = ctx.source_dir(Category::Scripts).join(entry);
    if !path.is_file() {
        debug!(entry = %entry, "entry script missing, nothing to lint");
        return StepReport::default();
    }

    let src = match fs::read_to_string(&path) {
        Ok(src) => src,
        Err(err) => {
            return StepReport::from_failure(StepFailure::new(
                "script-lint",
                Some(&path),
                err.to_string(),
            ));
        }
    };

    let display = ctx.entry(Category::Scripts).base.join(entry);
    let mut lint = LintReport::default();
    lint.push(
        display.clone(),
        lint_source(&display.to_string_lossy(), &src, &ctx.config.lint.scripts),
    );

    if !lint.is_empty() {
        println!("{}", lint.format_stylish());
    }
    info!(
        errors = lint.error_count(),
        warnings = lint.warning_count(),
        "entry script linted"
    );
    StepReport::default()
}

/// Lint one script. A syntax error is the only diagnostic when the source
/// does not parse.
pub fn lint_source(name: &str, src: &str, cfg: &ScriptLintSection) -> Vec<Diagnostic> {
    let cm: Lrc<SourceMap> = Default::default();
    let fm = cm.new_source_file(Lrc::new(FileName::Custom(name.to_string())), src.to_string());

    let mut recovered = Vec::new();
    let parsed = parse_file_as_script(
        &fm,
        Syntax::Es(EsSyntax::default()),
        EsVersion::EsNext,
        None,
        &mut recovered,
    );

    let script = match parsed {
        Ok(script) if recovered.is_empty() => script,
        Ok(_) => return recovered.iter().map(|e| syntax_error(&cm, e)).collect(),
        Err(err) => return vec![syntax_error(&cm, &err)],
    };

    let mut linter = Linter {
        cm: &cm,
        cfg,
        diagnostics: Vec::new(),
    };
    script.visit_with(&mut linter);
    linter.diagnostics
}

fn syntax_error(cm: &SourceMap, err: &swc_ecma_parser::error::Error) -> Diagnostic {
    let loc = cm.lookup_char_pos(err.span().lo);
    Diagnostic::new(
        loc.line,
        loc.col.0 + 1,
        Severity::Error,
        "syntax",
        err.kind().msg().to_string(),
    )
}

struct Linter<'a> {
    cm: &'a SourceMap,
    cfg: &'a ScriptLintSection,
    diagnostics: Vec<Diagnostic>,
}

impl Linter<'_> {
    fn report(&mut self, rule: &'static str, span: Span, message: &str) {
        let Some(severity) = self.cfg.rules.get(rule).copied() else {
            return;
        };
        if severity == Severity::Off {
            return;
        }
        let loc = self.cm.lookup_char_pos(span.lo);
        self.diagnostics
            .push(Diagnostic::new(loc.line, loc.col.0 + 1, severity, rule, message));
    }
}

impl Visit for Linter<'_> {
    fn visit_debugger_stmt(&mut self, n: &DebuggerStmt) {
        self.report("no-debugger", n.span, "Forgotten 'debugger' statement");
    }

    fn visit_with_stmt(&mut self, n: &WithStmt) {
        self.report("no-with", n.span, "Don't use 'with'");
        n.visit_children_with(self);
    }

    fn visit_call_expr(&mut self, n: &CallExpr) {
        if let Callee::Expr(callee) = &n.callee {
            if let Expr::Ident(ident) = &**callee {
                if &*ident.sym == "eval" {
                    self.report("no-eval", n.span, "eval can be harmful");
                }
            }
        }
        n.visit_children_with(self);
    }

    fn visit_bin_expr(&mut self, n: &BinExpr) {
        match n.op {
            BinaryOp::EqEq => self.report("eqeqeq", n.span, "Expected '===' and instead saw '=='"),
            BinaryOp::NotEq => self.report("eqeqeq", n.span, "Expected '!==' and instead saw '!='"),
            _ => {}
        }
        n.visit_children_with(self);
    }
}
