// src/tasks/scripts.rs

//! Script transform: transpile each file down to `[scripts].target`,
//! concatenate in manifest order, then minify the bundle without mangling
//! identifiers.

use std::collections::BTreeMap;
use std::fs;

use swc_common::comments::SingleThreadedComments;
use swc_common::{sync::Lrc, FileName, Globals, Mark, SourceMap, Spanned, GLOBALS};
use swc_ecma_ast::{EsVersion, Program};
use swc_ecma_codegen::{text_writer::JsWriter, Config as CodegenConfig, Emitter};
use swc_ecma_parser::{parse_file_as_program, EsSyntax, Syntax, TsSyntax};
use swc_ecma_transforms_base::fixer::fixer;
use swc_ecma_transforms_base::helpers::{inject_helpers, Helpers, HELPERS};
use swc_ecma_transforms_base::hygiene::hygiene;
use swc_ecma_transforms_base::resolver;
use swc_ecma_transforms_compat::{es2015, es2016, es2017, es2018, es2019, es2020, es2021, es2022};
use swc_ecma_transforms_typescript::strip;
use tracing::{debug, info};

use crate::manifest::OrderManifest;
use crate::tasks::{StepFailure, StepReport, TaskContext};
use crate::types::Category;

/// Parse a `[scripts].target` value.
pub fn parse_target(s: &str) -> Result<EsVersion, String> {
    let v = match s.trim().to_ascii_lowercase().as_str() {
        "es3" => EsVersion::Es3,
        "es5" => EsVersion::Es5,
        "es2015" | "es6" => EsVersion::Es2015,
        "es2016" => EsVersion::Es2016,
        "es2017" => EsVersion::Es2017,
        "es2018" => EsVersion::Es2018,
        "es2019" => EsVersion::Es2019,
        "es2020" => EsVersion::Es2020,
        "es2021" => EsVersion::Es2021,
        "es2022" => EsVersion::Es2022,
        "esnext" => EsVersion::EsNext,
        other => {
            return Err(format!(
                "[scripts].target: unknown target '{other}' (expected es3, es5, es2015..es2022 or esnext)"
            ));
        }
    };
    Ok(v)
}

/// Bundle every script into the combined file (development only) and its
/// minified sibling. If any file fails, nothing is written.
pub fn bundle_scripts(ctx: &TaskContext) -> StepReport {
    let cfg = &ctx.config.scripts;

    let files = match ctx.sources(Category::Scripts) {
        Ok(files) => files,
        Err(err) => return StepReport::from_failure(StepFailure::new("swc", None, err.to_string())),
    };
    if files.is_empty() {
        debug!("no scripts to bundle");
        return StepReport::default();
    }

    let target = match parse_target(&cfg.target) {
        Ok(t) => t,
        Err(e) => return StepReport::from_failure(StepFailure::new("swc", None, e)),
    };

    let by_rel: BTreeMap<String, _> = files.into_iter().map(|f| (f.rel.clone(), f)).collect();
    let rels: Vec<String> = by_rel.keys().cloned().collect();
    let order = match OrderManifest::new(&cfg.entry, &cfg.after).order(&rels) {
        Ok(order) => order,
        Err(e) => return StepReport::from_failure(StepFailure::new("concat", None, e.to_string())),
    };

    let mut report = StepReport::default();
    let mut parts = Vec::with_capacity(order.len());
    for rel in &order {
        let Some(file) = by_rel.get(rel) else { continue };
        let code = match fs::read_to_string(&file.abs) {
            Ok(code) => code,
            Err(e) => {
                report
                    .failures
                    .push(StepFailure::new("swc", Some(&file.abs), e.to_string()));
                continue;
            }
        };
        match transpile(rel, &code, target) {
            Ok(js) => parts.push(js),
            Err(msg) => report.failures.push(StepFailure::new("swc", Some(&file.abs), msg)),
        }
    }

    if !report.failures.is_empty() {
        return report;
    }

    let bundle = concat(&parts);
    let minified = match minify(&cfg.bundle_name, &bundle, target) {
        Ok(m) => m,
        Err(msg) => {
            report.failures.push(StepFailure::new("uglify", None, msg));
            return report;
        }
    };

    let dest = ctx.dest_dir(Category::Scripts);
    if ctx.settings.mode.is_development() {
        report.write("concat", &dest.join(&cfg.bundle_name), bundle.as_bytes());
    }
    report.write("uglify", &dest.join(&cfg.minified_name), minified.as_bytes());

    info!(files = order.len(), es_target = %cfg.target, "scripts bundled");
    report
}

fn concat(parts: &[String]) -> String {
    let mut bundle = String::new();
    for part in parts {
        bundle.push_str(part.trim_end());
        bundle.push('\n');
    }
    bundle
}

/// Parse one file (TypeScript-superset syntax), strip type-only syntax,
/// lower newer syntax to `target` and emit it.
pub fn transpile(name: &str, code: &str, target: EsVersion) -> Result<String, String> {
    let cm: Lrc<SourceMap> = Lrc::new(SourceMap::default());
    let syntax = Syntax::Typescript(TsSyntax {
        tsx: false,
        decorators: true,
        dts: false,
        no_early_errors: false,
        disallow_ambiguous_jsx_like: false,
    });
    let program = parse(&cm, name, code, syntax)?;

    let program = GLOBALS.set(&Globals::default(), || {
        // Helpers such as `_class_call_check` are inlined into each file.
        HELPERS.set(&Helpers::new(false), || {
            let unresolved_mark = Mark::new();
            let top_level_mark = Mark::new();

            let mut program = program.apply(&mut resolver(unresolved_mark, top_level_mark, true));
            program.mutate(&mut strip(unresolved_mark, top_level_mark));
            lower(&mut program, target, unresolved_mark);
            program.mutate(&mut inject_helpers(unresolved_mark));
            program.mutate(&mut hygiene());
            program.mutate(&mut fixer(None));
            program
        })
    });

    emit(&cm, &program, target, false)
}

/// Run the compat passes for every edition newer than `target`, newest
/// first, so each pass sees only syntax it knows how to rewrite.
fn lower(program: &mut Program, target: EsVersion, unresolved_mark: Mark) {
    if target < EsVersion::Es2022 {
        program.mutate(es2022::es2022(Default::default(), unresolved_mark));
    }
    if target < EsVersion::Es2021 {
        program.mutate(es2021::es2021());
    }
    if target < EsVersion::Es2020 {
        program.mutate(es2020::es2020(Default::default(), unresolved_mark));
    }
    if target < EsVersion::Es2019 {
        program.mutate(es2019::es2019());
    }
    if target < EsVersion::Es2018 {
        program.mutate(es2018::es2018(Default::default()));
    }
    if target < EsVersion::Es2017 {
        program.mutate(es2017::es2017(Default::default(), unresolved_mark));
    }
    if target < EsVersion::Es2016 {
        program.mutate(es2016::es2016());
    }
    if target < EsVersion::Es2015 {
        program.mutate(es2015::es2015(
            unresolved_mark,
            None::<SingleThreadedComments>,
            Default::default(),
        ));
    }
}

/// Re-parse the combined bundle and print it without whitespace or
/// comments. Identifiers are never renamed. The bundle is already lowered,
/// so this only reprints it.
pub fn minify(name: &str, bundle: &str, target: EsVersion) -> Result<String, String> {
    let cm: Lrc<SourceMap> = Lrc::new(SourceMap::default());
    let program = parse(&cm, name, bundle, Syntax::Es(EsSyntax::default()))?;
    emit(&cm, &program, target, true)
}

fn parse(cm: &Lrc<SourceMap>, name: &str, code: &str, syntax: Syntax) -> Result<Program, String> {
    let fm = cm.new_source_file(Lrc::new(FileName::Custom(name.to_string())), code.to_string());

    let mut recovered = Vec::new();
    let program = parse_file_as_program(&fm, syntax, EsVersion::EsNext, None, &mut recovered)
        .map_err(|e| describe(cm, name, &e))?;

    if let Some(err) = recovered.first() {
        return Err(describe(cm, name, err));
    }
    Ok(program)
}

fn describe(cm: &SourceMap, name: &str, err: &swc_ecma_parser::error::Error) -> String {
    let loc = cm.lookup_char_pos(err.span().lo);
    format!("{name}:{}:{}: {}", loc.line, loc.col.0 + 1, err.kind().msg())
}

fn emit(cm: &Lrc<SourceMap>, program: &Program, target: EsVersion, minify: bool) -> Result<String, String> {
    let mut buf = vec![];
    {
        let writer = JsWriter::new(Lrc::clone(cm), "\n", &mut buf, None);
        let mut emitter = Emitter {
            cfg: CodegenConfig::default()
                .with_minify(minify)
                .with_target(target),
            cm: Lrc::clone(cm),
            comments: None,
            wr: writer,
        };

        emitter
            .emit_program(program)
            .map_err(|e| format!("emitting JavaScript: {e}"))?;
    }

    String::from_utf8(buf).map_err(|e| format!("emitted JavaScript is not UTF-8: {e}"))
}

#[cfg(test)]
mod tests {
    use assetflow_test_utils::es5::later_syntax;

    use super::*;

    #[test]
    fn targets_parse() {
        assert_eq!(parse_target("ES5"), Ok(EsVersion::Es5));
        assert_eq!(parse_target("es6"), Ok(EsVersion::Es2015));
        assert!(parse_target("es1999").is_err());
    }

    #[test]
    fn type_annotations_are_stripped() {
        let js = transpile("a.ts", "let n: number = 1;\nfunction f(x: string): void {}\n", EsVersion::Es5)
            .unwrap();
        assert!(!js.contains("number"), "{js}");
        assert!(js.contains("function f(x)"), "{js}");
    }

    #[test]
    fn syntax_errors_name_the_file_and_line() {
        let err = transpile("libs/broken.js", "var a = ;\n", EsVersion::Es5).unwrap_err();
        assert!(err.starts_with("libs/broken.js:1:"), "{err}");
    }

    #[test]
    fn newer_syntax_is_lowered_to_es5() {
        let js = transpile(
            "libs/widgets.ts",
            "const greet = (name: string) => `hi ${name}`;\n\
             class Widget { constructor(private el: string) {} show() { return greet(this.el); } }\n\
             let { a, ...rest } = { a: 1, b: 2 };\n\
             var n = 2 ** 3;\n",
            EsVersion::Es5,
        )
        .unwrap();

        assert_eq!(later_syntax(&js), Vec::<&str>::new(), "{js}");
        assert!(js.contains("Widget"), "{js}");
        assert!(js.contains("Math.pow"), "{js}");
    }

    #[test]
    fn modern_targets_keep_modern_syntax() {
        let js = transpile("a.js", "const f = (x) => x ?? 1;\n", EsVersion::Es2020).unwrap();
        assert!(js.contains("=>"), "{js}");
        assert!(js.contains("??"), "{js}");
    }

    #[test]
    fn minify_keeps_identifiers() {
        let out = minify(
            "app.js",
            "function longName(argument) {\n  // note\n  return argument + 1;\n}\n",
            EsVersion::Es5,
        )
        .unwrap();
        assert!(out.starts_with("function longName(argument){"), "{out}");
        assert!(!out.contains("note"), "{out}");
    }
}
