// src/tasks/styles.rs

//! Stylesheet transform: sass → (mirror) → vendor prefixing → print.
//!
//! The RTL variant reparses the sass output and mirrors it before
//! prefixing, so its source map points at the same compiled CSS.

use std::path::{Path, PathBuf};

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use parcel_sourcemap::SourceMap;
use tracing::{debug, info};

use crate::config::BrowserTargets;
use crate::tasks::{is_partial, rtl, StepFailure, StepReport, TaskContext};
use crate::types::Category;
use crate::watch::SourceFile;

/// One compiled output file, held in memory until every output of its
/// source compiled.
#[derive(Debug)]
struct Output {
    path: PathBuf,
    contents: String,
}

/// Printed stylesheet plus its source map (development only).
#[derive(Debug)]
pub struct Printed {
    pub code: String,
    pub map: Option<String>,
}

/// Compile every non-partial stylesheet.
///
/// A file is written only once all of its outputs (LTR, map, RTL, RTL map)
/// compiled, so a broken source leaves its previous outputs untouched.
pub fn compile_styles(ctx: &TaskContext) -> StepReport {
    let files = match ctx.sources(Category::Styles) {
        Ok(files) => files,
        Err(err) => return StepReport::from_failure(StepFailure::new("sass", None, err.to_string())),
    };

    let base = ctx.source_dir(Category::Styles);
    let dest = ctx.dest_dir(Category::Styles);
    let targets = browser_targets(&ctx.config.styles.targets);

    let mut report = StepReport::default();
    for file in files.iter().filter(|f| !is_partial(&f.rel)) {
        match compile_one(ctx, &base, &dest, file, targets) {
            Ok(outputs) => {
                for out in outputs {
                    report.write("sass", &out.path, out.contents.as_bytes());
                }
            }
            Err(failure) => report.failures.push(failure),
        }
    }

    info!(
        written = report.written.len(),
        failures = report.failures.len(),
        layout = %ctx.settings.layout,
        "stylesheets compiled"
    );
    report
}

fn compile_one(
    ctx: &TaskContext,
    base: &Path,
    dest: &Path,
    file: &SourceFile,
    targets: Targets,
) -> Result<Vec<Output>, StepFailure> {
    debug!(file = %file.rel, "compiling stylesheet");

    let options = grass::Options::default()
        .style(grass::OutputStyle::Expanded)
        .load_path(base);
    let css = grass::from_path(&file.abs, &options)
        .map_err(|e| StepFailure::new("sass", Some(&file.abs), e.to_string()))?;

    let minify = ctx.settings.minifies();
    let with_map = ctx.settings.emits_sourcemaps();

    let ltr_path = dest.join(css_rel_path(&file.rel, ""));
    let ltr = print_stylesheet(&css, &file.rel, targets, minify, with_map, false)
        .map_err(|e| StepFailure::new("lightningcss", Some(&file.abs), e))?;
    let mut outputs = finish(&ltr_path, ltr);

    if ctx.settings.layout.wants_rtl() {
        let rtl_path = dest.join(css_rel_path(&file.rel, &ctx.config.styles.rtl_suffix));
        let rtl = print_stylesheet(&css, &file.rel, targets, minify, with_map, true)
            .map_err(|e| StepFailure::new("rtlcss", Some(&file.abs), e))?;
        outputs.extend(finish(&rtl_path, rtl));
    }

    Ok(outputs)
}

/// Attach the `sourceMappingURL` comment and the `.map` sibling.
fn finish(css_path: &Path, printed: Printed) -> Vec<Output> {
    let Some(map) = printed.map else {
        return vec![Output {
            path: css_path.to_path_buf(),
            contents: printed.code,
        }];
    };

    let file_name = css_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let map_path = css_path.with_file_name(format!("{file_name}.map"));

    let mut code = printed.code;
    if !code.ends_with('\n') {
        code.push('\n');
    }
    code.push_str(&format!("/*# sourceMappingURL={file_name}.map */\n"));

    vec![
        Output {
            path: css_path.to_path_buf(),
            contents: code,
        },
        Output {
            path: map_path,
            contents: map,
        },
    ]
}

/// Parse, optionally mirror, prefix for `targets` and print one stylesheet.
pub fn print_stylesheet(
    css: &str,
    source_name: &str,
    targets: Targets,
    minify: bool,
    with_map: bool,
    mirror: bool,
) -> Result<Printed, String> {
    let mut sheet = StyleSheet::parse(
        css,
        ParserOptions {
            filename: source_name.to_string(),
            ..ParserOptions::default()
        },
    )
    .map_err(|e| e.to_string())?;

    if mirror {
        rtl::mirror_stylesheet(&mut sheet);
    }

    sheet
        .minify(MinifyOptions {
            targets,
            ..MinifyOptions::default()
        })
        .map_err(|e| e.to_string())?;

    let mut map = if with_map {
        let mut sm = SourceMap::new("/");
        sm.add_source(source_name);
        sm.set_source_content(0, css).map_err(|e| format!("{e:?}"))?;
        Some(sm)
    } else {
        None
    };

    let printed = sheet
        .to_css(PrinterOptions {
            minify,
            source_map: map.as_mut(),
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| e.to_string())?;

    let map = match map.as_mut() {
        Some(sm) => Some(sm.to_json(None).map_err(|e| format!("{e:?}"))?),
        None => None,
    };

    Ok(Printed {
        code: printed.code,
        map,
    })
}

/// `sub/main.scss` → `sub/main.css` (or `sub/main-rtl.css` with a suffix).
fn css_rel_path(rel: &str, suffix: &str) -> PathBuf {
    let path = Path::new(rel);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{stem}{suffix}.css"))
}

/// Browser versions are encoded as `major << 16`.
pub fn browser_targets(cfg: &BrowserTargets) -> Targets {
    let v = |major: Option<u32>| major.map(|m| m << 16);
    Targets::from(Browsers {
        android: v(cfg.android),
        chrome: v(cfg.chrome),
        edge: v(cfg.edge),
        firefox: v(cfg.firefox),
        ie: v(cfg.ie),
        ios_saf: v(cfg.ios_saf),
        opera: v(cfg.opera),
        safari: v(cfg.safari),
        samsung: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_names_keep_directories() {
        assert_eq!(css_rel_path("main.scss", ""), PathBuf::from("main.css"));
        assert_eq!(css_rel_path("pages/home.scss", "-rtl"), PathBuf::from("pages/home-rtl.css"));
    }

    #[test]
    fn prefixes_for_old_browsers() {
        let targets = browser_targets(&BrowserTargets::default());
        let printed =
            print_stylesheet(".a { user-select: none; }", "a.scss", targets, false, false, false).unwrap();
        assert!(printed.code.contains("-webkit-user-select"), "{}", printed.code);
        assert!(printed.map.is_none());
    }

    #[test]
    fn development_prints_a_map() {
        let targets = browser_targets(&BrowserTargets::default());
        let printed = print_stylesheet(".a { color: red; }", "a.scss", targets, false, true, false).unwrap();
        let map = printed.map.unwrap();
        assert!(map.contains("\"mappings\""), "{map}");
    }

    #[test]
    fn production_minifies() {
        let targets = browser_targets(&BrowserTargets::default());
        let printed =
            print_stylesheet(".a {\n  color: red;\n}\n", "a.scss", targets, true, false, false).unwrap();
        assert_eq!(printed.code, ".a{color:red}");
    }

    #[test]
    fn mirrored_variant_is_flipped_then_prefixed() {
        let targets = browser_targets(&BrowserTargets::default());
        let css = ".a { margin-left: 1px; float: left; user-select: none; }";
        let printed = print_stylesheet(css, "a.scss", targets, true, false, true).unwrap();
        assert!(printed.code.contains("margin-right:1px"), "{}", printed.code);
        assert!(printed.code.contains("float:right"), "{}", printed.code);
        assert!(printed.code.contains("-webkit-user-select:none"), "{}", printed.code);
    }

    #[test]
    fn map_comment_and_file_are_added() {
        let outputs = finish(
            Path::new("/out/main.css"),
            Printed {
                code: ".a{}".to_string(),
                map: Some("{}".to_string()),
            },
        );
        assert_eq!(outputs.len(), 2);
        assert!(outputs[0].contents.ends_with("/*# sourceMappingURL=main.css.map */\n"));
        assert_eq!(outputs[1].path, PathBuf::from("/out/main.css.map"));
    }
}
