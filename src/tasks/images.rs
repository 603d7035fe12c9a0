// src/tasks/images.rs

//! Image transform: lossless optimization per format, copied into the images
//! destination with the same relative path.

use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use tracing::{debug, info, warn};

use crate::exec::command::run_filter;
use crate::tasks::{StepFailure, StepReport, TaskContext};
use crate::types::Category;

/// What happened to one image.
#[derive(Debug, PartialEq, Eq)]
enum Optimized {
    Bytes(Vec<u8>),
    /// No optimizer for this file; copy it as is.
    Passthrough,
}

pub async fn optimize_images(ctx: &TaskContext) -> StepReport {
    let files = match ctx.sources(Category::Images) {
        Ok(files) => files,
        Err(err) => {
            return StepReport::from_failure(StepFailure::new("imagemin", None, err.to_string()));
        }
    };

    let dest = ctx.dest_dir(Category::Images);
    let mut report = StepReport::default();
    let mut saved: u64 = 0;

    for file in &files {
        let original = match tokio::fs::read(&file.abs).await {
            Ok(bytes) => bytes,
            Err(err) => {
                report
                    .failures
                    .push(StepFailure::new("imagemin", Some(&file.abs), err.to_string()));
                continue;
            }
        };

        let contents = match optimize(ctx, &file.abs, &original).await {
            Ok(Optimized::Bytes(bytes)) if bytes.len() <= original.len() => {
                saved += (original.len() - bytes.len()) as u64;
                bytes
            }
            Ok(Optimized::Bytes(_)) => {
                debug!(file = %file.rel, "optimized image is larger, keeping original");
                original
            }
            Ok(Optimized::Passthrough) => original,
            Err(err) => {
                report.failures.push(StepFailure::new(
                    "imagemin",
                    Some(&file.abs),
                    format!("{err:#}"),
                ));
                continue;
            }
        };

        report.write("imagemin", &dest.join(&file.rel), &contents);
    }

    info!(
        files = files.len(),
        written = report.written.len(),
        saved_bytes = saved,
        "images optimized"
    );
    report
}

async fn optimize(ctx: &TaskContext, path: &Path, input: &[u8]) -> anyhow::Result<Optimized> {
    let cfg = &ctx.config.images;
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => {
            let input = input.to_vec();
            let level = cfg.png_level;
            let bytes = tokio::task::spawn_blocking(move || {
                oxipng::optimize_from_memory(&input, &oxipng::Options::from_preset(level))
            })
            .await??;
            Ok(Optimized::Bytes(bytes))
        }
        "gif" => external(&cfg.gifsicle, &["--interlace"], path, input).await,
        "jpg" | "jpeg" => {
            external(
                &cfg.jpegtran,
                &["-progressive", "-copy", "none", "-optimize"],
                path,
                input,
            )
            .await
        }
        "svg" => optimize_svg(path, input),
        _ => {
            warn!(file = %path.display(), "no optimizer for this image format, copying");
            Ok(Optimized::Passthrough)
        }
    }
}

async fn external(
    program: &str,
    args: &[&str],
    path: &Path,
    input: &[u8],
) -> anyhow::Result<Optimized> {
    match run_filter(program, args, input).await? {
        Some(bytes) => Ok(Optimized::Bytes(bytes)),
        None => {
            warn!(%program, file = %path.display(), "optimizer not installed, copying");
            Ok(Optimized::Passthrough)
        }
    }
}

/// SVG bytes that are not UTF-8 are copied untouched.
fn optimize_svg(path: &Path, input: &[u8]) -> anyhow::Result<Optimized> {
    match std::str::from_utf8(input) {
        Ok(svg) => Ok(Optimized::Bytes(clean_svg(svg)?.into_bytes())),
        Err(err) => {
            warn!(file = %path.display(), %err, "svg is not UTF-8, copying");
            Ok(Optimized::Passthrough)
        }
    }
}

/// In-process SVG cleanup. Removes the XML declaration, doctype, comments,
/// `<metadata>` and Inkscape/Sodipodi editor data, and whitespace-only text
/// between tags. Text inside `<text>`, `<tspan>` and `<textPath>` is kept as
/// written, as are `viewBox` and `id` attributes.
pub fn clean_svg(svg: &str) -> anyhow::Result<String> {
    let mut reader = Reader::from_str(svg);
    let mut writer = Writer::new(Vec::with_capacity(svg.len()));
    // Depth inside a removed element; zero when copying.
    let mut skip = 0usize;
    // Depth inside text content elements.
    let mut in_text = 0usize;

    loop {
        let event = reader.read_event()?;
        if skip > 0 {
            match event {
                Event::Start(_) => skip += 1,
                Event::End(_) => skip -= 1,
                Event::Eof => break,
                _ => {}
            }
            continue;
        }

        match event {
            Event::Eof => break,
            Event::Decl(_) | Event::DocType(_) | Event::Comment(_) => {}
            Event::Start(e) if is_editor_element(e.name().as_ref()) => skip = 1,
            Event::Empty(e) if is_editor_element(e.name().as_ref()) => {}
            Event::Start(e) => {
                if is_text_element(e.name().as_ref()) {
                    in_text += 1;
                }
                writer.write_event(Event::Start(strip_editor_attributes(&e)?))?;
            }
            Event::Empty(e) => writer.write_event(Event::Empty(strip_editor_attributes(&e)?))?,
            Event::End(e) => {
                if is_text_element(e.name().as_ref()) {
                    in_text = in_text.saturating_sub(1);
                }
                writer.write_event(Event::End(e))?;
            }
            Event::Text(t) if in_text == 0 && t.iter().all(u8::is_ascii_whitespace) => {}
            other => writer.write_event(other)?,
        }
    }

    Ok(String::from_utf8(writer.into_inner())?)
}

fn is_editor_element(name: &[u8]) -> bool {
    name == b"metadata" || is_editor_name(name)
}

fn is_editor_name(name: &[u8]) -> bool {
    name.starts_with(b"sodipodi:") || name.starts_with(b"inkscape:")
}

fn is_text_element(name: &[u8]) -> bool {
    matches!(name, b"text" | b"tspan" | b"textPath")
}

fn strip_editor_attributes(e: &BytesStart<'_>) -> anyhow::Result<BytesStart<'static>> {
    let attrs = e.attributes().collect::<Result<Vec<_>, _>>()?;
    let mut out = e.to_owned();
    out.clear_attributes();
    for attr in attrs {
        let key = attr.key.as_ref();
        if is_editor_name(key) || key == b"xmlns:sodipodi" || key == b"xmlns:inkscape" {
            continue;
        }
        out.push_attribute(attr);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn svg_cleanup_keeps_view_box_and_ids() {
        let svg = r##"<?xml version="1.0" encoding="UTF-8"?>
<!-- Generator: editor -->
<!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN" "http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd">
<svg xmlns="http://www.w3.org/2000/svg" xmlns:inkscape="http://www.inkscape.org/namespaces/inkscape" viewBox="0 0 10 10" inkscape:version="1.0">
  <metadata><rdf:RDF><cc:Work/></rdf:RDF></metadata>
  <sodipodi:namedview id="nv" pagecolor="#fff"/>
  <g id="layer1" inkscape:label="Layer 1">
    <rect id="r" width="10" height="10"/>
  </g>
</svg>
"##;
        let out = clean_svg(svg).unwrap();
        assert_eq!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10"><g id="layer1"><rect id="r" width="10" height="10"/></g></svg>"#
        );
    }

    #[test]
    fn plain_svg_only_loses_whitespace() {
        let svg = "<svg viewBox=\"0 0 1 1\">\n  <path d=\"M0 0\"/>\n</svg>";
        assert_eq!(
            clean_svg(svg).unwrap(),
            "<svg viewBox=\"0 0 1 1\"><path d=\"M0 0\"/></svg>"
        );
    }

    #[test]
    fn text_content_whitespace_is_kept() {
        let svg = "<svg>\n  <text x=\"0\"><tspan>a</tspan> <tspan> b </tspan></text>\n</svg>";
        assert_eq!(
            clean_svg(svg).unwrap(),
            "<svg><text x=\"0\"><tspan>a</tspan> <tspan> b </tspan></text></svg>"
        );
    }

    #[test]
    fn comment_like_text_in_attributes_survives() {
        let svg = "<svg><g data-note=\"&lt;!-- keep --&gt;\"/></svg>";
        assert_eq!(clean_svg(svg).unwrap(), svg);
    }

    #[test]
    fn non_utf8_svg_is_copied_untouched() {
        let mut input = b"<svg><text>caf".to_vec();
        input.push(0xE9);
        input.extend_from_slice(b"</text></svg>");
        assert_eq!(
            optimize_svg(Path::new("logo.svg"), &input).unwrap(),
            Optimized::Passthrough
        );
    }

    #[test]
    fn malformed_svg_is_an_error() {
        assert!(clean_svg("<svg><g></svg>").is_err());
    }
}
