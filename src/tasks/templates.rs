// src/tasks/templates.rs

//! Template transform: render `.kit` pages with minijinja, then pretty-print
//! (development) or collapse whitespace (production).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::{
    BufferQueue, Doctype, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer,
    TokenizerOpts,
};
use html5ever::tokenizer::states::RawKind;
use html_escape::{encode_double_quoted_attribute, encode_text};
use minijinja::{path_loader, Environment, Value};
use tracing::{debug, info};

use crate::manifest::OrderManifest;
use crate::tasks::{is_partial, StepFailure, StepReport, TaskContext};
use crate::types::Category;

/// Render every non-partial template in manifest order (entry last).
/// A failing template is reported; the others still render.
pub fn render_templates(ctx: &TaskContext) -> StepReport {
    let cfg = &ctx.config.templates;

    let files = match ctx.sources(Category::Templates) {
        Ok(files) => files,
        Err(err) => {
            return StepReport::from_failure(StepFailure::new("minijinja", None, err.to_string()));
        }
    };

    let pages: BTreeMap<String, PathBuf> = files
        .into_iter()
        .filter(|f| !is_partial(&f.rel))
        .map(|f| (f.rel, f.abs))
        .collect();
    let rels: Vec<String> = pages.keys().cloned().collect();
    let order = match OrderManifest::new(&cfg.entry, &cfg.after).order(&rels) {
        Ok(order) => order,
        Err(e) => return StepReport::from_failure(StepFailure::new("kit", None, e.to_string())),
    };

    let mut env = Environment::new();
    env.set_loader(path_loader(ctx.source_dir(Category::Templates)));
    env.set_keep_trailing_newline(true);

    let vars = template_vars(ctx);
    let dest = ctx.dest_dir(Category::Templates);

    let mut report = StepReport::default();
    for rel in &order {
        let abs = &pages[rel];
        debug!(template = %rel, "rendering template");

        let rendered = env
            .get_template(rel)
            .and_then(|tmpl| tmpl.render(&vars));
        let html = match rendered {
            Ok(html) => html,
            Err(err) => {
                report
                    .failures
                    .push(StepFailure::new("minijinja", Some(abs), format!("{err:#}")));
                continue;
            }
        };

        let html = if ctx.settings.minifies() {
            collapse_whitespace(&html)
        } else {
            pretty_print(&html, cfg.indent_size)
        };

        report.write("kit", &dest.join(html_rel_path(rel)), html.as_bytes());
    }

    info!(
        rendered = order.len().saturating_sub(report.failures.len()),
        failures = report.failures.len(),
        "templates rendered"
    );
    report
}

/// Variables available to every template: `[templates.vars]` plus `mode`
/// and `production`.
fn template_vars(ctx: &TaskContext) -> BTreeMap<String, Value> {
    let mut vars: BTreeMap<String, Value> = ctx
        .config
        .templates
        .vars
        .iter()
        .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
        .collect();
    vars.insert("mode".to_string(), Value::from(ctx.settings.mode.to_string()));
    vars.insert(
        "production".to_string(),
        Value::from(ctx.settings.mode.is_production()),
    );
    vars
}

fn html_rel_path(rel: &str) -> PathBuf {
    Path::new(rel).with_extension("html")
}

/// Production output: collapse whitespace, keep comments and optional tags.
pub fn collapse_whitespace(html: &str) -> String {
    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = true;
    String::from_utf8_lossy(&minify_html::minify(html.as_bytes(), &cfg)).into_owned()
}

const VOID: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const INLINE: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "br", "button", "cite", "code", "data", "dfn", "em", "i", "img",
    "input", "kbd", "label", "mark", "q", "s", "samp", "select", "small", "span", "strong", "sub",
    "sup", "time", "u", "var",
];

/// Elements printed exactly as written.
const VERBATIM: &[&str] = &["pre", "script", "style", "textarea"];

/// One serialized piece of the page.
#[derive(Debug, PartialEq)]
enum Piece {
    /// Text, already escaped where the source context requires it.
    Text(String),
    /// Comment or doctype.
    Markup(String),
    Start {
        name: String,
        html: String,
        self_closing: bool,
    },
    End {
        name: String,
        html: String,
    },
}

/// Collects tokenizer output as [`Piece`]s, switching the tokenizer into raw
/// text mode inside elements whose content is not markup.
#[derive(Default)]
struct Collector {
    pieces: Vec<Piece>,
    raw: Option<String>,
}

impl Collector {
    fn text(&mut self, text: &str) {
        let text = if self.raw.as_deref().is_some_and(|name| name != "textarea" && name != "title") {
            text.into()
        } else {
            encode_text(text)
        };
        match self.pieces.last_mut() {
            Some(Piece::Text(last)) => last.push_str(&text),
            _ => self.pieces.push(Piece::Text(text.into_owned())),
        }
    }

    fn tag(&mut self, tag: Tag) -> TokenSinkResult<()> {
        let name = tag.name.to_string();
        if tag.kind == TagKind::EndTag {
            if self.raw.as_deref() == Some(name.as_str()) {
                self.raw = None;
            }
            self.pieces.push(Piece::End {
                html: format!("</{name}>"),
                name,
            });
            return TokenSinkResult::Continue;
        }

        let mut html = format!("<{name}");
        for attr in &tag.attrs {
            html.push(' ');
            html.push_str(&attr.name.local);
            if !attr.value.is_empty() {
                html.push_str("=\"");
                html.push_str(&encode_double_quoted_attribute(&attr.value));
                html.push('"');
            }
        }
        html.push_str(if tag.self_closing { "/>" } else { ">" });

        let kind = match name.as_str() {
            _ if tag.self_closing => None,
            "script" => Some(RawKind::ScriptData),
            "style" | "xmp" | "iframe" | "noembed" | "noframes" => Some(RawKind::Rawtext),
            "textarea" | "title" => Some(RawKind::Rcdata),
            _ => None,
        };
        if kind.is_some() {
            self.raw = Some(name.clone());
        }
        self.pieces.push(Piece::Start {
            name,
            html,
            self_closing: tag.self_closing,
        });

        match kind {
            Some(kind) => TokenSinkResult::RawData(kind),
            None => TokenSinkResult::Continue,
        }
    }
}

impl TokenSink for Collector {
    type Handle = ();

    fn process_token(&mut self, token: Token, _line: u64) -> TokenSinkResult<()> {
        match token {
            Token::TagToken(tag) => return self.tag(tag),
            Token::CharacterTokens(text) => self.text(&text),
            Token::CommentToken(text) => self.pieces.push(Piece::Markup(format!("<!--{text}-->"))),
            Token::DoctypeToken(doctype) => self.pieces.push(Piece::Markup(doctype_html(&doctype))),
            Token::NullCharacterToken | Token::EOFToken | Token::ParseError(_) => {}
        }
        TokenSinkResult::Continue
    }
}

fn doctype_html(doctype: &Doctype) -> String {
    let mut html = String::from("<!DOCTYPE");
    if let Some(name) = &doctype.name {
        html.push(' ');
        html.push_str(name);
    }
    match (&doctype.public_id, &doctype.system_id) {
        (Some(public), Some(system)) => html.push_str(&format!(" PUBLIC \"{public}\" \"{system}\"")),
        (Some(public), None) => html.push_str(&format!(" PUBLIC \"{public}\"")),
        (None, Some(system)) => html.push_str(&format!(" SYSTEM \"{system}\"")),
        (None, None) => {}
    }
    html.push('>');
    html
}

fn tokenize(html: &str) -> Vec<Piece> {
    let mut input = BufferQueue::default();
    input.push_back(StrTendril::from_slice(html));

    let mut tokenizer = Tokenizer::new(Collector::default(), TokenizerOpts::default());
    let _ = tokenizer.feed(&mut input);
    tokenizer.end();
    tokenizer.sink.pieces
}

/// Development output: one block element per line, indented by
/// `indent_size` spaces. Inline elements and text share a line; `<head>` and
/// `<body>` are not indented inside `<html>`; the contents of `pre`,
/// `textarea`, `script` and `style` are kept as written.
pub fn pretty_print(html: &str, indent_size: usize) -> String {
    let mut out = Printer::new(indent_size);
    let mut pieces = tokenize(html).into_iter();

    while let Some(piece) = pieces.next() {
        match piece {
            Piece::Text(text) => out.inline_text(&text),
            Piece::Markup(html) => out.block(&html),
            Piece::Start { name, html, .. } if INLINE.contains(&name.as_str()) => out.inline(&html),
            Piece::End { name, html } if INLINE.contains(&name.as_str()) => out.inline(&html),
            Piece::Start {
                name,
                html,
                self_closing: false,
            } if VERBATIM.contains(&name.as_str()) => {
                let mut body = String::new();
                let mut close = String::new();
                for piece in pieces.by_ref() {
                    match piece {
                        Piece::End { name: end, html } if end == name => {
                            close = html;
                            break;
                        }
                        Piece::Text(html) | Piece::Markup(html) => body.push_str(&html),
                        Piece::Start { html, .. } | Piece::End { html, .. } => body.push_str(&html),
                    }
                }
                out.verbatim(&name, &html, &body, &close);
            }
            Piece::Start {
                name,
                html,
                self_closing,
            } => {
                out.block(&html);
                if !self_closing && !VOID.contains(&name.as_str()) && name != "html" {
                    out.indent();
                }
            }
            Piece::End { name, html } => {
                if name != "html" {
                    out.dedent();
                }
                out.block(&html);
            }
        }
    }

    out.finish()
}

struct Printer {
    indent_size: usize,
    level: usize,
    line: String,
    lines: Vec<String>,
}

impl Printer {
    fn new(indent_size: usize) -> Self {
        Self {
            indent_size,
            level: 0,
            line: String::new(),
            lines: Vec::new(),
        }
    }

    fn pad(&self) -> String {
        " ".repeat(self.level * self.indent_size)
    }

    fn push_line(&mut self, line: &str) {
        let padded = format!("{}{line}", self.pad());
        self.lines.push(padded);
    }

    fn flush(&mut self) {
        let line = std::mem::take(&mut self.line);
        let line = line.trim_matches(|c: char| c.is_ascii_whitespace());
        if !line.is_empty() {
            self.push_line(line);
        }
    }

    fn block(&mut self, html: &str) {
        self.flush();
        self.line.push_str(html);
        self.flush();
    }

    fn inline(&mut self, html: &str) {
        self.line.push_str(html);
    }

    /// Collapse ASCII whitespace runs; non-breaking spaces are content.
    fn inline_text(&mut self, text: &str) {
        let mut last_space = self.line.ends_with(' ');
        for c in text.chars() {
            if c.is_ascii_whitespace() {
                if !last_space {
                    self.line.push(' ');
                    last_space = true;
                }
            } else {
                self.line.push(c);
                last_space = false;
            }
        }
    }

    fn verbatim(&mut self, name: &str, open: &str, body: &str, close: &str) {
        self.flush();
        if name == "pre" || name == "textarea" {
            self.push_line(&format!("{open}{body}{close}"));
            return;
        }

        self.block(open);
        self.level += 1;
        for l in body.lines().filter(|l| !l.trim().is_empty()) {
            self.push_line(l.trim());
        }
        self.level -= 1;
        self.block(close);
    }

    fn indent(&mut self) {
        self.level += 1;
    }

    fn dedent(&mut self) {
        self.flush();
        self.level = self.level.saturating_sub(1);
    }

    fn finish(mut self) -> String {
        self.flush();
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }
}
