//! `html`: an index page plus one annotated page per scanned source.
//!
//! Source pages shade each line by the kind of name registered on it. Every
//! line is emitted as `<p id="t{n}">` with a gutter entry `<p id="n{n}">`,
//! which is how `report.js` finds lines for chunk navigation.

use super::{Formatter, OutputFile};
use crate::annotate::{AnnotatedPage, LineAnnotation};
use crate::config::ExtractConfig;
use crate::error::ExtractError;
use crate::model::{KindCounts, Model, NameKind, ScannedSource};
use crate::sort_state::{SortList, DATA_SORT_COOKIE, INDEX_SORT_COOKIE};
use crate::utils::{page_file_name, timestamp};
use minijinja::Environment;
use serde::Serialize;
use std::collections::BTreeSet;

const INDEX_TEMPLATE: &str = include_str!("../../templates/index.html");
const SOURCE_TEMPLATE: &str = include_str!("../../templates/source.html");
const STYLE_CSS: &str = include_str!("../../static/style.css");
const REPORT_JS: &str = include_str!("../../static/report.js");

pub const INDEX_FILE: &str = "index.html";

#[derive(Serialize)]
struct IndexRow {
    name: String,
    href: String,
    directives: usize,
    roles: usize,
    total: usize,
}

#[derive(Serialize)]
struct Totals {
    directives: usize,
    roles: usize,
    total: usize,
}

impl From<KindCounts> for Totals {
    fn from(counts: KindCounts) -> Self {
        Self {
            directives: counts.directives,
            roles: counts.roles,
            total: counts.total(),
        }
    }
}

#[derive(Serialize)]
struct IndexContext<'a> {
    title: &'a str,
    generator: &'a str,
    timestamp: Option<&'a str>,
    sort_cookie: &'static str,
    sort_default: String,
    totals: Totals,
    rows: Vec<IndexRow>,
}

#[derive(Serialize)]
struct LineContext {
    number: usize,
    class: &'static str,
    html: String,
}

#[derive(Serialize)]
struct NameRow<'a> {
    name: &'a str,
    kind: NameKind,
    class: &'static str,
    line: usize,
}

#[derive(Serialize)]
struct SourceContext<'a> {
    title: &'a str,
    generator: &'a str,
    timestamp: Option<&'a str>,
    source: &'a str,
    sort_cookie: &'static str,
    sort_default: String,
    counts: Totals,
    line_count: usize,
    chunk_count: usize,
    lines: Vec<LineContext>,
    names: Vec<NameRow<'a>>,
}

pub struct HtmlFormatter {
    env: Environment<'static>,
    title: String,
    show_timestamp: bool,
    generator: String,
}

impl HtmlFormatter {
    pub fn new(title: impl Into<String>, show_timestamp: bool) -> Result<Self, ExtractError> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.add_template("index.html", INDEX_TEMPLATE)?;
        env.add_template("source.html", SOURCE_TEMPLATE)?;
        Ok(Self {
            env,
            title: title.into(),
            show_timestamp,
            generator: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        })
    }

    pub fn from_config(config: &ExtractConfig) -> Result<Self, ExtractError> {
        Self::new(config.html.title.clone(), config.html.show_timestamp)
    }

    fn render_index(&self, model: &Model, stamp: Option<&str>) -> Result<String, ExtractError> {
        let rows = model
            .sources()
            .iter()
            .map(|scanned| {
                let counts = model.source_counts(&scanned.source);
                IndexRow {
                    name: scanned.source.display_name().to_string(),
                    href: page_file_name(scanned.source.display_name()),
                    directives: counts.directives,
                    roles: counts.roles,
                    total: counts.total(),
                }
            })
            .collect();

        let context = IndexContext {
            title: &self.title,
            generator: &self.generator,
            timestamp: stamp,
            sort_cookie: INDEX_SORT_COOKIE,
            sort_default: SortList::default_for_index().to_cookie(),
            totals: model.counts().into(),
            rows,
        };
        Ok(self.env.get_template("index.html")?.render(context)?)
    }

    fn render_source(
        &self,
        model: &Model,
        scanned: &ScannedSource,
        stamp: Option<&str>,
    ) -> Result<String, ExtractError> {
        let page = AnnotatedPage::from_source(scanned);
        let lines = scanned
            .text
            .lines()
            .zip(page.iter())
            .map(|(text, (number, annotation))| LineContext {
                number,
                class: annotation.css_class(),
                html: line_html(text),
            })
            .collect();

        let mut seen = BTreeSet::new();
        let mut names: Vec<NameRow<'_>> = scanned
            .occurrences
            .iter()
            .filter(|o| seen.insert((o.kind, o.name.as_str())))
            .map(|o| NameRow {
                name: &o.name,
                kind: o.kind,
                class: LineAnnotation::Plain.with(o.kind).css_class(),
                line: o.line,
            })
            .collect();
        names.sort_by(|a, b| (a.kind, a.name).cmp(&(b.kind, b.name)));

        let context = SourceContext {
            title: &self.title,
            generator: &self.generator,
            timestamp: stamp,
            source: scanned.source.display_name(),
            sort_cookie: DATA_SORT_COOKIE,
            sort_default: SortList::default_for_index().to_cookie(),
            counts: model.source_counts(&scanned.source).into(),
            line_count: page.len(),
            chunk_count: page.chunks().len(),
            lines,
            names,
        };
        Ok(self.env.get_template("source.html")?.render(context)?)
    }
}

/// Escaped line text; blank lines get a non-breaking space so that they
/// keep their height.
fn line_html(text: &str) -> String {
    let text = text.trim_end_matches('\r');
    if text.trim().is_empty() {
        "&nbsp;".to_string()
    } else {
        html_escape::encode_text(&text.replace('\t', "    ")).into_owned()
    }
}

impl Formatter for HtmlFormatter {
    fn name(&self) -> &'static str {
        "html"
    }

    fn description(&self) -> &'static str {
        "browsable report with annotated source pages"
    }

    fn render(&self, model: &Model) -> Result<Vec<OutputFile>, ExtractError> {
        let stamp = self.show_timestamp.then(timestamp);
        let stamp = stamp.as_deref();

        let mut files = vec![OutputFile::text(INDEX_FILE, self.render_index(model, stamp)?)];
        for scanned in model.sources() {
            files.push(OutputFile::text(
                page_file_name(scanned.source.display_name()),
                self.render_source(model, scanned, stamp)?,
            ));
        }
        files.push(OutputFile::text("style.css", STYLE_CSS));
        files.push(OutputFile::text("report.js", REPORT_JS));
        Ok(files)
    }
}
