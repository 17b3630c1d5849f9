//! `list`: a list literal per kind, for pasting into completion scripts.

use super::{Formatter, OutputFile};
use crate::config::{ExtractConfig, QuoteStyle};
use crate::error::ExtractError;
use crate::model::{Model, NameKind, NameRecord};

const INDENT: &str = "    ";

pub struct ListFormatter {
    include_comments: bool,
    quote_style: QuoteStyle,
}

impl ListFormatter {
    pub fn new(include_comments: bool, quote_style: QuoteStyle) -> Self {
        Self {
            include_comments,
            quote_style,
        }
    }

    pub fn from_config(config: &ExtractConfig) -> Self {
        Self::new(config.list.include_comments, config.list.quote_style)
    }

    /// File written for `kind`, e.g. `directives.txt`.
    pub fn file_name(kind: NameKind) -> String {
        format!("{}.txt", kind.plural())
    }

    /// `name` as a literal of the configured style.
    pub fn quote(&self, name: &str) -> String {
        match self.quote_style {
            QuoteStyle::PythonDouble => format!("\"{}\"", python_escape(name, '"')),
            QuoteStyle::PythonSingle => format!("'{}'", python_escape(name, '\'')),
            QuoteStyle::RubyWords if self.include_comments => {
                format!("\"{}\"", ruby_escape(name))
            }
            QuoteStyle::RubyWords => words_escape(name),
        }
    }

    fn compact(&self, records: &[&NameRecord]) -> String {
        let words: Vec<String> = records.iter().map(|r| self.quote(&r.name)).collect();
        match self.quote_style {
            QuoteStyle::RubyWords => format!("%w[{}]\n", words.join(" ")),
            _ => format!("[{}]\n", words.join(", ")),
        }
    }

    /// One entry per line with aligned `# from <source>` comments. A `%w[]`
    /// literal cannot hold comments, so Ruby output uses a plain array.
    fn commented(&self, records: &[&NameRecord]) -> String {
        if records.is_empty() {
            return "[]\n".to_string();
        }
        let entries: Vec<String> = records
            .iter()
            .map(|r| format!("{}{},", INDENT, self.quote(&r.name)))
            .collect();
        let width = entries.iter().map(|e| e.chars().count()).max().unwrap_or(0);

        let mut out = String::from("[\n");
        for (entry, record) in entries.iter().zip(records) {
            let pad = width - entry.chars().count();
            out.push_str(&format!(
                "{}{}  # from {}\n",
                entry,
                " ".repeat(pad),
                record.source.display_name()
            ));
        }
        out.push_str("]\n");
        out
    }
}

/// Body of a Python string literal delimited by `quote`.
fn python_escape(name: &str, quote: char) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

/// Body of a Ruby double-quoted string; `#` is escaped to stop interpolation.
fn ruby_escape(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '\\' | '"' | '#' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

/// One `%w[]` word. Whitespace and brackets are backslash-escaped so the
/// word is not split.
fn words_escape(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if matches!(c, '[' | ']' | '\\') || c.is_whitespace() {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

impl Formatter for ListFormatter {
    fn name(&self) -> &'static str {
        "list"
    }

    fn description(&self) -> &'static str {
        "Python or Ruby list literals, one file per kind"
    }

    fn render(&self, model: &Model) -> Result<Vec<OutputFile>, ExtractError> {
        Ok(NameKind::ALL
            .iter()
            .map(|&kind| {
                let records = model.sorted_records(kind);
                let body = if self.include_comments {
                    self.commented(&records)
                } else {
                    self.compact(&records)
                };
                OutputFile::text(Self::file_name(kind), body)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::Extractor;
    use crate::model::SourceRef;

    fn model() -> Model {
        Extractor::new()
            .extract(vec![
                (
                    SourceRef::new("conf.py", "conf.py"),
                    "app.add_directive('todo', T)\napp.add_role('kbd', r)\n".to_string(),
                ),
                (
                    SourceRef::new("ext/extra.py", "ext/extra.py"),
                    "app.add_directive('autosummary', A)\n".to_string(),
                ),
            ])
            .model
    }

    fn directives(formatter: &ListFormatter, model: &Model) -> String {
        let files = formatter.render(model).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].path.to_str(), Some("directives.txt"));
        assert_eq!(files[1].path.to_str(), Some("roles.txt"));
        files[0].as_str().unwrap().to_string()
    }

    #[test]
    fn test_compact_styles() {
        let model = model();
        assert_eq!(
            directives(&ListFormatter::new(false, QuoteStyle::PythonDouble), &model),
            "[\"autosummary\", \"todo\"]\n"
        );
        assert_eq!(
            directives(&ListFormatter::new(false, QuoteStyle::PythonSingle), &model),
            "['autosummary', 'todo']\n"
        );
        assert_eq!(
            directives(&ListFormatter::new(false, QuoteStyle::RubyWords), &model),
            "%w[autosummary todo]\n"
        );
    }

    #[test]
    fn test_commented_entries_are_aligned() {
        let out = directives(&ListFormatter::new(true, QuoteStyle::PythonDouble), &model());
        assert_eq!(
            out,
            "[\n    \"autosummary\",  # from ext/extra.py\n    \"todo\",         # from conf.py\n]\n"
        );
    }

    #[test]
    fn test_escaping() {
        let formatter = ListFormatter::new(false, QuoteStyle::PythonSingle);
        assert_eq!(formatter.quote("it's"), "'it\\'s'");
        let formatter = ListFormatter::new(false, QuoteStyle::RubyWords);
        assert_eq!(formatter.quote("a b"), "a\\ b");
    }

    #[test]
    fn test_control_characters_are_escaped() {
        let formatter = ListFormatter::new(false, QuoteStyle::PythonDouble);
        assert_eq!(formatter.quote("a\tb\u{1}"), "\"a\\tb\\x01\"");
        assert_eq!(formatter.quote("back\\slash"), "\"back\\\\slash\"");
        let formatter = ListFormatter::new(true, QuoteStyle::RubyWords);
        assert_eq!(formatter.quote("a\n#{x}"), "\"a\\n\\#{x}\"");
        let formatter = ListFormatter::new(false, QuoteStyle::RubyWords);
        assert_eq!(formatter.quote("a\nb"), "a\\\nb");
    }

    #[test]
    fn test_escaped_names_round_trip_as_literals() {
        let model = Extractor::new()
            .extract(vec![(
                SourceRef::new("conf.py", "conf.py"),
                "app.add_role('a\\nb', r)\napp.add_role('caf\\xe9', r)\n".to_string(),
            )])
            .model;
        let files = ListFormatter::new(false, QuoteStyle::PythonDouble).render(&model).unwrap();
        assert_eq!(files[1].as_str(), Some("[\"a\\nb\", \"caf\u{e9}\"]\n"));
    }

    #[test]
    fn test_empty_model() {
        let empty = Model::default();
        assert_eq!(directives(&ListFormatter::new(true, QuoteStyle::PythonDouble), &empty), "[]\n");
        assert_eq!(directives(&ListFormatter::new(false, QuoteStyle::RubyWords), &empty), "%w[]\n");
    }
}
