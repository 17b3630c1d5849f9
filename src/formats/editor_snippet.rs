//! `tmprefs`: TextMate completion preferences, one file per kind.

use super::{Formatter, OutputFile};
use crate::error::ExtractError;
use crate::model::{Model, NameKind};
use crate::utils::stable_uuid;

const ENTRY_INDENT: &str = "\t\t\t";

#[derive(Debug, Default)]
pub struct TmPreferencesFormatter;

impl TmPreferencesFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn file_name(kind: NameKind) -> String {
        format!("{}.tmPreferences", kind.plural())
    }

    fn document(&self, model: &Model, kind: NameKind) -> String {
        let records = model.sorted_records(kind);
        let entries: Vec<String> = records
            .iter()
            .map(|r| format!("{}<string>{}</string>", ENTRY_INDENT, xml_escape(&r.name)))
            .collect();
        let width = entries.iter().map(|e| e.chars().count()).max().unwrap_or(0);

        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        out.push_str("<!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n");
        out.push_str("<plist version=\"1.0\">\n<dict>\n");
        out.push_str(&format!(
            "\t<key>name</key>\n\t<string>Sphinx {} Completions</string>\n",
            capitalize(kind.plural())
        ));
        out.push_str("\t<key>scope</key>\n\t<string>text.restructuredtext</string>\n");
        out.push_str("\t<key>settings</key>\n\t<dict>\n\t\t<key>completions</key>\n");

        if entries.is_empty() {
            out.push_str("\t\t<array/>\n");
        } else {
            out.push_str("\t\t<array>\n");
            for (entry, record) in entries.iter().zip(&records) {
                let pad = width - entry.chars().count();
                out.push_str(&format!(
                    "{}{}  <!-- {} from {} -->\n",
                    entry,
                    " ".repeat(pad),
                    kind,
                    comment_safe(record.source.display_name())
                ));
            }
            out.push_str("\t\t</array>\n");
        }

        out.push_str("\t</dict>\n");
        out.push_str(&format!(
            "\t<key>uuid</key>\n\t<string>{}</string>\n",
            stable_uuid(&format!("sphinx-markup-extract/{}", kind))
        ));
        out.push_str("</dict>\n</plist>\n");
        out
    }
}

fn xml_escape(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}

/// `--` may not appear inside an XML comment.
fn comment_safe(text: &str) -> String {
    let mut out = xml_escape(text);
    while out.contains("--") {
        out = out.replace("--", "-\u{2010}");
    }
    out
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl Formatter for TmPreferencesFormatter {
    fn name(&self) -> &'static str {
        "tmprefs"
    }

    fn description(&self) -> &'static str {
        "TextMate completion lists (.tmPreferences), one file per kind"
    }

    fn render(&self, model: &Model) -> Result<Vec<OutputFile>, ExtractError> {
        Ok(NameKind::ALL
            .iter()
            .map(|&kind| OutputFile::text(Self::file_name(kind), self.document(model, kind)))
            .collect())
    }
}
