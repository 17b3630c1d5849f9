//! `json`: the model as a single JSON document.

use super::{Formatter, OutputFile};
use crate::error::ExtractError;
use crate::model::{KindCounts, Model, NameKind, NameRecord};
use serde::Serialize;

pub const FILE_NAME: &str = "names.json";

#[derive(Serialize)]
struct Document<'a> {
    generator: String,
    counts: KindCounts,
    records: Vec<JsonRecord<'a>>,
}

#[derive(Serialize)]
struct JsonRecord<'a> {
    kind: NameKind,
    name: &'a str,
    source: &'a str,
}

impl<'a> From<&'a NameRecord> for JsonRecord<'a> {
    fn from(record: &'a NameRecord) -> Self {
        Self {
            kind: record.kind,
            name: &record.name,
            source: record.source.display_name(),
        }
    }
}

#[derive(Debug, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl Formatter for JsonFormatter {
    fn name(&self) -> &'static str {
        "json"
    }

    fn description(&self) -> &'static str {
        "names.json with counts and every record"
    }

    fn render(&self, model: &Model) -> Result<Vec<OutputFile>, ExtractError> {
        let document = Document {
            generator: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            counts: model.counts(),
            records: NameKind::ALL
                .iter()
                .flat_map(|&kind| model.sorted_records(kind))
                .map(JsonRecord::from)
                .collect(),
        };
        let mut text = serde_json::to_string_pretty(&document).map_err(|e| {
            ExtractError::OutputWrite {
                path: FILE_NAME.into(),
                reason: e.to_string(),
            }
        })?;
        text.push('\n');
        Ok(vec![OutputFile::text(FILE_NAME, text)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::Extractor;
    use crate::model::SourceRef;

    #[test]
    fn test_json_document() {
        let model = Extractor::new()
            .extract(vec![(
                SourceRef::new("conf.py", "conf.py"),
                concat!(
                    "app.add_role('b', r)\n",
                    "app.add_directive('a', A)\n",
                    "app.add_role('a', r)\n",
                )
                .to_string(),
            )])
            .model;
        let files = JsonFormatter::new().render(&model).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&files[0].contents).unwrap();

        assert_eq!(value["counts"]["directives"], 1);
        assert_eq!(value["counts"]["roles"], 2);
        let records = value["records"].as_array().unwrap();
        let keys: Vec<(String, String)> = records
            .iter()
            .map(|r| {
                (
                    r["kind"].as_str().unwrap().to_string(),
                    r["name"].as_str().unwrap().to_string(),
                )
            })
            .collect();
        assert_eq!(
            keys,
            vec![
                ("directive".to_string(), "a".to_string()),
                ("role".to_string(), "a".to_string()),
                ("role".to_string(), "b".to_string()),
            ]
        );
        assert_eq!(records[0]["source"], "conf.py");
    }

    #[test]
    fn test_empty_model() {
        let files = JsonFormatter::new().render(&Model::default()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&files[0].contents).unwrap();
        assert_eq!(value["records"].as_array().unwrap().len(), 0);
        assert_eq!(value["counts"]["roles"], 0);
    }
}
