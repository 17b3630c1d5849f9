//! `csv`: one row per name record.

use super::{Formatter, OutputFile};
use crate::config::ExtractConfig;
use crate::error::ExtractError;
use crate::model::{Model, NameKind};
use regex::Regex;

lazy_static::lazy_static! {
    static ref DECIMAL_POINT: Regex = Regex::new(r"(\d+)\.(\d+)").unwrap();
}

pub const FILE_NAME: &str = "names.csv";

pub struct CsvFormatter {
    separator: char,
    decimal_comma: bool,
}

impl CsvFormatter {
    pub fn new(separator: char, decimal_comma: bool) -> Self {
        Self {
            separator,
            decimal_comma,
        }
    }

    pub fn from_config(config: &ExtractConfig) -> Self {
        Self::new(config.csv_separator(), config.csv.decimal_comma)
    }

    fn field(&self, value: &str) -> String {
        let value = if self.decimal_comma {
            DECIMAL_POINT.replace_all(value, "$1,$2")
        } else {
            value.into()
        };
        format!("\"{}\"", value.replace('"', "\"\""))
    }

    fn row(&self, values: [&str; 3]) -> String {
        let fields: Vec<String> = values.iter().map(|v| self.field(v)).collect();
        let mut row = fields.join(&self.separator.to_string());
        row.push('\n');
        row
    }
}

impl Formatter for CsvFormatter {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn description(&self) -> &'static str {
        "names.csv with kind, name and source columns"
    }

    fn render(&self, model: &Model) -> Result<Vec<OutputFile>, ExtractError> {
        let mut out = self.row(["kind", "name", "source"]);
        for kind in NameKind::ALL {
            for record in model.sorted_records(kind) {
                out.push_str(&self.row([
                    kind.as_str(),
                    &record.name,
                    record.source.display_name(),
                ]));
            }
        }
        Ok(vec![OutputFile::text(FILE_NAME, out)])
    }
}
