//! Output formats.
//!
//! Every format implements [`Formatter`] and is looked up by name in a
//! [`FormatterRegistry`]. Formatters only read the [`Model`]; writing the
//! files they return is up to the caller.

pub mod delimited;
pub mod editor_snippet;
pub mod html;
pub mod json;
pub mod list_literal;

pub use delimited::CsvFormatter;
pub use editor_snippet::TmPreferencesFormatter;
pub use html::HtmlFormatter;
pub use json::JsonFormatter;
pub use list_literal::ListFormatter;

use crate::config::ExtractConfig;
use crate::error::ExtractError;
use crate::model::Model;
use std::collections::HashMap;
use std::path::PathBuf;

/// One rendered file, relative to its format's output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub path: PathBuf,
    pub contents: Vec<u8>,
}

impl OutputFile {
    pub fn new(path: impl Into<PathBuf>, contents: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            contents,
        }
    }

    pub fn text(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self::new(path, contents.into().into_bytes())
    }

    /// Contents as text, for formats that produce UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.contents).ok()
    }
}

/// Renders a model into one or more files.
pub trait Formatter: Send + Sync {
    /// Name used on the command line and as the output subdirectory.
    fn name(&self) -> &'static str;

    /// One-line summary for `--list-formats`.
    fn description(&self) -> &'static str;

    /// Render `model`. The same model always gives byte-identical files.
    fn render(&self, model: &Model) -> Result<Vec<OutputFile>, ExtractError>;
}

/// Formatters keyed by name.
#[derive(Default)]
pub struct FormatterRegistry {
    formatters: HashMap<&'static str, Box<dyn Formatter>>,
}

impl FormatterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// All built-in formats, configured from `config`.
    pub fn with_builtin_formatters(config: &ExtractConfig) -> Result<Self, ExtractError> {
        let mut registry = Self::new();
        registry.register(Box::new(CsvFormatter::from_config(config)));
        registry.register(Box::new(ListFormatter::from_config(config)));
        registry.register(Box::new(TmPreferencesFormatter::new()));
        registry.register(Box::new(JsonFormatter::new()));
        registry.register(Box::new(HtmlFormatter::from_config(config)?));
        Ok(registry)
    }

    /// Add a formatter, replacing any with the same name.
    pub fn register(&mut self, formatter: Box<dyn Formatter>) {
        self.formatters.insert(formatter.name(), formatter);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Formatter> {
        self.formatters.get(name).map(|f| f.as_ref())
    }

    /// Registered names in alphabetical order.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.formatters.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.formatters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formatters.is_empty()
    }
}
