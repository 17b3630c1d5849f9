//! Error taxonomy for extraction runs.
//!
//! Per-file and per-format failures are downgraded to [`ExtractWarning`]s by
//! the builder whenever other work can still proceed. Only [`ExtractError::Config`]
//! and [`ExtractError::NoInput`] abort a whole run.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    /// The file could not be read or is not valid UTF-8.
    #[error("cannot read {}: {reason}", .path.display())]
    InputRead { path: PathBuf, reason: String },

    /// The file was read but the tokenizer rejected it.
    #[error("cannot parse {} (line {line}): {reason}", .path.display())]
    ExtractionParse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// A destination file or directory could not be written.
    #[error("cannot write {}: {reason}", .path.display())]
    OutputWrite { path: PathBuf, reason: String },

    /// Invalid option combination, reported before any extraction runs.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("no usable input files")]
    NoInput,

    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),
}

impl ExtractError {
    /// Whether the error ends the whole run rather than a single unit of work.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ExtractError::Config(_) | ExtractError::NoInput)
    }

    /// Downgrade a per-unit error into a warning. Fatal errors have no warning form.
    pub fn to_warning(&self) -> Option<ExtractWarning> {
        match self {
            ExtractError::InputRead { path, reason } => {
                Some(ExtractWarning::skipped_file(path.clone(), reason.clone()))
            }
            ExtractError::ExtractionParse { path, line, reason } => Some(
                ExtractWarning::unparsable_file(path.clone(), *line, reason.clone()),
            ),
            ExtractError::OutputWrite { path, reason } => {
                Some(ExtractWarning::unwritable_output(path.clone(), reason.clone()))
            }
            _ => None,
        }
    }
}

/// What kind of unit a warning was raised for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    InputRead,
    ExtractionParse,
    OutputWrite,
}

/// A non-fatal problem recorded during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractWarning {
    pub kind: WarningKind,
    pub path: PathBuf,
    pub line: Option<usize>,
    pub reason: String,
}

impl ExtractWarning {
    pub fn skipped_file(path: PathBuf, reason: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::InputRead,
            path,
            line: None,
            reason: reason.into(),
        }
    }

    pub fn unparsable_file(path: PathBuf, line: usize, reason: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::ExtractionParse,
            path,
            line: Some(line),
            reason: reason.into(),
        }
    }

    pub fn unwritable_output(path: PathBuf, reason: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::OutputWrite,
            path,
            line: None,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ExtractWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}: {}", self.path.display(), line, self.reason),
            None => write!(f, "{}: {}", self.path.display(), self.reason),
        }
    }
}
