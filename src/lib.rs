//! Sphinx Markup Extract
//!
//! Lists the directives and roles a Sphinx project registers in its
//! `conf.py` and extension modules, and renders them as CSV, list literals,
//! TextMate completion files, JSON or a browsable HTML report.

pub mod annotate;
pub mod builder;
pub mod config;
pub mod error;
pub mod extractor;
pub mod formats;
pub mod matching;
pub mod model;
pub mod navigation;
pub mod sort_state;
pub mod utils;

pub use annotate::{AnnotatedPage, LineAnnotation};
pub use builder::{ExtractBuilder, RunStats};
pub use config::{ExtractConfig, QuoteStyle};
pub use error::{ExtractError, ExtractWarning, WarningKind};
pub use extractor::{Extraction, Extractor, RegistrationTable};
pub use formats::{Formatter, FormatterRegistry, OutputFile};
pub use model::{KindCounts, Model, NameKind, NameRecord, SourceRef};
pub use navigation::{ChunkPage, Command, PageSession, Selection, Viewport};
pub use sort_state::{SortDirection, SortKey, SortList};
