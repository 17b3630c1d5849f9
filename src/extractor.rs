//! Extraction of registered directive and role names from Python sources.
//!
//! Each file is tokenized and scanned on its own, so a malformed file only
//! costs its own records. Results are merged into a [`Model`] in input order.

pub mod calls;
pub mod tokenizer;

pub use calls::{ArgRef, CallSpec, NameSlot, RegistrationTable};
pub use tokenizer::{tokenize, Token, TokenKind, TokenizeError};

use crate::config::ExtractConfig;
use crate::error::{ExtractError, ExtractWarning};
use crate::model::{Model, NameKind, ScannedSource, SourceRef};
use log::{debug, warn};
use rayon::prelude::*;

/// Outcome of extracting from a batch of sources.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub model: Model,
    pub warnings: Vec<ExtractWarning>,
    /// Number of sources that scanned successfully.
    pub scanned: usize,
    /// Number of sources skipped because of a warning.
    pub skipped: usize,
}

impl Extraction {
    /// True when sources were given but none of them could be used.
    pub fn all_failed(&self) -> bool {
        self.scanned == 0 && self.skipped > 0
    }
}

/// Scans Python source text for registration calls.
pub struct Extractor {
    table: RegistrationTable,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor {
    /// Create an extractor that knows the Sphinx and docutils calls.
    pub fn new() -> Self {
        Self::with_table(RegistrationTable::sphinx_defaults())
    }

    pub fn with_table(table: RegistrationTable) -> Self {
        Self { table }
    }

    /// Create an extractor with the configured extra registration calls.
    pub fn from_config(config: &ExtractConfig) -> Self {
        let mut table = RegistrationTable::sphinx_defaults();
        for call in &config.extra_directive_calls {
            table.register_simple(call, NameKind::Directive);
        }
        for call in &config.extra_role_calls {
            table.register_simple(call, NameKind::Role);
        }
        Self::with_table(table)
    }

    pub fn table(&self) -> &RegistrationTable {
        &self.table
    }

    /// Scan one source text.
    pub fn scan(&self, source: SourceRef, text: String) -> Result<ScannedSource, ExtractError> {
        let tokens = tokenize(&text).map_err(|e| ExtractError::ExtractionParse {
            path: source.path().to_path_buf(),
            line: e.line(),
            reason: e.to_string(),
        })?;
        let occurrences = self.table.scan(&tokens);
        debug!(
            "Scanned {}: {} tokens, {} registrations",
            source,
            tokens.len(),
            occurrences.len()
        );
        Ok(ScannedSource {
            source,
            text,
            occurrences,
        })
    }

    /// Scan raw file contents, rejecting anything that is not UTF-8.
    pub fn scan_bytes(
        &self,
        source: SourceRef,
        bytes: Vec<u8>,
    ) -> Result<ScannedSource, ExtractError> {
        let mut text = String::from_utf8(bytes).map_err(|e| ExtractError::InputRead {
            path: source.path().to_path_buf(),
            reason: format!("not valid UTF-8: {}", e.utf8_error()),
        })?;
        if text.starts_with('\u{feff}') {
            text.remove(0);
        }
        self.scan(source, text)
    }

    /// Read and scan one file from disk.
    pub fn scan_file(&self, source: SourceRef) -> Result<ScannedSource, ExtractError> {
        let bytes = std::fs::read(source.path()).map_err(|e| ExtractError::InputRead {
            path: source.path().to_path_buf(),
            reason: e.to_string(),
        })?;
        self.scan_bytes(source, bytes)
    }

    /// Extract from in-memory `(source, text)` pairs.
    pub fn extract<I>(&self, inputs: I) -> Extraction
    where
        I: IntoIterator<Item = (SourceRef, String)>,
    {
        let results: Vec<_> = inputs
            .into_iter()
            .map(|(source, text)| self.scan(source, text))
            .collect();
        merge(results)
    }

    /// Read and extract from files on disk. Files are read and scanned on
    /// the rayon pool, then merged in the order given.
    pub fn extract_files(&self, sources: &[SourceRef]) -> Extraction {
        let results: Vec<_> = sources
            .par_iter()
            .map(|source| self.scan_file(source.clone()))
            .collect();
        merge(results)
    }
}

fn merge(results: Vec<Result<ScannedSource, ExtractError>>) -> Extraction {
    let mut scanned = Vec::new();
    let mut warnings = Vec::new();
    for result in results {
        match result {
            Ok(source) => scanned.push(source),
            Err(e) => {
                warn!("Skipping file: {}", e);
                if let Some(warning) = e.to_warning() {
                    warnings.push(warning);
                }
            }
        }
    }
    Extraction {
        scanned: scanned.len(),
        skipped: warnings.len(),
        model: Model::build(scanned),
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WarningKind;

    fn input(name: &str, text: &str) -> (SourceRef, String) {
        (SourceRef::new(name, name), text.to_string())
    }

    #[test]
    fn test_counts_directives_and_roles() {
        let text = "\
def setup(app):
    app.add_directive('one', One)
    app.add_directive('two', Two)
    app.add_directive('three', Three)
    app.add_role('alpha', alpha_role)
    app.add_role('beta', beta_role)
";
        let extraction = Extractor::new().extract(vec![input("conf.py", text)]);
        let counts = extraction.model.counts();
        assert_eq!(counts.directives, 3);
        assert_eq!(counts.roles, 2);
        assert_eq!(extraction.model.len(), 5);
        assert!(extraction.model.contains(NameKind::Directive, "two"));
        assert!(extraction.model.contains(NameKind::Role, "beta"));
        assert!(!extraction.model.contains(NameKind::Role, "two"));
    }

    #[test]
    fn test_malformed_file_is_skipped() {
        let extraction = Extractor::new().extract(vec![
            input("a.py", "app.add_role('first', r)\n"),
            input("b.py", "app.add_role('broken, r)\n"),
            input("c.py", "app.add_directive('third', D)\n"),
        ]);

        assert_eq!(extraction.model.len(), 2);
        assert!(extraction.model.contains(NameKind::Role, "first"));
        assert!(extraction.model.contains(NameKind::Directive, "third"));
        assert_eq!(extraction.warnings.len(), 1);
        assert_eq!(extraction.warnings[0].kind, WarningKind::ExtractionParse);
        assert_eq!(extraction.warnings[0].path.to_string_lossy(), "b.py");
        assert_eq!(extraction.scanned, 2);
        assert_eq!(extraction.skipped, 1);
        assert!(!extraction.all_failed());
    }

    #[test]
    fn test_invalid_utf8_is_an_input_error() {
        let source = SourceRef::new("latin1.py", "latin1.py");
        let err = Extractor::new()
            .scan_bytes(source, vec![b'x', b'=', 0xff, b'\n'])
            .unwrap_err();
        assert!(matches!(err, ExtractError::InputRead { .. }));
    }

    #[test]
    fn test_bom_is_stripped() {
        let source = SourceRef::new("conf.py", "conf.py");
        let mut bytes = "\u{feff}app.add_role('x', r)\n".as_bytes().to_vec();
        bytes.push(b'\n');
        let scanned = Extractor::new().scan_bytes(source, bytes).unwrap();
        assert_eq!(scanned.occurrences.len(), 1);
        assert!(!scanned.text.starts_with('\u{feff}'));
    }

    #[test]
    fn test_extra_calls_from_config() {
        let config = ExtractConfig {
            extra_directive_calls: vec!["add_autodocumenter_directive".to_string()],
            ..ExtractConfig::default()
        };
        let extractor = Extractor::from_config(&config);
        let extraction = extractor.extract(vec![input(
            "conf.py",
            "app.add_autodocumenter_directive('autothing', X)\n",
        )]);
        assert!(extraction.model.contains(NameKind::Directive, "autothing"));
    }

    #[test]
    fn test_all_failed() {
        let extraction = Extractor::new().extract(vec![input("bad.py", "x = (\n")]);
        assert!(extraction.all_failed());
        assert!(extraction.model.is_empty());
    }
}
