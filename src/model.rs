//! Name records and the immutable model built from one extraction run.

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Kind of markup extension point a name was registered as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NameKind {
    Directive,
    Role,
}

impl NameKind {
    pub const ALL: [NameKind; 2] = [NameKind::Directive, NameKind::Role];

    pub fn as_str(&self) -> &'static str {
        match self {
            NameKind::Directive => "directive",
            NameKind::Role => "role",
        }
    }

    /// Plural form used for file names and headings.
    pub fn plural(&self) -> &'static str {
        match self {
            NameKind::Directive => "directives",
            NameKind::Role => "roles",
        }
    }
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies one scanned input file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SourceRef {
    path: PathBuf,
    display_name: String,
}

impl SourceRef {
    pub fn new(path: impl Into<PathBuf>, display_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            display_name: display_name.into(),
        }
    }

    /// Build a reference whose display name is `path` relative to `root`.
    ///
    /// Falls back to the full path when `path` is not below `root`.
    pub fn relative_to(path: &Path, root: &Path) -> Self {
        let display_name = pathdiff::diff_paths(path, root)
            .filter(|rel| !rel.as_os_str().is_empty() && !rel.starts_with(".."))
            .unwrap_or_else(|| path.to_path_buf());
        Self::new(path, display_name.to_string_lossy().replace('\\', "/"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name)
    }
}

/// One distinct registered name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameRecord {
    pub kind: NameKind,
    pub name: String,
    pub source: SourceRef,
}

/// A single registration found in a file, before deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Occurrence {
    pub kind: NameKind,
    pub name: String,
    /// 1-based line of the name literal.
    pub line: usize,
}

/// The result of scanning one file successfully.
#[derive(Debug, Clone, Serialize)]
pub struct ScannedSource {
    pub source: SourceRef,
    #[serde(skip)]
    pub text: String,
    pub occurrences: Vec<Occurrence>,
}

impl ScannedSource {
    pub fn line_count(&self) -> usize {
        self.text.lines().count()
    }
}

/// Record counts split by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindCounts {
    pub directives: usize,
    pub roles: usize,
}

impl KindCounts {
    pub fn total(&self) -> usize {
        self.directives + self.roles
    }

    pub fn get(&self, kind: NameKind) -> usize {
        match kind {
            NameKind::Directive => self.directives,
            NameKind::Role => self.roles,
        }
    }

    fn bump(&mut self, kind: NameKind) {
        match kind {
            NameKind::Directive => self.directives += 1,
            NameKind::Role => self.roles += 1,
        }
    }
}

/// Deduplicated name records plus the per-file scan data they came from.
///
/// Built once with [`Model::build`] and read-only afterwards. Counts are
/// derived on every call instead of being cached next to the records.
#[derive(Debug, Clone, Default)]
pub struct Model {
    records: IndexMap<(NameKind, String), NameRecord>,
    sources: Vec<ScannedSource>,
}

impl Model {
    /// Merge scanned sources in the given order; the first occurrence of a
    /// `(kind, name)` pair keeps its source.
    pub fn build(sources: Vec<ScannedSource>) -> Self {
        let mut records = IndexMap::new();
        for scanned in &sources {
            for occurrence in &scanned.occurrences {
                records
                    .entry((occurrence.kind, occurrence.name.clone()))
                    .or_insert_with(|| NameRecord {
                        kind: occurrence.kind,
                        name: occurrence.name.clone(),
                        source: scanned.source.clone(),
                    });
            }
        }
        Self { records, sources }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Records in insertion order.
    pub fn records(&self) -> impl Iterator<Item = &NameRecord> {
        self.records.values()
    }

    pub fn records_of(&self, kind: NameKind) -> impl Iterator<Item = &NameRecord> {
        self.records.values().filter(move |record| record.kind == kind)
    }

    /// Records of one kind sorted by name, the order every formatter emits.
    pub fn sorted_records(&self, kind: NameKind) -> Vec<&NameRecord> {
        let mut records: Vec<_> = self.records_of(kind).collect();
        records.sort_by(|a, b| a.name.cmp(&b.name));
        records
    }

    pub fn contains(&self, kind: NameKind, name: &str) -> bool {
        self.records.contains_key(&(kind, name.to_string()))
    }

    pub fn sources(&self) -> &[ScannedSource] {
        &self.sources
    }

    pub fn counts(&self) -> KindCounts {
        let mut counts = KindCounts::default();
        for record in self.records.values() {
            counts.bump(record.kind);
        }
        counts
    }

    /// Distinct names registered in one file, by kind.
    pub fn source_counts(&self, source: &SourceRef) -> KindCounts {
        let mut counts = KindCounts::default();
        if let Some(scanned) = self.sources.iter().find(|s| &s.source == source) {
            let distinct: BTreeSet<_> = scanned
                .occurrences
                .iter()
                .map(|o| (o.kind, o.name.as_str()))
                .collect();
            for (kind, _) in distinct {
                counts.bump(kind);
            }
        }
        counts
    }

    fn keys(&self) -> BTreeSet<(NameKind, &str)> {
        self.records
            .values()
            .map(|r| (r.kind, r.name.as_str()))
            .collect()
    }
}

impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        self.keys() == other.keys()
    }
}

impl Eq for Model {}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanned(name: &str, occurrences: &[(NameKind, &str, usize)]) -> ScannedSource {
        ScannedSource {
            source: SourceRef::new(name, name),
            text: String::new(),
            occurrences: occurrences
                .iter()
                .map(|(kind, name, line)| Occurrence {
                    kind: *kind,
                    name: name.to_string(),
                    line: *line,
                })
                .collect(),
        }
    }

    #[test]
    fn test_first_occurrence_wins() {
        let model = Model::build(vec![
            scanned("conf.py", &[(NameKind::Directive, "todo", 3)]),
            scanned(
                "ext/todo.py",
                &[(NameKind::Directive, "todo", 10), (NameKind::Role, "todo", 11)],
            ),
        ]);

        assert_eq!(model.len(), 2);
        let record = model.records().next().unwrap();
        assert_eq!(record.name, "todo");
        assert_eq!(record.source.display_name(), "conf.py");
    }

    #[test]
    fn test_counts_are_derived() {
        let model = Model::build(vec![
            scanned("a.py", &[(NameKind::Directive, "x", 1), (NameKind::Role, "y", 2)]),
            scanned(
                "b.py",
                &[
                    (NameKind::Role, "y", 1),
                    (NameKind::Role, "z", 2),
                    (NameKind::Role, "z", 3),
                ],
            ),
        ]);

        assert_eq!(model.counts(), KindCounts { directives: 1, roles: 2 });
        let b = model.sources()[1].source.clone();
        assert_eq!(model.source_counts(&b), KindCounts { directives: 0, roles: 2 });
        assert_eq!(model.source_counts(&SourceRef::new("missing.py", "missing.py")).total(), 0);
    }

    #[test]
    fn test_sorted_records() {
        let model = Model::build(vec![scanned(
            "conf.py",
            &[
                (NameKind::Role, "zeta", 1),
                (NameKind::Role, "alpha", 2),
                (NameKind::Directive, "mid", 3),
            ],
        )]);
        let names: Vec<_> = model
            .sorted_records(NameKind::Role)
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_equality_ignores_order_and_source() {
        let a = Model::build(vec![
            scanned("a.py", &[(NameKind::Directive, "x", 1)]),
            scanned("b.py", &[(NameKind::Role, "y", 1)]),
        ]);
        let b = Model::build(vec![
            scanned("b.py", &[(NameKind::Role, "y", 1)]),
            scanned("a.py", &[(NameKind::Directive, "x", 1)]),
        ]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_source_ref_relative() {
        let source = SourceRef::relative_to(Path::new("/docs/ext/roles.py"), Path::new("/docs"));
        assert_eq!(source.display_name(), "ext/roles.py");

        let outside = SourceRef::relative_to(Path::new("/elsewhere/conf.py"), Path::new("/docs"));
        assert_eq!(outside.display_name(), "/elsewhere/conf.py");
    }
}
