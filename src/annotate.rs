//! Per-line shading of a scanned source for the HTML report.

use crate::model::{NameKind, ScannedSource};
use crate::navigation::ChunkPage;
use serde::Serialize;
use std::ops::Range;

/// Background of one rendered line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineAnnotation {
    #[default]
    Plain,
    Directive,
    Role,
    /// Both kinds registered on the same line.
    Mixed,
}

impl LineAnnotation {
    /// Class attribute of the line's `<p>` element.
    pub fn css_class(&self) -> &'static str {
        match self {
            LineAnnotation::Plain => "pln",
            LineAnnotation::Directive => "dir",
            LineAnnotation::Role => "role",
            LineAnnotation::Mixed => "mix",
        }
    }

    pub fn is_transparent(&self) -> bool {
        *self == LineAnnotation::Plain
    }

    /// Shade after a registration of `kind` lands on this line.
    pub fn with(self, kind: NameKind) -> Self {
        let added = match kind {
            NameKind::Directive => LineAnnotation::Directive,
            NameKind::Role => LineAnnotation::Role,
        };
        match self {
            LineAnnotation::Plain => added,
            current if current == added => current,
            _ => LineAnnotation::Mixed,
        }
    }
}

/// Annotations for every line of one page, line 1 first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotatedPage {
    lines: Vec<LineAnnotation>,
}

impl AnnotatedPage {
    pub fn from_annotations(lines: Vec<LineAnnotation>) -> Self {
        Self { lines }
    }

    pub fn from_source(scanned: &ScannedSource) -> Self {
        let mut lines = vec![LineAnnotation::Plain; scanned.line_count()];
        for occurrence in &scanned.occurrences {
            if let Some(slot) = occurrence.line.checked_sub(1).and_then(|i| lines.get_mut(i)) {
                *slot = slot.with(occurrence.kind);
            }
        }
        Self { lines }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// `(line number, annotation)` pairs starting at line 1.
    pub fn iter(&self) -> impl Iterator<Item = (usize, LineAnnotation)> + '_ {
        self.lines.iter().enumerate().map(|(i, a)| (i + 1, *a))
    }

    /// Maximal runs of equal non-plain annotations, as half-open line ranges.
    pub fn chunks(&self) -> Vec<Range<usize>> {
        let mut chunks: Vec<Range<usize>> = Vec::new();
        let mut previous = LineAnnotation::Plain;
        for (line, annotation) in self.iter() {
            if !annotation.is_transparent() {
                match chunks.last_mut() {
                    Some(chunk) if annotation == previous && chunk.end == line => chunk.end += 1,
                    _ => chunks.push(line..line + 1),
                }
            }
            previous = annotation;
        }
        chunks
    }
}

impl ChunkPage for AnnotatedPage {
    fn line_annotation(&self, line: usize) -> Option<LineAnnotation> {
        line.checked_sub(1).and_then(|i| self.lines.get(i)).copied()
    }
}
