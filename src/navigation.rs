//! Chunk navigation over an annotated report page.
//!
//! This is the reference model of the keyboard navigation in `report.js`:
//! the script keeps the same selection state and runs the same scans, with
//! the DOM standing in for [`ChunkPage`] and the browser window standing in
//! for [`Viewport`].

use crate::annotate::LineAnnotation;
use std::ops::Range;

/// Line annotations of one page, addressed by 1-based line number.
pub trait ChunkPage {
    /// `None` for line 0 and for lines past the end of the page.
    fn line_annotation(&self, line: usize) -> Option<LineAnnotation>;
}

/// The visible part of a page.
pub trait Viewport {
    fn is_line_on_screen(&self, line: usize) -> bool;

    /// First line visible at the top edge, if any.
    fn line_at_top(&self) -> Option<usize>;

    /// Last line visible at the bottom edge, if any.
    fn line_at_bottom(&self) -> Option<usize>;

    fn scroll_to_line(&mut self, line: usize);

    /// Jump any running scroll animation to its end state.
    fn finish_scrolling(&mut self);

    /// Mark exactly `lines` as highlighted, clearing the previous marks.
    fn highlight(&mut self, lines: Range<usize>);
}

/// Current selection of a page session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    NoSelection,
    /// Half-open range of line numbers. `(0, 1)` is the top of the page.
    HasSelection { begin: usize, end: usize },
}

impl Selection {
    pub fn range(begin: usize, end: usize) -> Self {
        Selection::HasSelection { begin, end }
    }

    /// The top-of-page selection.
    pub fn top() -> Self {
        Self::range(0, 1)
    }

    /// Line numbers whose gutter entries are highlighted.
    pub fn highlighted_lines(&self) -> Range<usize> {
        match *self {
            Selection::NoSelection => 0..0,
            Selection::HasSelection { begin, end } => begin.max(1)..end.max(1),
        }
    }
}

/// A navigation command bound to a key in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    NextChunk,
    PrevChunk,
    Top,
    FirstChunk,
}

impl Command {
    pub fn from_key(key: char) -> Option<Self> {
        match key {
            'j' => Some(Command::NextChunk),
            'k' => Some(Command::PrevChunk),
            '0' => Some(Command::Top),
            '1' => Some(Command::FirstChunk),
            _ => None,
        }
    }
}

/// Navigation state for one viewed page.
pub struct PageSession<P, V> {
    page: P,
    viewport: V,
    selection: Selection,
}

impl<P: ChunkPage, V: Viewport> PageSession<P, V> {
    pub fn new(page: P, viewport: V) -> Self {
        Self {
            page,
            viewport,
            selection: Selection::NoSelection,
        }
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn viewport(&self) -> &V {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut V {
        &mut self.viewport
    }

    pub fn apply(&mut self, command: Command) {
        match command {
            Command::NextChunk => self.to_next_chunk_nicely(),
            Command::PrevChunk => self.to_prev_chunk_nicely(),
            Command::Top => self.to_top(),
            Command::FirstChunk => self.to_first_chunk(),
        }
    }

    /// Non-plain annotation of `line`, or `None` for plain and missing lines.
    fn indicator(&self, line: usize) -> Option<LineAnnotation> {
        self.page
            .line_annotation(line)
            .filter(|annotation| !annotation.is_transparent())
    }

    /// Select the chunk containing `line`, or just that line if it is plain.
    pub fn select_line_or_chunk(&mut self, line: usize) {
        let Some(annotation) = self.page.line_annotation(line) else {
            return;
        };
        if annotation.is_transparent() {
            self.set_selection(Selection::range(line, line + 1));
            return;
        }

        let mut begin = line;
        while begin > 1 && self.indicator(begin - 1) == Some(annotation) {
            begin -= 1;
        }
        let mut end = line + 1;
        while self.indicator(end) == Some(annotation) {
            end += 1;
        }
        self.set_selection(Selection::range(begin, end));
    }

    pub fn to_next_chunk(&mut self) {
        let mut probe = match self.selection {
            Selection::NoSelection => 1,
            Selection::HasSelection { end, .. } => end,
        };
        let chunk = loop {
            match self.page.line_annotation(probe) {
                None => return,
                Some(annotation) if annotation.is_transparent() => probe += 1,
                Some(annotation) => break annotation,
            }
        };

        let begin = probe;
        while self.indicator(probe) == Some(chunk) {
            probe += 1;
        }
        self.set_selection(Selection::range(begin, probe));
    }

    pub fn to_prev_chunk(&mut self) {
        let Selection::HasSelection { begin, .. } = self.selection else {
            return;
        };
        let Some(mut probe) = begin.checked_sub(1) else {
            return;
        };
        let chunk = loop {
            match self.page.line_annotation(probe) {
                None => return,
                Some(annotation) if annotation.is_transparent() => probe -= 1,
                Some(annotation) => break annotation,
            }
        };

        let end = probe + 1;
        while probe > 1 && self.indicator(probe - 1) == Some(chunk) {
            probe -= 1;
        }
        self.set_selection(Selection::range(probe, end));
    }

    pub fn to_top(&mut self) {
        self.set_selection(Selection::top());
    }

    pub fn to_first_chunk(&mut self) {
        self.selection = Selection::top();
        self.to_next_chunk();
    }

    /// Like [`to_next_chunk`](Self::to_next_chunk), but first moves the
    /// selection to the top of the screen if it has been scrolled away.
    pub fn to_next_chunk_nicely(&mut self) {
        self.viewport.finish_scrolling();
        if self.selection_ends_on_screen() == 0 {
            if let Some(line) = self.viewport.line_at_top() {
                self.select_line_or_chunk(line);
            }
        }
        self.to_next_chunk();
    }

    /// Like [`to_prev_chunk`](Self::to_prev_chunk), anchored at the bottom
    /// of the screen.
    pub fn to_prev_chunk_nicely(&mut self) {
        self.viewport.finish_scrolling();
        if self.selection_ends_on_screen() == 0 {
            if let Some(line) = self.viewport.line_at_bottom() {
                self.select_line_or_chunk(line);
            }
        }
        self.to_prev_chunk();
    }

    /// Bit 1: first selected line visible. Bit 2: last selected line visible.
    pub fn selection_ends_on_screen(&self) -> u8 {
        match self.selection {
            Selection::HasSelection { begin, end } if begin > 0 => {
                let top = self.viewport.is_line_on_screen(begin) as u8;
                let bottom = self.viewport.is_line_on_screen(end - 1) as u8;
                top | (bottom << 1)
            }
            _ => 0,
        }
    }

    fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
        self.viewport.highlight(selection.highlighted_lines());
        if self.selection_ends_on_screen() < 3 {
            if let Selection::HasSelection { begin, .. } = selection {
                self.viewport.scroll_to_line(begin);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::AnnotatedPage;
    use crate::annotate::LineAnnotation::*;

    /// A screen showing `height` lines starting at `top`.
    #[derive(Debug, Default)]
    struct FakeViewport {
        top: usize,
        height: usize,
        page_len: usize,
        highlighted: Range<usize>,
        scrolls: Vec<usize>,
        finished: usize,
    }

    impl FakeViewport {
        fn new(page_len: usize, top: usize, height: usize) -> Self {
            Self {
                top,
                height,
                page_len,
                ..Self::default()
            }
        }
    }

    impl Viewport for FakeViewport {
        fn is_line_on_screen(&self, line: usize) -> bool {
            line >= self.top && line < self.top + self.height
        }

        fn line_at_top(&self) -> Option<usize> {
            (self.top <= self.page_len).then_some(self.top.max(1))
        }

        fn line_at_bottom(&self) -> Option<usize> {
            let bottom = (self.top + self.height - 1).min(self.page_len);
            (bottom >= 1).then_some(bottom)
        }

        fn scroll_to_line(&mut self, line: usize) {
            self.top = line.saturating_sub(2).max(1);
            self.scrolls.push(line);
        }

        fn finish_scrolling(&mut self) {
            self.finished += 1;
        }

        fn highlight(&mut self, lines: Range<usize>) {
            self.highlighted = lines;
        }
    }

    /// Lines 3-7 are directives, 10-12 roles, 15 a directive, 20 lines total.
    fn sample_page() -> AnnotatedPage {
        let mut lines = vec![Plain; 20];
        for line in 3..=7 {
            lines[line - 1] = Directive;
        }
        for line in 10..=12 {
            lines[line - 1] = Role;
        }
        lines[14] = Directive;
        AnnotatedPage::from_annotations(lines)
    }

    fn session() -> PageSession<AnnotatedPage, FakeViewport> {
        PageSession::new(sample_page(), FakeViewport::new(20, 1, 40))
    }

    #[test]
    fn test_select_line_expands_to_chunk() {
        let mut session = session();
        session.select_line_or_chunk(5);
        assert_eq!(session.selection(), Selection::range(3, 8));
        assert_eq!(session.viewport().highlighted, 3..8);
    }

    #[test]
    fn test_select_plain_line() {
        let mut session = session();
        session.select_line_or_chunk(9);
        assert_eq!(session.selection(), Selection::range(9, 10));
    }

    #[test]
    fn test_select_missing_line_is_noop() {
        let mut session = session();
        session.select_line_or_chunk(0);
        session.select_line_or_chunk(21);
        assert_eq!(session.selection(), Selection::NoSelection);
    }

    #[test]
    fn test_chunk_does_not_merge_different_kinds() {
        let page = AnnotatedPage::from_annotations(vec![Role, Role, Directive, Directive, Plain]);
        let mut session = PageSession::new(page, FakeViewport::new(5, 1, 10));
        session.select_line_or_chunk(2);
        assert_eq!(session.selection(), Selection::range(1, 3));
        session.to_next_chunk();
        assert_eq!(session.selection(), Selection::range(3, 5));
    }

    #[test]
    fn test_next_chunk() {
        let mut session = session();
        session.select_line_or_chunk(5);
        session.to_next_chunk();
        assert_eq!(session.selection(), Selection::range(10, 13));
        session.to_next_chunk();
        assert_eq!(session.selection(), Selection::range(15, 16));

        // Nothing after line 15.
        session.to_next_chunk();
        assert_eq!(session.selection(), Selection::range(15, 16));
    }

    #[test]
    fn test_next_chunk_without_selection_starts_at_first_line() {
        let mut session = session();
        session.to_next_chunk();
        assert_eq!(session.selection(), Selection::range(3, 8));
    }

    #[test]
    fn test_prev_chunk() {
        let mut session = session();
        session.select_line_or_chunk(15);
        session.to_prev_chunk();
        assert_eq!(session.selection(), Selection::range(10, 13));
        session.to_prev_chunk();
        assert_eq!(session.selection(), Selection::range(3, 8));
        session.to_prev_chunk();
        assert_eq!(session.selection(), Selection::range(3, 8));
    }

    #[test]
    fn test_prev_chunk_without_selection_is_noop() {
        let mut session = session();
        session.to_prev_chunk();
        assert_eq!(session.selection(), Selection::NoSelection);

        session.to_top();
        session.to_prev_chunk();
        assert_eq!(session.selection(), Selection::top());
    }

    #[test]
    fn test_to_top_from_any_state() {
        let mut session = session();
        session.to_top();
        assert_eq!(session.selection(), Selection::range(0, 1));
        assert_eq!(session.viewport().highlighted, 1..1);

        session.select_line_or_chunk(11);
        session.to_top();
        assert_eq!(session.selection(), Selection::range(0, 1));
        session.to_top();
        assert_eq!(session.selection(), Selection::range(0, 1));
    }

    #[test]
    fn test_first_chunk() {
        let mut session = session();
        session.select_line_or_chunk(15);
        session.apply(Command::FirstChunk);
        assert_eq!(session.selection(), Selection::range(3, 8));
    }

    #[test]
    fn test_scrolls_only_when_not_fully_visible() {
        let page = sample_page();
        let mut session = PageSession::new(page, FakeViewport::new(20, 1, 40));
        session.select_line_or_chunk(5);
        assert!(session.viewport().scrolls.is_empty());

        let mut session = PageSession::new(sample_page(), FakeViewport::new(20, 1, 6));
        session.select_line_or_chunk(5);
        assert_eq!(session.viewport().scrolls, vec![3]);
    }

    #[test]
    fn test_next_nicely_relocates_to_screen_top() {
        // Selection on 3-7, screen scrolled to show lines 13-17.
        let mut session = PageSession::new(sample_page(), FakeViewport::new(20, 1, 5));
        session.select_line_or_chunk(3);
        session.viewport_mut().top = 13;

        session.to_next_chunk_nicely();
        assert_eq!(session.viewport().finished, 1);
        assert_eq!(session.selection(), Selection::range(15, 16));
    }

    #[test]
    fn test_next_nicely_with_visible_selection() {
        let mut session = session();
        session.select_line_or_chunk(3);
        session.apply(Command::NextChunk);
        assert_eq!(session.selection(), Selection::range(10, 13));
    }

    #[test]
    fn test_prev_nicely_relocates_to_screen_bottom() {
        // Selection on 15, screen shows lines 1-11; bottom line 11 is in 10-12.
        let mut session = PageSession::new(sample_page(), FakeViewport::new(20, 1, 40));
        session.select_line_or_chunk(15);
        session.viewport_mut().top = 1;
        session.viewport_mut().height = 11;

        session.to_prev_chunk_nicely();
        assert_eq!(session.selection(), Selection::range(3, 8));
    }

    #[test]
    fn test_command_keys() {
        assert_eq!(Command::from_key('j'), Some(Command::NextChunk));
        assert_eq!(Command::from_key('k'), Some(Command::PrevChunk));
        assert_eq!(Command::from_key('0'), Some(Command::Top));
        assert_eq!(Command::from_key('1'), Some(Command::FirstChunk));
        assert_eq!(Command::from_key('x'), None);
    }
}
