/// Document buffer and caret model.
///
/// Owns the note text, the caret and the selection anchor. Every mutation
/// goes through `replace_range` — the single splice primitive — so callers
/// (key handling, command commits, AI tools) all share the same caret and
/// clamping behavior.
// ── Closing-tag caret rule ────────────────────────────────────────────────────

/// Marker that makes an insertion "fill-in-the-blank": when the inserted
/// text contains a closing tag, the caret parks just before it instead of
/// after the whole insertion.
const CLOSING_TAG: &str = "</";

// ── Editor ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct Editor {
    text: String,
    /// Byte offset into `text`, always on a char boundary
    caret: usize,
    /// Selection anchor; the selection is the span between anchor and caret.
    /// None = plain caret, no selection.
    anchor: Option<usize>,
}

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_text(text: String) -> Self {
        Self { text, caret: 0, anchor: None }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn caret(&self) -> usize {
        self.caret
    }

    /// Current selection as (start, end) with start <= end.
    /// Collapses to (caret, caret) when nothing is selected.
    pub fn selection(&self) -> (usize, usize) {
        match self.anchor {
            Some(a) if a <= self.caret => (a, self.caret),
            Some(a) => (self.caret, a),
            None => (self.caret, self.caret),
        }
    }

    pub fn has_selection(&self) -> bool {
        let (start, end) = self.selection();
        start != end
    }

    pub fn selected_text(&self) -> &str {
        let (start, end) = self.selection();
        &self.text[start..end]
    }

    /// Move the caret, optionally extending the selection. A plain move
    /// drops the anchor; an extending move plants one on first use.
    pub fn move_caret(&mut self, to: usize, extend: bool) {
        if extend {
            if self.anchor.is_none() {
                self.anchor = Some(self.caret);
            }
        } else {
            self.anchor = None;
        }
        self.caret = clamp_boundary(&self.text, to);
    }

    pub fn clear_selection(&mut self) {
        self.anchor = None;
    }

    // ── Insertion / replacement engine ────────────────────────────────────────

    /// Splice `insert` over `[start, end)` and reposition the caret.
    ///
    /// Out-of-range or misordered bounds are clamped rather than panicking —
    /// a malformed range from a caller must never corrupt the buffer. The
    /// caret lands after the inserted text, or just before a `</` closing
    /// tag when the insertion carries one.
    pub fn replace_range(&mut self, start: usize, end: usize, insert: &str) {
        let len = self.text.len();
        let mut start = clamp_boundary(&self.text, start.min(len));
        let mut end = clamp_boundary(&self.text, end.min(len));
        if start > end {
            std::mem::swap(&mut start, &mut end);
        }

        self.text.replace_range(start..end, insert);

        self.caret = match insert.find(CLOSING_TAG) {
            Some(idx) => start + idx,
            None => start + insert.len(),
        };
        self.anchor = None;
    }

    /// Insert at the caret, replacing the active selection if there is one.
    pub fn insert_at_caret(&mut self, insert: &str) {
        let (start, end) = self.selection();
        self.replace_range(start, end, insert);
    }

    /// Replace the whole document and collapse the caret to the end.
    pub fn set_text(&mut self, text: String) {
        self.caret = text.len();
        self.text = text;
        self.anchor = None;
    }

    // ── Caret movement helpers ────────────────────────────────────────────────

    pub fn prev_offset(&self) -> usize {
        prev_char_boundary(&self.text, self.caret)
    }

    pub fn next_offset(&self) -> usize {
        next_char_boundary(&self.text, self.caret)
    }

    /// Offset one line up, keeping the char column where possible.
    pub fn offset_up(&self) -> usize {
        let (line, col) = self.line_col(self.caret);
        if line == 0 {
            return 0;
        }
        self.offset_at(line - 1, col)
    }

    /// Offset one line down, keeping the char column where possible.
    pub fn offset_down(&self) -> usize {
        let (line, col) = self.line_col(self.caret);
        self.offset_at(line + 1, col)
    }

    pub fn line_start(&self) -> usize {
        self.text[..self.caret].rfind('\n').map(|i| i + 1).unwrap_or(0)
    }

    pub fn line_end(&self) -> usize {
        self.text[self.caret..]
            .find('\n')
            .map(|i| self.caret + i)
            .unwrap_or(self.text.len())
    }

    /// (line, char column) of a byte offset.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let offset = clamp_boundary(&self.text, offset.min(self.text.len()));
        let before = &self.text[..offset];
        let line = before.matches('\n').count();
        let col = before
            .rfind('\n')
            .map(|i| before[i + 1..].chars().count())
            .unwrap_or_else(|| before.chars().count());
        (line, col)
    }

    /// Byte offset of (line, char column), clamped to the line's end.
    /// Lines past the last clamp to the end of the document.
    fn offset_at(&self, line: usize, col: usize) -> usize {
        let mut start = 0usize;
        for _ in 0..line {
            match self.text[start..].find('\n') {
                Some(i) => start += i + 1,
                None => return self.text.len(),
            }
        }
        let line_end = self.text[start..]
            .find('\n')
            .map(|i| start + i)
            .unwrap_or(self.text.len());
        let mut offset = start;
        for _ in 0..col {
            if offset >= line_end {
                break;
            }
            offset = next_char_boundary(&self.text, offset);
        }
        offset
    }
}

// ── Char-boundary helpers ─────────────────────────────────────────────────────

/// Largest char boundary <= `i`.
pub fn clamp_boundary(s: &str, i: usize) -> usize {
    let mut i = i.min(s.len());
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn prev_char_boundary(s: &str, i: usize) -> usize {
    if i == 0 {
        return 0;
    }
    let mut i = i - 1;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn next_char_boundary(s: &str, i: usize) -> usize {
    if i >= s.len() {
        return s.len();
    }
    let mut i = i + 1;
    while i < s.len() && !s.is_char_boundary(i) {
        i += 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_range_repositions_caret() {
        let mut ed = Editor::from_text("hello world".to_string());
        ed.replace_range(6, 11, "there");
        assert_eq!(ed.text(), "hello there");
        assert_eq!(ed.caret(), 11);
    }

    #[test]
    fn replace_range_clamps_malformed_bounds() {
        let mut ed = Editor::from_text("abc".to_string());
        ed.replace_range(99, 2, "X");
        // start > end swaps; 99 clamps to len
        assert_eq!(ed.text(), "abX");
        assert_eq!(ed.caret(), 3);
    }

    #[test]
    fn closing_tag_parks_caret_before_marker() {
        let mut ed = Editor::new();
        ed.replace_range(0, 0, "<header></header>");
        assert_eq!(ed.text(), "<header></header>");
        assert_eq!(ed.caret(), 8);
    }

    #[test]
    fn insert_at_caret_replaces_selection() {
        let mut ed = Editor::from_text("one two three".to_string());
        ed.move_caret(4, false);
        ed.move_caret(7, true);
        assert_eq!(ed.selected_text(), "two");
        ed.insert_at_caret("2");
        assert_eq!(ed.text(), "one 2 three");
        assert_eq!(ed.caret(), 5);
        assert!(!ed.has_selection());
    }

    #[test]
    fn selection_is_direction_agnostic() {
        let mut ed = Editor::from_text("abcdef".to_string());
        ed.move_caret(4, false);
        ed.move_caret(1, true);
        assert_eq!(ed.selection(), (1, 4));
        assert_eq!(ed.selected_text(), "bcd");
    }

    #[test]
    fn clamp_lands_on_char_boundary() {
        let mut ed = Editor::from_text("a√b".to_string()); // √ is 3 bytes
        ed.replace_range(2, 2, "!"); // inside √ — clamps down to 1
        assert_eq!(ed.text(), "a!√b");
    }

    #[test]
    fn vertical_movement_keeps_column() {
        let mut e = Editor::from_text("alpha\nbet\ngamma".to_string());
        e.move_caret(4, false); // "alph|a"
        assert_eq!(e.offset_up(), 0); // line 0 already — clamps to start
        e.move_caret(e.offset_down(), false); // "bet" is short — clamp to line end
        assert_eq!(e.caret(), 9);
        e.move_caret(e.offset_down(), false);
        assert_eq!(e.line_col(e.caret()), (2, 3));
    }
}
