/// Inline formatting for a selected range: wrap it in a marker pair and
/// collapse the caret after the closing marker.
use crate::editor::{Editor, clamp_boundary};
use crate::history::History;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Bold,
    Italic,
    Underline,
}

impl Format {
    pub fn marker(self) -> &'static str {
        match self {
            Format::Bold => "**",
            Format::Italic => "*",
            Format::Underline => "__",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Format::Bold => "bold",
            Format::Italic => "italic",
            Format::Underline => "underline",
        }
    }
}

/// Wrap `range` with the marker pair, recording history first. An empty
/// range is a no-op — nothing mutates, nothing is recorded. Returns whether
/// the format was applied.
pub fn apply(format: Format, range: (usize, usize), editor: &mut Editor, history: &mut History) -> bool {
    let text = editor.text();
    let mut start = clamp_boundary(text, range.0.min(text.len()));
    let mut end = clamp_boundary(text, range.1.min(text.len()));
    if start > end {
        std::mem::swap(&mut start, &mut end);
    }
    if start == end {
        return false;
    }

    let marker = format.marker();
    let wrapped = format!("{marker}{}{marker}", &text[start..end]);
    history.record(text);
    editor.replace_range(start, end, &wrapped);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_selection_and_collapses_caret() {
        let mut ed = Editor::from_text("make this bold now".to_string());
        let mut h = History::default();
        assert!(apply(Format::Bold, (5, 14), &mut ed, &mut h));
        assert_eq!(ed.text(), "make **this bold** now");
        // caret sits just after the closing marker
        assert_eq!(ed.caret(), 18);
        assert!(!ed.has_selection());
        assert!(h.can_undo());
    }

    #[test]
    fn italic_and_underline_markers() {
        let mut ed = Editor::from_text("ab".to_string());
        let mut h = History::default();
        apply(Format::Italic, (0, 2), &mut ed, &mut h);
        assert_eq!(ed.text(), "*ab*");

        let mut ed = Editor::from_text("ab".to_string());
        apply(Format::Underline, (0, 2), &mut ed, &mut h);
        assert_eq!(ed.text(), "__ab__");
    }

    #[test]
    fn empty_selection_is_a_noop() {
        let mut ed = Editor::from_text("hello".to_string());
        let mut h = History::default();
        assert!(!apply(Format::Bold, (3, 3), &mut ed, &mut h));
        assert_eq!(ed.text(), "hello");
        assert!(!h.can_undo());
    }

    #[test]
    fn format_then_undo_restores_original() {
        let mut ed = Editor::from_text("plain".to_string());
        let mut h = History::default();
        apply(Format::Underline, (0, 5), &mut ed, &mut h);
        let restored = h.undo(ed.text()).unwrap();
        assert_eq!(restored, "plain");
    }
}
