/// Caret geometry: map a byte offset to a display row/column.
///
/// The terminal analog of measuring a caret rectangle in a textarea — the
/// shell uses it only to anchor floating popups next to the trigger point.
use unicode_width::UnicodeWidthChar;

use crate::editor::clamp_boundary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaretPoint {
    /// Zero-based line index
    pub row: usize,
    /// Display column (wide glyphs count double)
    pub col: usize,
}

pub fn point_at(text: &str, offset: usize) -> CaretPoint {
    let offset = clamp_boundary(text, offset.min(text.len()));
    let before = &text[..offset];
    let row = before.matches('\n').count();
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let col = before[line_start..]
        .chars()
        .map(|c| c.width().unwrap_or(0))
        .sum();
    CaretPoint { row, col }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_of_document() {
        assert_eq!(point_at("abc", 0), CaretPoint { row: 0, col: 0 });
    }

    #[test]
    fn mid_line_and_after_newlines() {
        assert_eq!(point_at("abc\ndef", 2), CaretPoint { row: 0, col: 2 });
        assert_eq!(point_at("abc\ndef", 4), CaretPoint { row: 1, col: 0 });
        assert_eq!(point_at("abc\ndef", 7), CaretPoint { row: 1, col: 3 });
    }

    #[test]
    fn wide_glyphs_count_double() {
        // "日" is two columns wide
        let text = "日x";
        assert_eq!(point_at(text, 3), CaretPoint { row: 0, col: 2 });
        assert_eq!(point_at(text, 4), CaretPoint { row: 0, col: 3 });
    }

    #[test]
    fn offset_past_end_clamps() {
        assert_eq!(point_at("ab", 99), CaretPoint { row: 0, col: 2 });
    }
}
