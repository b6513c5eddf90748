/// Frame layout, editor pane and status bar drawing.
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use super::{AppState, Overlay};
use crate::caret;

pub fn draw(f: &mut Frame, state: &AppState) {
    let area = f.area();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    let (editor_area, chat_area) = split_main(rows[0], state.chat_open);
    draw_editor(f, state, editor_area);
    if let Some(chat_area) = chat_area {
        super::chat::draw_chat(f, state, chat_area);
    }
    draw_status(f, state, rows[1]);

    // Overlays float over the editor pane, drawn last
    super::overlays::draw(f, state, editor_area);
}

/// Editor takes the full width unless the chat panel is open and fits.
fn split_main(area: Rect, chat_open: bool) -> (Rect, Option<Rect>) {
    if chat_open && area.width >= 72 {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(44)])
            .split(area);
        (cols[0], Some(cols[1]))
    } else {
        (area, None)
    }
}

/// First visible document row, chosen so the caret always stays on screen.
pub fn editor_scroll(state: &AppState, area: Rect) -> usize {
    let height = area.height as usize;
    if height == 0 {
        return 0;
    }
    let caret = caret::point_at(state.editor.text(), state.editor.caret());
    caret.row.saturating_sub(height - 1)
}

fn draw_editor(f: &mut Frame, state: &AppState, area: Rect) {
    let inner = Rect {
        x: area.x + 1,
        width: area.width.saturating_sub(2),
        ..area
    };
    let text = state.editor.text();
    let skip = editor_scroll(state, area);
    let (sel_start, sel_end) = state.editor.selection();
    let selecting = sel_start != sel_end;

    let body = Style::default().fg(Color::Rgb(225, 225, 235));
    let selected = Style::default().fg(Color::Black).bg(Color::Cyan);

    let mut lines: Vec<Line> = Vec::new();
    if text.is_empty() {
        lines.push(Line::from(Span::styled(
            "Start writing…  ( /  for commands )",
            Style::default().fg(Color::DarkGray),
        )));
    } else {
        let mut offset = 0usize;
        for (row, raw) in text.split('\n').enumerate() {
            let line_start = offset;
            let line_end = offset + raw.len();
            offset = line_end + 1;
            if row < skip {
                continue;
            }
            if lines.len() >= inner.height as usize {
                break;
            }

            if selecting && sel_start < line_end && sel_end > line_start {
                let from = sel_start.max(line_start) - line_start;
                let to = sel_end.min(line_end) - line_start;
                let (head, rest) = raw.split_at(from);
                let (mid, tail) = rest.split_at(to - from);
                lines.push(Line::from(vec![
                    Span::styled(head.to_string(), body),
                    Span::styled(mid.to_string(), selected),
                    Span::styled(tail.to_string(), body),
                ]));
            } else {
                lines.push(Line::from(Span::styled(raw.to_string(), body)));
            }
        }
    }
    f.render_widget(Paragraph::new(lines), inner);

    // Hardware cursor at the caret while the editor owns input
    let editor_focused = !state.chat_open
        && matches!(
            state.overlay,
            Overlay::None | Overlay::Menu(_) | Overlay::SelectionBar { .. }
        );
    if editor_focused {
        let pt = caret::point_at(text, state.editor.caret());
        if pt.row >= skip {
            let x = inner.x + pt.col as u16;
            let y = inner.y + (pt.row - skip) as u16;
            if x < inner.x + inner.width && y < inner.y + inner.height {
                f.set_cursor_position((x, y));
            }
        }
    }
}

fn draw_status(f: &mut Frame, state: &AppState, area: Rect) {
    let file = state
        .file_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "scratch".to_string());
    let dirty = if state.dirty { " +" } else { "" };

    let mut spans = vec![
        Span::styled(
            " marky ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("{file}{dirty}"), Style::default().fg(Color::White)),
        Span::styled("  ·  ", Style::default().fg(Color::Rgb(60, 60, 80))),
    ];

    if let Some(status) = &state.status {
        spans.push(Span::styled(
            status.clone(),
            Style::default().fg(Color::Yellow),
        ));
    } else {
        spans.push(Span::styled(
            "/ commands   Ctrl+A assistant   Ctrl+S save   Ctrl+Z undo   Ctrl+Q quit",
            Style::default().fg(Color::DarkGray),
        ));
    }

    spans.push(Span::styled(
        format!("   {} · {}", state.profile, state.client.model),
        Style::default().fg(Color::Rgb(90, 90, 110)),
    ));
    if state.editor.has_selection() {
        spans.push(Span::styled(
            format!("  ⌶ {}", state.editor.selected_text().chars().count()),
            Style::default().fg(Color::Rgb(90, 90, 110)),
        ));
    }
    if state.history.can_undo() {
        spans.push(Span::styled(
            format!("  ⎌ {}", state.history.undo_depth()),
            Style::default().fg(Color::Rgb(90, 90, 110)),
        ));
    }
    if state.history.can_redo() {
        spans.push(Span::styled("  ↻", Style::default().fg(Color::Rgb(90, 90, 110))));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
