/// Chat panel rendering — message list, pending spinner, API key and
/// message input fields.
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use unicode_width::UnicodeWidthStr;

use super::{AppState, ChatFocus, ChatRole};

// ── Spinner ───────────────────────────────────────────────────────────────────

pub const SPINNER_GLYPHS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub fn draw_chat(f: &mut Frame, state: &AppState, area: Rect) {
    let block = Block::default()
        .title(Span::styled(
            " AI ASSISTANT ",
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ))
        .title_bottom(Span::styled(" Tab key field · Esc close ", Style::default().fg(Color::DarkGray)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Rgb(110, 90, 200)));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // messages
            Constraint::Length(1), // api key field
            Constraint::Length(1), // message input
        ])
        .split(inner);

    draw_messages(f, state, rows[0]);
    draw_key_field(f, state, rows[1]);
    draw_input_field(f, state, rows[2]);
}

fn draw_messages(f: &mut Frame, state: &AppState, area: Rect) {
    let wrap_width = (area.width as usize).saturating_sub(7).max(16);
    let mut lines: Vec<Line> = Vec::new();

    for entry in &state.chat_entries {
        let stamp = if state.show_timestamps {
            format!("{} ", entry.time.format("%H:%M"))
        } else {
            String::new()
        };
        let (label, label_style, text_style) = match entry.role {
            ChatRole::User => (
                "you ",
                Style::default()
                    .fg(Color::Rgb(160, 140, 255))
                    .add_modifier(Modifier::BOLD),
                Style::default().fg(Color::Rgb(235, 232, 255)),
            ),
            ChatRole::Model => (
                "ai  ",
                Style::default()
                    .fg(Color::Rgb(0, 210, 210))
                    .add_modifier(Modifier::BOLD),
                Style::default().fg(Color::Rgb(210, 230, 255)),
            ),
            ChatRole::System => (
                "    ",
                Style::default().fg(Color::Rgb(110, 110, 130)),
                Style::default()
                    .fg(Color::Rgb(110, 110, 130))
                    .add_modifier(Modifier::ITALIC),
            ),
        };

        let mut first = true;
        for src_line in entry.text.lines() {
            for wrapped in wrap_text(src_line, wrap_width) {
                if first {
                    first = false;
                    lines.push(Line::from(vec![
                        Span::styled(stamp.clone(), Style::default().fg(Color::Rgb(70, 70, 90))),
                        Span::styled(label.to_string(), label_style),
                        Span::styled(wrapped, text_style),
                    ]));
                } else {
                    lines.push(Line::from(vec![
                        Span::raw(" ".repeat(stamp.width() + 4)),
                        Span::styled(wrapped, text_style),
                    ]));
                }
            }
        }
        lines.push(Line::raw(""));
    }

    if state.chat_waiting {
        let glyph = SPINNER_GLYPHS[(state.spinner_tick as usize) % SPINNER_GLYPHS.len()];
        lines.push(Line::from(vec![
            Span::styled(
                format!("{glyph} "),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::styled("thinking…", Style::default().fg(Color::Cyan)),
        ]));
    }

    // Pin to the bottom
    let visible = area.height as usize;
    let skip = lines.len().saturating_sub(visible);
    let shown: Vec<Line> = lines.into_iter().skip(skip).collect();
    f.render_widget(Paragraph::new(shown), area);
}

fn draw_key_field(f: &mut Frame, state: &AppState, area: Rect) {
    let focused = state.chat_focus == ChatFocus::ApiKey;
    let masked = if state.api_key_input.is_empty() {
        "(no API key)".to_string()
    } else {
        "●".repeat(state.api_key_input.chars().count().min(24))
    };
    let cursor = if focused { "█" } else { "" };
    let style = if focused {
        Style::default().fg(Color::White)
    } else {
        Style::default().fg(Color::Rgb(110, 110, 130))
    };
    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("key ", Style::default().fg(Color::DarkGray)),
            Span::styled(format!("{masked}{cursor}"), style),
        ])),
        area,
    );
}

fn draw_input_field(f: &mut Frame, state: &AppState, area: Rect) {
    let focused = state.chat_focus == ChatFocus::Message;
    let cursor = if focused && !state.chat_waiting { "█" } else { "" };
    let prompt_style = if state.chat_waiting {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    };

    // Show the tail when the input outgrows the field
    let budget = (area.width as usize).saturating_sub(4);
    let input: String = tail_chars(&state.chat_input, budget);

    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("❯ ", prompt_style),
            Span::styled(input, Style::default().fg(Color::White)),
            Span::styled(cursor.to_string(), Style::default().fg(Color::Cyan)),
        ])),
        area,
    );
}

// ── Utilities ─────────────────────────────────────────────────────────────────

/// Word-wrap a single line to `max_width` display columns. Splits on
/// whitespace; a word longer than the budget gets its own line unclipped.
pub fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    if text.is_empty() {
        return vec![String::new()];
    }
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0usize;

    for word in text.split_whitespace() {
        let word_width = word.width();
        if current_width == 0 {
            current.push_str(word);
            current_width = word_width;
        } else if current_width + 1 + word_width <= max_width {
            current.push(' ');
            current.push_str(word);
            current_width += 1 + word_width;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_width = word_width;
        }
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

fn tail_chars(s: &str, budget: usize) -> String {
    let count = s.chars().count();
    if count <= budget {
        s.to_string()
    } else {
        s.chars().skip(count - budget).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_respects_width() {
        let lines = wrap_text("one two three four five", 9);
        assert_eq!(lines, vec!["one two", "three", "four five"]);
    }

    #[test]
    fn wrap_empty_line_survives() {
        assert_eq!(wrap_text("", 10), vec![""]);
    }

    #[test]
    fn tail_keeps_last_chars() {
        assert_eq!(tail_chars("abcdef", 3), "def");
        assert_eq!(tail_chars("ab", 3), "ab");
    }
}
