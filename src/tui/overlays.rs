/// Overlay/popup draw functions — command menu, table picker, tree and
/// config builders, selection toolbar. One of these at most is on screen.
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
};

use super::{AppState, Overlay, render};
use crate::builder::{ConfigBuilderState, ConfigField, MAX_TABLE_SIZE, TablePickerState, TreeBuilderState};
use crate::caret;
use crate::command::{self, CommandEntry, MenuState};

pub fn draw(f: &mut Frame, state: &AppState, editor_area: Rect) {
    match &state.overlay {
        Overlay::None => {}
        Overlay::Menu(menu) => draw_menu(f, state, editor_area, menu),
        Overlay::TablePicker(picker) => draw_table_picker(f, state, editor_area, picker),
        Overlay::TreeBuilder(tree) => draw_tree_builder(f, state, editor_area, tree),
        Overlay::ConfigBuilder(cfg) => draw_config_builder(f, state, editor_area, cfg),
        Overlay::SelectionBar { start, .. } => draw_selection_bar(f, state, editor_area, *start),
    }
}

/// Popup rect one row below the given document offset, clamped to the
/// editor area (flips/slides rather than clipping).
fn anchor_below(state: &AppState, area: Rect, offset: usize, width: u16, height: u16) -> Rect {
    let pt = caret::point_at(state.editor.text(), offset);
    let skip = render::editor_scroll(state, area);
    let row = pt.row.saturating_sub(skip) as u16;

    let width = width.min(area.width);
    let height = height.min(area.height);
    let mut x = area.x + 1 + pt.col.min(u16::MAX as usize - 1) as u16;
    let mut y = area.y + row + 1;
    if x + width > area.x + area.width {
        x = (area.x + area.width).saturating_sub(width);
    }
    if y + height > area.y + area.height {
        y = (area.y + area.height).saturating_sub(height);
    }
    Rect { x, y, width, height }
}

fn popup_block(title: &str) -> Block<'_> {
    Block::default()
        .title(Span::styled(
            title.to_string(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
}

fn hint_style() -> Style {
    Style::default().fg(Color::DarkGray)
}

// ── Command menu ──────────────────────────────────────────────────────────────

fn draw_menu(f: &mut Frame, state: &AppState, area: Rect, menu: &MenuState) {
    let items = command::filter(command::catalog(), &menu.active.typed);
    if items.is_empty() {
        return;
    }

    let height = (items.len() as u16 + 2).min(12);
    let rect = anchor_below(state, area, menu.active.trigger_offset, 28, height);
    f.render_widget(Clear, rect);

    let visible = rect.height.saturating_sub(2) as usize;
    // Keep the selected row in view
    let skip = menu.selected.saturating_sub(visible.saturating_sub(1));
    let rows: Vec<ListItem<'static>> = items
        .iter()
        .enumerate()
        .skip(skip)
        .take(visible)
        .map(|(i, entry)| menu_row(entry, i == menu.selected))
        .collect();

    let block = popup_block(" Commands ");
    let inner = block.inner(rect);
    f.render_widget(block, rect);
    f.render_widget(List::new(rows), inner);
}

fn menu_row(entry: &CommandEntry, selected: bool) -> ListItem<'static> {
    let (glyph_style, label_style) = if selected {
        (
            Style::default().fg(Color::Black).bg(Color::Cyan),
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        (
            Style::default().fg(Color::Rgb(140, 140, 160)),
            Style::default().fg(Color::White),
        )
    };
    ListItem::new(Line::from(vec![
        Span::styled(format!(" {} ", entry.glyph), glyph_style),
        Span::styled(format!(" {:<18}", entry.label), label_style),
    ]))
}

// ── Table picker ──────────────────────────────────────────────────────────────

fn draw_table_picker(f: &mut Frame, state: &AppState, area: Rect, picker: &TablePickerState) {
    let width = (MAX_TABLE_SIZE as u16) * 2 + 4;
    let height = MAX_TABLE_SIZE as u16 + 4;
    let rect = anchor_below(state, area, state.editor.caret(), width, height);
    f.render_widget(Clear, rect);

    let block = popup_block(" Table ");
    let inner = block.inner(rect);
    f.render_widget(block, rect);

    let mut lines: Vec<Line> = Vec::new();
    lines.push(Line::from(Span::styled(
        format!(" {} rows × {} cols", picker.rows, picker.cols),
        Style::default().fg(Color::White),
    )));
    for r in 1..=MAX_TABLE_SIZE {
        let mut spans = vec![Span::raw(" ")];
        for c in 1..=MAX_TABLE_SIZE {
            let in_range = r <= picker.rows && c <= picker.cols;
            spans.push(Span::styled(
                if in_range { "■ " } else { "· " },
                if in_range {
                    Style::default().fg(Color::Cyan)
                } else {
                    Style::default().fg(Color::Rgb(70, 70, 90))
                },
            ));
        }
        lines.push(Line::from(spans));
    }
    lines.push(Line::from(Span::styled(" ↑↓←→ size · Enter insert", hint_style())));
    f.render_widget(Paragraph::new(lines), inner);
}

// ── Tree builder ──────────────────────────────────────────────────────────────

fn draw_tree_builder(f: &mut Frame, state: &AppState, area: Rect, tree: &TreeBuilderState) {
    let height = (tree.nodes.len() as u16 + 4).min(area.height);
    let rect = anchor_below(state, area, state.editor.caret(), 42, height);
    f.render_widget(Clear, rect);

    let block = popup_block(" TREE BUILDER ");
    let inner = block.inner(rect);
    f.render_widget(block, rect);

    let mut lines: Vec<Line> = Vec::new();
    let visible = inner.height.saturating_sub(2) as usize;
    let skip = tree.selected.saturating_sub(visible.saturating_sub(1));
    for (i, node) in tree.nodes.iter().enumerate().skip(skip).take(visible) {
        let indent = "  ".repeat(node.depth);
        let style = if i == tree.selected {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default().fg(Color::White)
        };
        let cursor = if i == tree.selected { "▏" } else { "" };
        lines.push(Line::from(vec![
            Span::raw(" "),
            Span::styled(format!("{indent}{}{cursor}", node.label), style),
        ]));
    }
    lines.push(Line::from(Span::styled(
        " ^N add  ^D del  ^←→ indent  Enter insert",
        hint_style(),
    )));
    f.render_widget(Paragraph::new(lines), inner);
}

// ── Config builder ────────────────────────────────────────────────────────────

fn draw_config_builder(f: &mut Frame, state: &AppState, area: Rect, cfg: &ConfigBuilderState) {
    let body_rows = cfg.entries.len().max(1) as u16;
    let height = (body_rows + 4).min(area.height);
    let rect = anchor_below(state, area, state.editor.caret(), 46, height);
    f.render_widget(Clear, rect);

    let block = popup_block(" CONFIG BUILDER ");
    let inner = block.inner(rect);
    f.render_widget(block, rect);

    let mut lines: Vec<Line> = Vec::new();
    if cfg.entries.is_empty() {
        lines.push(Line::from(Span::styled(
            " No properties defined — ^N to add",
            hint_style(),
        )));
    } else {
        let visible = inner.height.saturating_sub(2) as usize;
        let skip = cfg.selected.saturating_sub(visible.saturating_sub(1));
        for (i, entry) in cfg.entries.iter().enumerate().skip(skip).take(visible) {
            let indent = "  ".repeat(entry.depth);
            let row_selected = i == cfg.selected;
            let field_style = |field: ConfigField| {
                if row_selected && cfg.field == field {
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD)
                } else if row_selected {
                    Style::default().fg(Color::White)
                } else {
                    Style::default().fg(Color::Rgb(180, 180, 200))
                }
            };
            lines.push(Line::from(vec![
                Span::raw(format!(" {indent}")),
                Span::styled(entry.key.clone(), field_style(ConfigField::Key)),
                Span::styled(": ", hint_style()),
                Span::styled(entry.value.clone(), field_style(ConfigField::Value)),
            ]));
        }
    }
    lines.push(Line::from(Span::styled(
        " / browse keys+values  ^N add  ^D del  ^←→ indent",
        hint_style(),
    )));
    f.render_widget(Paragraph::new(lines), inner);

    // Field slash-menu floats under the builder
    if let Some(menu) = &cfg.menu {
        let candidates = cfg.menu_candidates();
        if candidates.is_empty() {
            return;
        }
        let height = (candidates.len() as u16 + 2).min(10);
        let mut menu_rect = Rect {
            x: rect.x + 2,
            y: rect.y + rect.height,
            width: 28.min(area.width),
            height,
        };
        if menu_rect.y + menu_rect.height > area.y + area.height {
            menu_rect.y = rect.y.saturating_sub(menu_rect.height);
        }
        f.render_widget(Clear, menu_rect);
        let rows: Vec<ListItem<'static>> = candidates
            .iter()
            .enumerate()
            .take(menu_rect.height.saturating_sub(2) as usize)
            .map(|(i, entry)| menu_row(entry, i == menu.selected))
            .collect();
        let block = popup_block(" Suggestions ");
        let inner = block.inner(menu_rect);
        f.render_widget(block, menu_rect);
        f.render_widget(List::new(rows), inner);
    }
}

// ── Selection toolbar ─────────────────────────────────────────────────────────

fn draw_selection_bar(f: &mut Frame, state: &AppState, area: Rect, start: usize) {
    let rect = anchor_below(state, area, start, 36, 3);
    f.render_widget(Clear, rect);

    let block = popup_block(" Format ");
    let inner = block.inner(rect);
    f.render_widget(block, rect);

    let key = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(" ^B", key),
            Span::styled(" bold  ", hint_style()),
            Span::styled("^I", key),
            Span::styled(" italic  ", hint_style()),
            Span::styled("^U", key),
            Span::styled(" underline", hint_style()),
        ])),
        inner,
    );
}
