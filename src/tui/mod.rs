/// Ratatui-based TUI for marky.
///
/// Architecture:
///   main thread:  event loop — crossterm keyboard events + mpsc UiEvent drain
///   chat task:    tokio::spawn — streams the model and sends UiEvents back
///
/// Layout:
///   ┌───────────────────────────────┬──────────────────┐
///   │  editor pane                  │  chat panel      │
///   │  (overlays float on top)      │  (when open)     │
///   ├───────────────────────────────┴──────────────────┤
///   │  status bar (1 line)                             │
///   └──────────────────────────────────────────────────┘
pub mod chat;
pub mod overlays;
pub mod render;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures_util::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::assistant;
use crate::builder::{ConfigBuilderState, ConfigField, TablePickerState, TreeBuilderState};
use crate::client::Client;
use crate::command::{self, CommandAction, MenuState};
use crate::config::{self, ResolvedConfig};
use crate::editor::Editor;
use crate::format::{self, Format};
use crate::generate;
use crate::history::History;
use crate::tools;

// ── UiEvent — typed events from chat task → TUI ───────────────────────────────

pub enum UiEvent {
    /// A streamed text chunk from the model
    ChatChunk(String),
    /// The chat task wants a tool executed against the live document;
    /// the result string travels back through `reply`
    ToolRequest {
        name: String,
        args: Value,
        reply: oneshot::Sender<String>,
    },
    /// The chat turn finished cleanly
    ChatDone,
    /// The chat turn failed (network/auth) — one system message, input kept
    ChatError(String),
}

// ── Chat entries ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Model,
    System,
}

#[derive(Debug, Clone)]
pub struct ChatEntry {
    pub role: ChatRole,
    pub text: String,
    pub time: chrono::DateTime<chrono::Local>,
}

/// Which chat panel field has the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatFocus {
    Message,
    ApiKey,
}

// ── Overlay — the single active surface over the editor ───────────────────────

/// At most one of these is ever on screen; opening any surface closes the
/// previous one by construction.
pub enum Overlay {
    None,
    /// Slash-command menu under the trigger
    Menu(MenuState),
    /// Table size picker grid
    TablePicker(TablePickerState),
    /// Tree diagram builder
    TreeBuilder(TreeBuilderState),
    /// Config block builder
    ConfigBuilder(ConfigBuilderState),
    /// Inline formatting toolbar over the stored selection
    SelectionBar { start: usize, end: usize },
}

// ── AppState ──────────────────────────────────────────────────────────────────

pub struct AppState {
    pub editor: Editor,
    pub history: History,
    pub overlay: Overlay,

    // Chat panel
    pub chat_open: bool,
    pub chat_focus: ChatFocus,
    pub chat_entries: Vec<ChatEntry>,
    pub chat_input: String,
    pub api_key_input: String,
    pub chat_waiting: bool,
    /// Last sent message, restored into the input on failure so the user
    /// can retry without retyping
    pending_retry: Option<String>,
    /// True while streamed chunks should append to the last model entry
    chat_stream_open: bool,

    pub client: Client,
    pub profile: String,
    pub show_timestamps: bool,

    pub file_path: Option<PathBuf>,
    pub dirty: bool,
    /// Transient status-bar message, replaced by the next one
    pub status: Option<String>,
    /// Incremented every 120ms while a chat call is pending
    pub spinner_tick: u32,
    quit_armed: bool,
    should_quit: bool,
}

impl AppState {
    pub fn new(
        resolved: &ResolvedConfig,
        initial: String,
        file_path: Option<PathBuf>,
        show_timestamps: bool,
    ) -> Self {
        let mut client = Client::new(resolved.endpoint.clone(), resolved.model.clone());
        if let Some(key) = &resolved.api_key {
            client.set_api_key(key.clone());
        }
        let greeting = if client.has_api_key() {
            "I am your writing assistant. How can I help you today?"
        } else {
            "I am your writing assistant. Add an API key below if your endpoint needs one."
        };
        Self {
            editor: Editor::from_text(initial),
            history: History::default(),
            overlay: Overlay::None,
            chat_open: false,
            chat_focus: ChatFocus::Message,
            chat_entries: vec![ChatEntry {
                role: ChatRole::System,
                text: greeting.to_string(),
                time: chrono::Local::now(),
            }],
            chat_input: String::new(),
            api_key_input: resolved.api_key.clone().unwrap_or_default(),
            chat_waiting: false,
            pending_retry: None,
            chat_stream_open: false,
            client,
            profile: resolved.profile_name.clone(),
            show_timestamps,
            file_path,
            dirty: false,
            status: None,
            spinner_tick: 0,
            quit_armed: false,
            should_quit: false,
        }
    }

    fn push_chat(&mut self, role: ChatRole, text: String) {
        self.chat_entries.push(ChatEntry {
            role,
            text,
            time: chrono::Local::now(),
        });
    }

    /// Append a streamed chunk to the open model entry, or start a new one.
    fn append_model_chunk(&mut self, chunk: &str) {
        if self.chat_stream_open {
            if let Some(entry) = self.chat_entries.last_mut() {
                if entry.role == ChatRole::Model {
                    entry.text.push_str(chunk);
                    return;
                }
            }
        }
        self.push_chat(ChatRole::Model, chunk.to_string());
        self.chat_stream_open = true;
    }

    // ── Event application ─────────────────────────────────────────────────────

    pub fn apply_event(&mut self, ev: UiEvent) {
        match ev {
            UiEvent::ChatChunk(c) => {
                self.append_model_chunk(&c);
            }
            UiEvent::ToolRequest { name, args, reply } => {
                self.push_chat(
                    ChatRole::System,
                    format!("⚒ {name} {}", format_args_summary(&args)),
                );
                let before_len = self.editor.text().len();
                let before_caret = self.editor.caret();
                let result = tools::dispatch(&name, &args, &mut self.editor, &mut self.history)
                    .unwrap_or_else(|e| format!("[Tool error: {e}]"));
                if self.editor.text().len() != before_len || self.editor.caret() != before_caret {
                    self.dirty = true;
                }
                self.push_chat(
                    ChatRole::System,
                    format!("→ {}", result.lines().next().unwrap_or(&result)),
                );
                self.chat_stream_open = false;
                let _ = reply.send(result);
            }
            UiEvent::ChatDone => {
                self.chat_waiting = false;
                self.chat_stream_open = false;
                self.pending_retry = None;
            }
            UiEvent::ChatError(e) => {
                self.chat_waiting = false;
                self.chat_stream_open = false;
                self.push_chat(
                    ChatRole::System,
                    "Sorry, I encountered an error. Please check your connection or API key."
                        .to_string(),
                );
                self.status = Some(format!("✗ {e}"));
                // Put the failed message back so a retry is one Enter away
                if let Some(prev) = self.pending_retry.take() {
                    if self.chat_input.is_empty() {
                        self.chat_input = prev;
                    }
                }
            }
        }
    }

    // ── Surface refresh (runs after every edit or caret move) ─────────────────

    /// Re-evaluate which surface should be up: an active selection wins,
    /// then a live `/` trigger, otherwise nothing.
    fn refresh_surfaces(&mut self) {
        if self.editor.has_selection() {
            let (start, end) = self.editor.selection();
            self.overlay = Overlay::SelectionBar { start, end };
            return;
        }
        match command::detect_trigger(self.editor.text(), self.editor.caret()) {
            Some(active) => match &mut self.overlay {
                Overlay::Menu(menu) => menu.retrigger(active),
                _ => self.overlay = Overlay::Menu(MenuState::new(active)),
            },
            None => {
                if matches!(self.overlay, Overlay::Menu(_) | Overlay::SelectionBar { .. }) {
                    self.overlay = Overlay::None;
                }
            }
        }
    }

    // ── Editor mutations ──────────────────────────────────────────────────────

    fn type_str(&mut self, s: &str) {
        self.history.record(self.editor.text());
        self.editor.insert_at_caret(s);
        self.dirty = true;
        self.refresh_surfaces();
    }

    fn backspace(&mut self) {
        if self.editor.has_selection() {
            self.history.record(self.editor.text());
            self.editor.insert_at_caret("");
        } else {
            let prev = self.editor.prev_offset();
            let caret = self.editor.caret();
            if prev == caret {
                return;
            }
            self.history.record(self.editor.text());
            self.editor.replace_range(prev, caret, "");
        }
        self.dirty = true;
        self.refresh_surfaces();
    }

    fn delete_forward(&mut self) {
        if self.editor.has_selection() {
            self.history.record(self.editor.text());
            self.editor.insert_at_caret("");
        } else {
            let next = self.editor.next_offset();
            let caret = self.editor.caret();
            if next == caret {
                return;
            }
            self.history.record(self.editor.text());
            self.editor.replace_range(caret, next, "");
        }
        self.dirty = true;
        self.refresh_surfaces();
    }

    fn move_to(&mut self, to: usize, extend: bool) {
        self.editor.move_caret(to, extend);
        self.refresh_surfaces();
    }

    fn undo(&mut self) {
        if let Some(prev) = self.history.undo(self.editor.text()) {
            self.editor.set_text(prev);
            self.dirty = true;
            self.refresh_surfaces();
        }
    }

    fn redo(&mut self) {
        if let Some(next) = self.history.redo(self.editor.text()) {
            self.editor.set_text(next);
            self.dirty = true;
            self.refresh_surfaces();
        }
    }

    fn save(&mut self) {
        let Some(path) = &self.file_path else {
            self.status = Some("no file attached — start as `marky <file>` to save".to_string());
            return;
        };
        match std::fs::write(path, self.editor.text()) {
            Ok(()) => {
                self.dirty = false;
                self.status = Some(format!("✓ saved {}", path.display()));
            }
            Err(e) => {
                self.status = Some(format!("✗ save failed: {e}"));
            }
        }
    }

    // ── Command commit ────────────────────────────────────────────────────────

    /// Commit the highlighted catalog entry: literal values replace the
    /// `/token` run; builder entries consume the run and open their surface.
    fn commit_menu_entry(&mut self) {
        let (typed, selected, start) = match &self.overlay {
            Overlay::Menu(menu) => (
                menu.active.typed.clone(),
                menu.selected,
                menu.active.trigger_offset,
            ),
            _ => return,
        };
        let filtered = command::filter(command::catalog(), &typed);
        let Some(entry) = filtered.get(selected) else {
            return;
        };
        let end = self.editor.caret();

        match entry.action {
            CommandAction::Insert(text) => {
                self.history.record(self.editor.text());
                self.editor.replace_range(start, end, text);
                self.dirty = true;
                self.overlay = Overlay::None;
                self.refresh_surfaces();
            }
            CommandAction::Table => {
                self.consume_trigger_run(start, end);
                self.overlay = Overlay::TablePicker(TablePickerState::default());
            }
            CommandAction::Tree => {
                self.consume_trigger_run(start, end);
                self.overlay = Overlay::TreeBuilder(TreeBuilderState::default());
            }
            CommandAction::Config => {
                self.consume_trigger_run(start, end);
                self.overlay = Overlay::ConfigBuilder(ConfigBuilderState::default());
            }
        }
    }

    fn consume_trigger_run(&mut self, start: usize, end: usize) {
        self.history.record(self.editor.text());
        self.editor.replace_range(start, end, "");
        self.dirty = true;
    }

    /// Insert a generated block at the caret. Empty output keeps the
    /// builder open — there is nothing to insert.
    fn insert_generated(&mut self, block: String) -> bool {
        if block.is_empty() {
            return false;
        }
        self.history.record(self.editor.text());
        self.editor.insert_at_caret(&block);
        self.dirty = true;
        self.overlay = Overlay::None;
        self.refresh_surfaces();
        true
    }

    fn apply_format(&mut self, f: Format) {
        if let Overlay::SelectionBar { start, end } = self.overlay {
            if format::apply(f, (start, end), &mut self.editor, &mut self.history) {
                self.dirty = true;
                self.status = Some(format!("{} applied", f.label()));
            }
            self.overlay = Overlay::None;
        }
    }
}

// ── Terminal setup / teardown ─────────────────────────────────────────────────

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) {
    let _ = disable_raw_mode();
    let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
    let _ = terminal.show_cursor();
}

// ── Main TUI run loop ─────────────────────────────────────────────────────────

pub async fn run(
    resolved: ResolvedConfig,
    initial: String,
    file_path: Option<PathBuf>,
    show_timestamps: bool,
) -> Result<()> {
    let mut terminal = setup_terminal()?;

    // Panic hook — restore terminal before printing panic
    let orig_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        orig_hook(info);
    }));

    let result = event_loop(&mut terminal, resolved, initial, file_path, show_timestamps).await;

    restore_terminal(&mut terminal);
    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    resolved: ResolvedConfig,
    initial: String,
    file_path: Option<PathBuf>,
    show_timestamps: bool,
) -> Result<()> {
    let (ui_tx, mut ui_rx) = mpsc::unbounded_channel::<UiEvent>();
    let mut state = AppState::new(&resolved, initial, file_path, show_timestamps);
    let mut events = EventStream::new();
    let mut tick = tokio::time::interval(std::time::Duration::from_millis(120));

    loop {
        terminal.draw(|f| render::draw(f, &state))?;

        tokio::select! {
            maybe_ev = events.next() => {
                match maybe_ev {
                    Some(Ok(Event::Key(key))) if key.kind != KeyEventKind::Release => {
                        handle_key(&mut state, key, &ui_tx);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                    None => break,
                }
            }
            Some(ev) = ui_rx.recv() => {
                state.apply_event(ev);
                // Drain whatever else is already queued before redrawing
                while let Ok(ev) = ui_rx.try_recv() {
                    state.apply_event(ev);
                }
            }
            _ = tick.tick() => {
                if state.chat_waiting {
                    state.spinner_tick = state.spinner_tick.wrapping_add(1);
                }
            }
        }

        if state.should_quit {
            break;
        }
    }

    Ok(())
}

// ── Key handling ──────────────────────────────────────────────────────────────

fn handle_key(state: &mut AppState, key: KeyEvent, ui_tx: &mpsc::UnboundedSender<UiEvent>) {
    // A fresh keypress clears transient status and disarms quit (except Ctrl+Q itself)
    if !matches!((key.modifiers, key.code), (KeyModifiers::CONTROL, KeyCode::Char('q'))) {
        state.quit_armed = false;
    }

    // ── Global chords ─────────────────────────────────────────────────────────
    match (key.modifiers, key.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('q')) => {
            if state.dirty && !state.quit_armed {
                state.quit_armed = true;
                state.status = Some("unsaved changes — Ctrl+Q again to quit".to_string());
            } else {
                state.should_quit = true;
            }
            return;
        }
        (KeyModifiers::CONTROL, KeyCode::Char('s')) => {
            state.save();
            return;
        }
        (KeyModifiers::CONTROL, KeyCode::Char('a')) => {
            state.chat_open = !state.chat_open;
            if state.chat_open {
                state.chat_focus = ChatFocus::Message;
            }
            return;
        }
        _ => {}
    }

    // ── Chat panel has focus while open ───────────────────────────────────────
    if state.chat_open {
        handle_chat_key(state, key, ui_tx);
        return;
    }

    // ── Overlay-specific keys ─────────────────────────────────────────────────
    // Builders are modal; the menu and the toolbar let unhandled keys fall
    // through to normal editing.
    if matches!(state.overlay, Overlay::Menu(_)) {
        if handle_menu_key(state, key) {
            return;
        }
    } else if matches!(state.overlay, Overlay::TablePicker(_)) {
        handle_table_picker_key(state, key);
        return;
    } else if matches!(state.overlay, Overlay::TreeBuilder(_)) {
        handle_tree_builder_key(state, key);
        return;
    } else if matches!(state.overlay, Overlay::ConfigBuilder(_)) {
        handle_config_builder_key(state, key);
        return;
    } else if matches!(state.overlay, Overlay::SelectionBar { .. })
        && handle_selection_bar_key(state, key)
    {
        return;
    }

    handle_editor_key(state, key);
}

/// Returns true when the key was consumed by the menu.
fn handle_menu_key(state: &mut AppState, key: KeyEvent) -> bool {
    let count = match &state.overlay {
        Overlay::Menu(menu) => command::filter(command::catalog(), &menu.active.typed).len(),
        _ => return false,
    };
    match key.code {
        KeyCode::Esc => {
            state.overlay = Overlay::None;
            true
        }
        KeyCode::Up if count > 0 => {
            if let Overlay::Menu(menu) = &mut state.overlay {
                menu.move_up(count);
            }
            true
        }
        KeyCode::Down if count > 0 => {
            if let Overlay::Menu(menu) = &mut state.overlay {
                menu.move_down(count);
            }
            true
        }
        KeyCode::Enter | KeyCode::Tab if count > 0 => {
            state.commit_menu_entry();
            true
        }
        _ => false,
    }
}

fn handle_table_picker_key(state: &mut AppState, key: KeyEvent) {
    let Overlay::TablePicker(mut picker) = std::mem::replace(&mut state.overlay, Overlay::None)
    else {
        return;
    };
    match key.code {
        KeyCode::Esc => return, // overlay already cleared
        KeyCode::Up => picker.shrink_rows(),
        KeyCode::Down => picker.grow_rows(),
        KeyCode::Left => picker.shrink_cols(),
        KeyCode::Right => picker.grow_cols(),
        KeyCode::Enter => {
            let block = generate::render_table(picker.rows, picker.cols);
            if state.insert_generated(block) {
                return;
            }
        }
        _ => {}
    }
    state.overlay = Overlay::TablePicker(picker);
}

fn handle_tree_builder_key(state: &mut AppState, key: KeyEvent) {
    let Overlay::TreeBuilder(mut tree) = std::mem::replace(&mut state.overlay, Overlay::None)
    else {
        return;
    };
    match (key.modifiers, key.code) {
        (_, KeyCode::Esc) => return,
        (KeyModifiers::CONTROL, KeyCode::Char('n')) => tree.add_sibling(),
        (KeyModifiers::CONTROL, KeyCode::Char('d')) => tree.remove_selected(),
        (KeyModifiers::CONTROL, KeyCode::Right) => tree.indent(1),
        (KeyModifiers::CONTROL, KeyCode::Left) => tree.indent(-1),
        (_, KeyCode::Up) => tree.select_up(),
        (_, KeyCode::Down) => tree.select_down(),
        (_, KeyCode::Backspace) => tree.pop_char(),
        (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char(c)) => tree.push_char(c),
        (_, KeyCode::Enter) => {
            let block = generate::render_tree(&tree.nodes);
            if state.insert_generated(block) {
                return;
            }
        }
        _ => {}
    }
    state.overlay = Overlay::TreeBuilder(tree);
}

fn handle_config_builder_key(state: &mut AppState, key: KeyEvent) {
    let Overlay::ConfigBuilder(mut cfg) = std::mem::replace(&mut state.overlay, Overlay::None)
    else {
        return;
    };

    // Field slash-menu swallows navigation keys while open
    if cfg.menu.is_some() {
        let count = cfg.menu_candidates().len();
        match key.code {
            KeyCode::Esc => {
                cfg.menu = None;
                state.overlay = Overlay::ConfigBuilder(cfg);
                return;
            }
            KeyCode::Up if count > 0 => {
                if let Some(menu) = &mut cfg.menu {
                    menu.move_up(count);
                }
                state.overlay = Overlay::ConfigBuilder(cfg);
                return;
            }
            KeyCode::Down if count > 0 => {
                if let Some(menu) = &mut cfg.menu {
                    menu.move_down(count);
                }
                state.overlay = Overlay::ConfigBuilder(cfg);
                return;
            }
            KeyCode::Enter | KeyCode::Tab if count > 0 => {
                let selected = cfg.menu.as_ref().map(|m| m.selected).unwrap_or(0);
                let candidates = cfg.menu_candidates();
                if let Some(entry) = candidates.get(selected) {
                    if let CommandAction::Insert(text) = entry.action {
                        cfg.commit_menu(text);
                    }
                }
                state.overlay = Overlay::ConfigBuilder(cfg);
                return;
            }
            _ => {}
        }
    }

    let empty = cfg.entries.is_empty();
    match (key.modifiers, key.code) {
        (_, KeyCode::Esc) => return,
        (KeyModifiers::CONTROL, KeyCode::Char('n')) => cfg.add_entry(),
        (KeyModifiers::CONTROL, KeyCode::Char('d')) if !empty => cfg.remove_selected(),
        (KeyModifiers::CONTROL, KeyCode::Right) if !empty => cfg.indent(1),
        (KeyModifiers::CONTROL, KeyCode::Left) if !empty => cfg.indent(-1),
        (_, KeyCode::Up) if !empty => cfg.select_up(),
        (_, KeyCode::Down) if !empty => cfg.select_down(),
        (_, KeyCode::Left) if !empty => cfg.switch_field(ConfigField::Key),
        (_, KeyCode::Right) if !empty => cfg.switch_field(ConfigField::Value),
        (_, KeyCode::Backspace) if !empty => cfg.pop_char(),
        (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char(c)) if !empty => cfg.push_char(c),
        (_, KeyCode::Enter) => {
            let block = generate::render_config(&cfg.entries);
            if state.insert_generated(block) {
                return;
            }
        }
        _ => {}
    }
    state.overlay = Overlay::ConfigBuilder(cfg);
}

/// Returns true when the key was consumed by the toolbar.
fn handle_selection_bar_key(state: &mut AppState, key: KeyEvent) -> bool {
    match (key.modifiers, key.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('b')) => {
            state.apply_format(Format::Bold);
            true
        }
        (KeyModifiers::CONTROL, KeyCode::Char('i')) => {
            state.apply_format(Format::Italic);
            true
        }
        (KeyModifiers::CONTROL, KeyCode::Char('u')) => {
            state.apply_format(Format::Underline);
            true
        }
        (_, KeyCode::Esc) => {
            state.editor.clear_selection();
            state.overlay = Overlay::None;
            true
        }
        _ => false,
    }
}

fn handle_editor_key(state: &mut AppState, key: KeyEvent) {
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);
    match (key.modifiers, key.code) {
        // ── History ───────────────────────────────────────────────────────────
        (m, KeyCode::Char('z' | 'Z')) if m.contains(KeyModifiers::CONTROL) => {
            if m.contains(KeyModifiers::SHIFT) {
                state.redo();
            } else {
                state.undo();
            }
        }
        (KeyModifiers::CONTROL, KeyCode::Char('y')) => {
            state.redo();
        }

        // ── Caret movement (Shift extends the selection) ──────────────────────
        (_, KeyCode::Left) => state.move_to(state.editor.prev_offset(), shift),
        (_, KeyCode::Right) => state.move_to(state.editor.next_offset(), shift),
        (_, KeyCode::Up) => state.move_to(state.editor.offset_up(), shift),
        (_, KeyCode::Down) => state.move_to(state.editor.offset_down(), shift),
        (_, KeyCode::Home) => state.move_to(state.editor.line_start(), shift),
        (_, KeyCode::End) => state.move_to(state.editor.line_end(), shift),

        // ── Edits ─────────────────────────────────────────────────────────────
        (_, KeyCode::Backspace) => state.backspace(),
        (_, KeyCode::Delete) => state.delete_forward(),
        (_, KeyCode::Enter) => state.type_str("\n"),
        (_, KeyCode::Tab) => state.type_str("    "),
        (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char(c)) => {
            let mut buf = [0u8; 4];
            let s: &str = c.encode_utf8(&mut buf);
            state.type_str(s);
        }
        _ => {}
    }
}

fn handle_chat_key(state: &mut AppState, key: KeyEvent, ui_tx: &mpsc::UnboundedSender<UiEvent>) {
    match key.code {
        KeyCode::Esc => {
            state.chat_open = false;
        }
        KeyCode::Tab => {
            state.chat_focus = match state.chat_focus {
                ChatFocus::Message => ChatFocus::ApiKey,
                ChatFocus::ApiKey => ChatFocus::Message,
            };
        }
        KeyCode::Enter => match state.chat_focus {
            ChatFocus::ApiKey => {
                let key_text = state.api_key_input.trim().to_string();
                state.client.set_api_key(key_text.clone());
                match config::store_api_key(&state.profile, &key_text) {
                    Ok(()) => {
                        let msg = if key_text.is_empty() {
                            "API key cleared."
                        } else {
                            "API Key saved. How can I help you today?"
                        };
                        state.push_chat(ChatRole::System, msg.to_string());
                    }
                    Err(e) => {
                        state.push_chat(ChatRole::System, format!("Could not store API key: {e}"));
                    }
                }
                state.chat_focus = ChatFocus::Message;
            }
            ChatFocus::Message => send_chat(state, ui_tx),
        },
        KeyCode::Backspace => {
            match state.chat_focus {
                ChatFocus::Message => state.chat_input.pop(),
                ChatFocus::ApiKey => state.api_key_input.pop(),
            };
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            match state.chat_focus {
                ChatFocus::Message => state.chat_input.push(c),
                ChatFocus::ApiKey => state.api_key_input.push(c),
            }
        }
        _ => {}
    }
}

/// Kick off a chat turn. A send while one is pending is rejected here —
/// the core never sees overlapping turns.
fn send_chat(state: &mut AppState, ui_tx: &mpsc::UnboundedSender<UiEvent>) {
    if state.chat_waiting {
        state.status = Some("assistant is still working — hold on".to_string());
        return;
    }
    let message = state.chat_input.trim().to_string();
    if message.is_empty() {
        return;
    }
    state.chat_input.clear();
    state.push_chat(ChatRole::User, message.clone());
    state.chat_waiting = true;
    state.chat_stream_open = false;
    state.pending_retry = Some(message.clone());

    let client = state.client.clone();
    let document = state.editor.text().to_string();
    let tx = ui_tx.clone();
    tokio::spawn(async move {
        if let Err(e) = assistant::run_chat(message, document, client, tx.clone()).await {
            let _ = tx.send(UiEvent::ChatError(e.to_string()));
        }
    });
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn format_args_summary(args: &Value) -> String {
    if let Some(obj) = args.as_object() {
        let pairs: Vec<String> = obj
            .iter()
            .map(|(k, v)| {
                let val = match v {
                    Value::String(s) => {
                        if s.chars().count() > 40 {
                            let truncated: String = s.chars().take(37).collect();
                            format!("\"{truncated}…\"")
                        } else {
                            format!("\"{s}\"")
                        }
                    }
                    other => {
                        let s = other.to_string();
                        if s.chars().count() > 40 {
                            let truncated: String = s.chars().take(37).collect();
                            format!("{truncated}…")
                        } else {
                            s
                        }
                    }
                };
                format!("{k}={val}")
            })
            .collect();
        pairs.join(", ")
    } else {
        args.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_state() -> AppState {
        let resolved = ResolvedConfig {
            endpoint: "http://localhost:11434".to_string(),
            model: "test".to_string(),
            api_key: None,
            profile_name: "default".to_string(),
        };
        AppState::new(&resolved, String::new(), None, false)
    }

    fn press(state: &mut AppState, code: KeyCode) {
        press_mod(state, code, KeyModifiers::NONE);
    }

    fn press_mod(state: &mut AppState, code: KeyCode, modifiers: KeyModifiers) {
        let key = KeyEvent::new(code, modifiers);
        let (tx, _rx) = mpsc::unbounded_channel();
        handle_key(state, key, &tx);
    }

    fn type_text(state: &mut AppState, text: &str) {
        for c in text.chars() {
            if c == '\n' {
                press(state, KeyCode::Enter);
            } else {
                press(state, KeyCode::Char(c));
            }
        }
    }

    #[test]
    fn typing_a_slash_opens_the_menu() {
        let mut state = test_state();
        type_text(&mut state, "hello /ta");
        match &state.overlay {
            Overlay::Menu(menu) => {
                assert_eq!(menu.active.trigger_offset, 6);
                assert_eq!(menu.active.typed, "ta");
            }
            _ => panic!("expected menu overlay"),
        }
        // "table" is the only prefix match for "ta"
        let filtered = command::filter(command::catalog(), "ta");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].label, "table");
    }

    #[test]
    fn whitespace_closes_the_menu() {
        let mut state = test_state();
        type_text(&mut state, "/hea");
        assert!(matches!(state.overlay, Overlay::Menu(_)));
        press(&mut state, KeyCode::Char(' '));
        assert!(matches!(state.overlay, Overlay::None));
    }

    #[test]
    fn escape_cancels_without_mutating() {
        let mut state = test_state();
        type_text(&mut state, "/h1");
        press(&mut state, KeyCode::Esc);
        assert!(matches!(state.overlay, Overlay::None));
        assert_eq!(state.editor.text(), "/h1");
    }

    #[test]
    fn committing_a_literal_command_replaces_the_run() {
        let mut state = test_state();
        type_text(&mut state, "note /h1");
        press(&mut state, KeyCode::Enter);
        assert_eq!(state.editor.text(), "note # ");
        assert!(matches!(state.overlay, Overlay::None));
        // one undo steps back over the commit
        state.undo();
        assert_eq!(state.editor.text(), "note /h1");
    }

    #[test]
    fn committing_a_tag_parks_caret_inside_the_pair() {
        let mut state = test_state();
        type_text(&mut state, "/header");
        press(&mut state, KeyCode::Enter);
        assert_eq!(state.editor.text(), "<header></header>");
        assert_eq!(state.editor.caret(), 8);
    }

    #[test]
    fn table_command_consumes_run_and_opens_picker() {
        let mut state = test_state();
        type_text(&mut state, "/table");
        press(&mut state, KeyCode::Enter);
        assert_eq!(state.editor.text(), "");
        assert!(matches!(state.overlay, Overlay::TablePicker(_)));

        // Grow to 2×3 and commit
        press(&mut state, KeyCode::Down);
        press(&mut state, KeyCode::Right);
        press(&mut state, KeyCode::Right);
        press(&mut state, KeyCode::Enter);
        assert_eq!(state.editor.text(), generate::render_table(2, 3));
        assert!(matches!(state.overlay, Overlay::None));
    }

    #[test]
    fn generated_insert_round_trips_through_undo() {
        let mut state = test_state();
        type_text(&mut state, "before ");
        type_text(&mut state, "/tree");
        press(&mut state, KeyCode::Enter);
        assert!(matches!(state.overlay, Overlay::TreeBuilder(_)));
        press(&mut state, KeyCode::Enter); // default Root/Branch/Leaf seed
        assert_eq!(
            state.editor.text(),
            "before Root\n└── Branch\n    └── Leaf\n"
        );
        // Undo the insertion, then the run removal
        state.undo();
        state.undo();
        assert_eq!(state.editor.text(), "before /tree");
    }

    #[test]
    fn selection_opens_toolbar_and_formats() {
        let mut state = test_state();
        type_text(&mut state, "bold me");
        press_mod(&mut state, KeyCode::Home, KeyModifiers::NONE);
        for _ in 0..4 {
            press_mod(&mut state, KeyCode::Right, KeyModifiers::SHIFT);
        }
        assert!(matches!(state.overlay, Overlay::SelectionBar { start: 0, end: 4 }));
        press_mod(&mut state, KeyCode::Char('b'), KeyModifiers::CONTROL);
        assert_eq!(state.editor.text(), "**bold** me");
        assert!(matches!(state.overlay, Overlay::None));
    }

    #[test]
    fn undo_redo_keyboard_contract() {
        let mut state = test_state();
        type_text(&mut state, "ab");
        press_mod(&mut state, KeyCode::Char('z'), KeyModifiers::CONTROL);
        assert_eq!(state.editor.text(), "a");
        press_mod(
            &mut state,
            KeyCode::Char('Z'),
            KeyModifiers::CONTROL | KeyModifiers::SHIFT,
        );
        assert_eq!(state.editor.text(), "ab");
        press_mod(&mut state, KeyCode::Char('z'), KeyModifiers::CONTROL);
        press_mod(&mut state, KeyCode::Char('y'), KeyModifiers::CONTROL);
        assert_eq!(state.editor.text(), "ab");
    }

    #[test]
    fn tool_request_dispatches_and_replies() {
        let mut state = test_state();
        let (reply_tx, mut reply_rx) = oneshot::channel();
        state.apply_event(UiEvent::ToolRequest {
            name: "insert_text".to_string(),
            args: serde_json::json!({"text": "hi"}),
            reply: reply_tx,
        });
        assert_eq!(state.editor.text(), "hi");
        assert!(state.dirty);
        assert_eq!(reply_rx.try_recv().unwrap(), "Text inserted successfully.");
    }

    #[test]
    fn chat_error_keeps_input_for_retry() {
        let mut state = test_state();
        state.chat_waiting = true;
        state.pending_retry = Some("fix my intro".to_string());
        state.apply_event(UiEvent::ChatError("connection refused".to_string()));
        assert!(!state.chat_waiting);
        assert_eq!(state.chat_input, "fix my intro");
        let last = state.chat_entries.last().unwrap();
        assert_eq!(last.role, ChatRole::System);
        assert!(last.text.contains("error"));
    }

    #[test]
    fn config_builder_inserts_rendered_block() {
        let mut state = test_state();
        type_text(&mut state, "/config");
        press(&mut state, KeyCode::Enter);
        assert!(matches!(state.overlay, Overlay::ConfigBuilder(_)));
        press(&mut state, KeyCode::Enter); // default h1/font-size/color seed
        assert_eq!(
            state.editor.text(),
            "---\nh1:\n    font-size: 16px\n    color: \"#444\"\n---"
        );
    }
}
