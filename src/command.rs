/// Slash-command trigger detection, catalogs and menu state.
///
/// A command run starts at a `/` and extends to the caret; any whitespace
/// kills it. Detection re-runs on every text or caret change, so the menu
/// opens, filters and closes purely as a function of the buffer.
use crate::editor::clamp_boundary;

// ── Active command ────────────────────────────────────────────────────────────

/// An unterminated `/token` immediately left of the caret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveCommand {
    /// Byte offset of the triggering `/`
    pub trigger_offset: usize,
    /// Text between the `/` (exclusive) and the caret
    pub typed: String,
}

/// Scan backward from the caret for a command trigger.
///
/// Stops at the first whitespace; returns the `/` offset and the typed run
/// if one is found first. `"hello /wor|"` → offset 6, typed "wor".
pub fn detect_trigger(text: &str, caret: usize) -> Option<ActiveCommand> {
    let caret = clamp_boundary(text, caret);
    for (i, ch) in text[..caret].char_indices().rev() {
        if ch.is_whitespace() {
            return None;
        }
        if ch == '/' {
            return Some(ActiveCommand {
                trigger_offset: i,
                typed: text[i + 1..caret].to_string(),
            });
        }
    }
    None
}

// ── Catalog ───────────────────────────────────────────────────────────────────

/// What committing a command does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandAction {
    /// Replace the `/token` run with literal text
    Insert(&'static str),
    /// Open the table size picker
    Table,
    /// Open the tree builder
    Tree,
    /// Open the config builder
    Config,
}

#[derive(Debug, Clone, Copy)]
pub struct CommandEntry {
    pub label: &'static str,
    pub action: CommandAction,
    pub glyph: &'static str,
}

const fn entry(label: &'static str, action: CommandAction, glyph: &'static str) -> CommandEntry {
    CommandEntry { label, action, glyph }
}

use CommandAction::{Config, Insert, Table, Tree};

/// The note-editor catalog, in menu order.
const NOTE_COMMANDS: &[CommandEntry] = &[
    entry("h1",      Insert("# "),          "H"),
    entry("h2",      Insert("## "),         "H"),
    entry("h3",      Insert("### "),        "H"),
    entry("bullet",  Insert("- "),          "•"),
    entry("todo",    Insert("- [ ] "),      "☐"),
    entry("quote",   Insert("> "),          "❝"),
    entry("divider", Insert("\n---\n"),     "―"),
    entry("table",   Table,                 "⊞"),
    entry("tree",    Tree,                  "⌥"),
    entry("config",  Config,                "⚙"),
    // Structural tags — fill-in-the-blank pairs, caret lands inside
    entry("header",  Insert("<header></header>"),   "⌂"),
    entry("nav",     Insert("<nav></nav>"),         "≡"),
    entry("main",    Insert("<main></main>"),       "▣"),
    entry("section", Insert("<section></section>"), "□"),
    entry("article", Insert("<article></article>"), "¶"),
    entry("aside",   Insert("<aside></aside>"),     "▐"),
    entry("footer",  Insert("<footer></footer>"),   "⌑"),
    entry("div",     Insert("<div></div>"),         "◇"),
    entry("p",       Insert("<p></p>"),             "¶"),
    entry("button",  Insert("<button></button>"),   "▭"),
    // Raw tree-drawing glyphs for hand-built diagrams
    entry("pipe",    Insert("│  "),         "│"),
    entry("branch",  Insert("├─ "),         "├"),
    entry("leaf",    Insert("└─ "),         "└"),
];

pub fn catalog() -> &'static [CommandEntry] {
    NOTE_COMMANDS
}

/// Property keys offered in the config builder's key field.
const KEY_COMMANDS: &[CommandEntry] = &[
    entry("display",         Insert("display"),         "□"),
    entry("position",        Insert("position"),        "➤"),
    entry("flex-direction",  Insert("flex-direction"),  "⇄"),
    entry("justify-content", Insert("justify-content"), "≡"),
    entry("align-items",     Insert("align-items"),     "≡"),
    entry("margin",          Insert("margin"),          "⇱"),
    entry("padding",         Insert("padding"),         "⇲"),
    entry("color",           Insert("color"),           "◉"),
    entry("background",      Insert("background"),      "▧"),
    entry("font-size",       Insert("font-size"),       "A"),
    entry("line-height",     Insert("line-height"),     "☰"),
    entry("font-weight",     Insert("font-weight"),     "B"),
    entry("text-align",      Insert("text-align"),      "≣"),
    entry("border",          Insert("border"),          "▢"),
    entry("border-radius",   Insert("border-radius"),   "◜"),
    entry("box-shadow",      Insert("box-shadow"),      "▓"),
    entry("opacity",         Insert("opacity"),         "◐"),
    entry("width",           Insert("width"),           "↔"),
    entry("height",          Insert("height"),          "↕"),
    entry("gap",             Insert("gap"),             "⁞"),
    entry("flex",            Insert("flex"),            "‖"),
    entry("grid",            Insert("grid"),            "⊞"),
    entry("z-index",         Insert("z-index"),         "≋"),
    entry("overflow",        Insert("overflow"),        "∩"),
    entry("cursor",          Insert("cursor"),          "➜"),
];

pub fn key_commands() -> &'static [CommandEntry] {
    KEY_COMMANDS
}

/// Values that apply to any property.
const GLOBAL_VALUES: &[CommandEntry] = &[
    entry("inherit", Insert("inherit"), "↳"),
    entry("initial", Insert("initial"), "⏮"),
    entry("unset",   Insert("unset"),   "⊘"),
    entry("auto",    Insert("auto"),    "✦"),
];

const DISPLAY_VALUES: &[CommandEntry] = &[
    entry("flex",         Insert("flex"),         "‖"),
    entry("block",        Insert("block"),        "□"),
    entry("inline-block", Insert("inline-block"), "▭"),
    entry("grid",         Insert("grid"),         "⊞"),
    entry("none",         Insert("none"),         "⊘"),
];

const POSITION_VALUES: &[CommandEntry] = &[
    entry("relative", Insert("relative"), "⊹"),
    entry("absolute", Insert("absolute"), "➤"),
    entry("fixed",    Insert("fixed"),    "⌖"),
    entry("sticky",   Insert("sticky"),   "⚓"),
];

const FLEX_DIRECTION_VALUES: &[CommandEntry] = &[
    entry("row",            Insert("row"),            "→"),
    entry("column",         Insert("column"),         "↓"),
    entry("row-reverse",    Insert("row-reverse"),    "←"),
    entry("column-reverse", Insert("column-reverse"), "↑"),
];

const JUSTIFY_CONTENT_VALUES: &[CommandEntry] = &[
    entry("center",        Insert("center"),        "≡"),
    entry("flex-start",    Insert("flex-start"),    "⇤"),
    entry("flex-end",      Insert("flex-end"),      "⇥"),
    entry("space-between", Insert("space-between"), "↔"),
    entry("space-around",  Insert("space-around"),  "‖"),
];

const ALIGN_ITEMS_VALUES: &[CommandEntry] = &[
    entry("center",     Insert("center"),     "≡"),
    entry("flex-start", Insert("flex-start"), "↑"),
    entry("flex-end",   Insert("flex-end"),   "↓"),
    entry("stretch",    Insert("stretch"),    "⇕"),
    entry("baseline",   Insert("baseline"),   "☰"),
];

const TEXT_ALIGN_VALUES: &[CommandEntry] = &[
    entry("center",  Insert("center"),  "≡"),
    entry("left",    Insert("left"),    "⇤"),
    entry("right",   Insert("right"),   "⇥"),
    entry("justify", Insert("justify"), "≣"),
];

const FONT_WEIGHT_VALUES: &[CommandEntry] = &[
    entry("normal",  Insert("normal"),  "T"),
    entry("bold",    Insert("bold"),    "B"),
    entry("lighter", Insert("lighter"), "T"),
    entry("bolder",  Insert("bolder"),  "B"),
];

const OVERFLOW_VALUES: &[CommandEntry] = &[
    entry("visible", Insert("visible"), "◉"),
    entry("hidden",  Insert("hidden"),  "◎"),
    entry("scroll",  Insert("scroll"),  "↕"),
    entry("auto",    Insert("auto"),    "✦"),
];

const CURSOR_VALUES: &[CommandEntry] = &[
    entry("pointer",     Insert("pointer"),     "➜"),
    entry("default",     Insert("default"),     "➤"),
    entry("move",        Insert("move"),        "✥"),
    entry("not-allowed", Insert("not-allowed"), "⊘"),
];

const COLOR_VALUES: &[CommandEntry] = &[
    entry("transparent",  Insert("transparent"),  "◌"),
    entry("currentColor", Insert("currentColor"), "◉"),
];

const BACKGROUND_VALUES: &[CommandEntry] = &[
    entry("none",        Insert("none"),        "⊘"),
    entry("transparent", Insert("transparent"), "◌"),
];

fn property_values(key: &str) -> &'static [CommandEntry] {
    match key {
        "display"         => DISPLAY_VALUES,
        "position"        => POSITION_VALUES,
        "flex-direction"  => FLEX_DIRECTION_VALUES,
        "justify-content" => JUSTIFY_CONTENT_VALUES,
        "align-items"     => ALIGN_ITEMS_VALUES,
        "text-align"      => TEXT_ALIGN_VALUES,
        "font-weight"     => FONT_WEIGHT_VALUES,
        "overflow"        => OVERFLOW_VALUES,
        "cursor"          => CURSOR_VALUES,
        "color"           => COLOR_VALUES,
        "background"      => BACKGROUND_VALUES,
        _ => &[],
    }
}

/// Values offered in the config builder's value field: property-specific
/// candidates first, then the globals.
pub fn value_commands(key: &str) -> Vec<CommandEntry> {
    let key = key.trim().to_lowercase();
    let mut out: Vec<CommandEntry> = property_values(&key).to_vec();
    out.extend_from_slice(GLOBAL_VALUES);
    out
}

// ── Prefix filter ─────────────────────────────────────────────────────────────

/// Case-insensitive prefix match on the label — not fuzzy, not substring.
pub fn filter(entries: &[CommandEntry], typed: &str) -> Vec<CommandEntry> {
    let typed = typed.to_lowercase();
    entries
        .iter()
        .filter(|e| e.label.to_lowercase().starts_with(&typed))
        .copied()
        .collect()
}

// ── Menu state ────────────────────────────────────────────────────────────────

/// Selection state for an open command menu. The selected index wraps at
/// both ends and resets whenever the typed text changes the filtered set.
#[derive(Debug, Clone)]
pub struct MenuState {
    pub active: ActiveCommand,
    pub selected: usize,
}

impl MenuState {
    pub fn new(active: ActiveCommand) -> Self {
        Self { active, selected: 0 }
    }

    /// Refresh after a text/caret change: new trigger data, selection back
    /// to the top if the typed text changed.
    pub fn retrigger(&mut self, active: ActiveCommand) {
        if active.typed != self.active.typed {
            self.selected = 0;
        }
        self.active = active;
    }

    pub fn move_up(&mut self, count: usize) {
        if count > 0 {
            self.selected = (self.selected + count - 1) % count;
        }
    }

    pub fn move_down(&mut self, count: usize) {
        if count > 0 {
            self.selected = (self.selected + 1) % count;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_trigger_left_of_caret() {
        let cmd = detect_trigger("hello /wor", 10).unwrap();
        assert_eq!(cmd.trigger_offset, 6);
        assert_eq!(cmd.typed, "wor");
    }

    #[test]
    fn no_trigger_without_slash() {
        assert!(detect_trigger("hello wor", 9).is_none());
    }

    #[test]
    fn whitespace_suppresses_trigger() {
        assert!(detect_trigger("/foo bar", 8).is_none());
        assert!(detect_trigger("/foo\nbar", 8).is_none());
    }

    #[test]
    fn caret_before_trigger_sees_nothing() {
        // Caret sits left of the slash — the scan never reaches it
        assert!(detect_trigger("ab /cmd", 3).is_none());
    }

    #[test]
    fn trigger_at_start_of_string() {
        let cmd = detect_trigger("/ta", 3).unwrap();
        assert_eq!(cmd.trigger_offset, 0);
        assert_eq!(cmd.typed, "ta");
    }

    #[test]
    fn empty_typed_right_after_slash() {
        let cmd = detect_trigger("note /", 6).unwrap();
        assert_eq!(cmd.typed, "");
    }

    #[test]
    fn prefix_filter_is_case_insensitive_prefix_only() {
        let entries = [
            entry("header", CommandAction::Insert("x"), ""),
            entry("h1", CommandAction::Insert("y"), ""),
            entry("h2", CommandAction::Insert("z"), ""),
        ];
        let all = filter(&entries, "h");
        assert_eq!(
            all.iter().map(|e| e.label).collect::<Vec<_>>(),
            vec!["header", "h1", "h2"]
        );
        let one = filter(&entries, "H1");
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].label, "h1");
        // substring matches don't count
        assert!(filter(&entries, "eader").is_empty());
    }

    #[test]
    fn selection_wraps_both_ends() {
        let mut menu = MenuState::new(ActiveCommand { trigger_offset: 0, typed: String::new() });
        menu.move_up(3);
        assert_eq!(menu.selected, 2);
        menu.move_down(3);
        assert_eq!(menu.selected, 0);
    }

    #[test]
    fn retrigger_resets_selection_on_new_typed_text() {
        let mut menu = MenuState::new(ActiveCommand { trigger_offset: 0, typed: "t".into() });
        menu.selected = 2;
        menu.retrigger(ActiveCommand { trigger_offset: 0, typed: "ta".into() });
        assert_eq!(menu.selected, 0);
        // same typed text — selection survives a plain caret refresh
        menu.selected = 1;
        menu.retrigger(ActiveCommand { trigger_offset: 0, typed: "ta".into() });
        assert_eq!(menu.selected, 1);
    }

    #[test]
    fn value_commands_merge_property_and_globals() {
        let vals = value_commands("Display ");
        let labels: Vec<_> = vals.iter().map(|e| e.label).collect();
        assert!(labels.contains(&"flex"));
        assert!(labels.contains(&"inherit"));
        // unknown key falls back to globals only
        assert_eq!(value_commands("nonsense").len(), 4);
    }
}
