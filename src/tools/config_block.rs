use anyhow::{Context, Result};
use serde_json::Value;

use crate::editor::Editor;
use crate::generate::{self, ConfigEntry};
use crate::history::History;

pub fn definition() -> Value {
    serde_json::json!({
        "name": "insert_config",
        "description": "Renders a config block (--- fenced, indented key/value lines) from an ordered entry list and inserts it at the cursor.",
        "parameters": {
            "type": "object",
            "properties": {
                "entries": {
                    "type": "array",
                    "description": "Ordered config entries",
                    "items": {
                        "type": "object",
                        "properties": {
                            "key":   { "type": "string" },
                            "value": { "type": "string" },
                            "depth": { "type": "integer" }
                        },
                        "required": ["key", "value", "depth"]
                    }
                }
            },
            "required": ["entries"]
        }
    })
}

pub fn execute(args: &Value, editor: &mut Editor, history: &mut History) -> Result<String> {
    let raw = args["entries"]
        .as_array()
        .context("insert_config: missing 'entries'")?;

    let mut entries = Vec::with_capacity(raw.len());
    for (i, item) in raw.iter().enumerate() {
        let key = item["key"]
            .as_str()
            .with_context(|| format!("insert_config: entry {i} missing 'key'"))?;
        let depth = item["depth"]
            .as_u64()
            .with_context(|| format!("insert_config: entry {i} missing 'depth'"))?;
        let value = item["value"].as_str().unwrap_or("");
        entries.push(ConfigEntry::new(key, value, depth as usize));
    }

    let block = generate::render_config(&entries);
    if block.is_empty() {
        return Ok("No entries given — nothing inserted.".to_string());
    }
    history.record(editor.text());
    editor.insert_at_caret(&block);
    Ok("Config block inserted successfully.".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn inserts_rendered_block() {
        let mut editor = Editor::new();
        let mut history = History::default();
        let args = json!({"entries": [
            {"key": "h1", "value": "", "depth": 0},
            {"key": "font-size", "value": "16px", "depth": 1},
        ]});
        let msg = execute(&args, &mut editor, &mut history).unwrap();
        assert_eq!(msg, "Config block inserted successfully.");
        assert_eq!(editor.text(), "---\nh1:\n    font-size: 16px\n---");
    }

    #[test]
    fn empty_entries_insert_nothing() {
        let mut editor = Editor::new();
        let mut history = History::default();
        let msg = execute(&json!({"entries": []}), &mut editor, &mut history).unwrap();
        assert!(msg.contains("nothing inserted"));
        assert_eq!(editor.text(), "");
    }
}
