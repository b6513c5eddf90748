use anyhow::{Context, Result};
use serde_json::Value;

use crate::editor::Editor;
use crate::generate;
use crate::history::History;

pub fn definition() -> Value {
    serde_json::json!({
        "name": "insert_table",
        "description": "Generates a markdown table with the given size and inserts it at the cursor.",
        "parameters": {
            "type": "object",
            "properties": {
                "rows": {
                    "type": "integer",
                    "description": "Number of body rows, at least 1"
                },
                "cols": {
                    "type": "integer",
                    "description": "Number of columns, at least 1"
                }
            },
            "required": ["rows", "cols"]
        }
    })
}

pub fn execute(args: &Value, editor: &mut Editor, history: &mut History) -> Result<String> {
    let rows = args["rows"].as_i64().context("insert_table: missing 'rows'")?;
    let cols = args["cols"].as_i64().context("insert_table: missing 'cols'")?;

    let block = generate::render_table(rows.max(0) as usize, cols.max(0) as usize);
    if block.is_empty() {
        return Ok("Table size must be at least 1×1 — nothing inserted.".to_string());
    }
    history.record(editor.text());
    editor.insert_at_caret(&block);
    Ok("Table inserted successfully.".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn inserts_generated_block() {
        let mut editor = Editor::new();
        let mut history = History::default();
        let msg = execute(&json!({"rows": 1, "cols": 2}), &mut editor, &mut history).unwrap();
        assert_eq!(msg, "Table inserted successfully.");
        assert_eq!(
            editor.text(),
            "\n| Header | Header |\n| --- | --- |\n| Cell | Cell |\n\n"
        );
    }

    #[test]
    fn degenerate_size_inserts_nothing() {
        let mut editor = Editor::new();
        let mut history = History::default();
        let msg = execute(&json!({"rows": 0, "cols": 5}), &mut editor, &mut history).unwrap();
        assert!(msg.contains("nothing inserted"));
        assert_eq!(editor.text(), "");
        assert!(!history.can_undo());
    }

    #[test]
    fn missing_args_are_errors() {
        let mut editor = Editor::new();
        let mut history = History::default();
        assert!(execute(&json!({"rows": 2}), &mut editor, &mut history).is_err());
    }
}
