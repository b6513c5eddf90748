use anyhow::{Context, Result};
use serde_json::Value;

use crate::editor::Editor;
use crate::history::History;

pub fn definition() -> Value {
    serde_json::json!({
        "name": "insert_text",
        "description": "Inserts text at the current cursor position in the note.",
        "parameters": {
            "type": "object",
            "properties": {
                "text": {
                    "type": "string",
                    "description": "The text to insert"
                }
            },
            "required": ["text"]
        }
    })
}

pub fn execute(args: &Value, editor: &mut Editor, history: &mut History) -> Result<String> {
    let text = args["text"].as_str().context("insert_text: missing 'text'")?;
    history.record(editor.text());
    editor.insert_at_caret(text);
    Ok("Text inserted successfully.".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn inserts_at_caret() {
        let mut editor = Editor::from_text("ab".to_string());
        editor.move_caret(1, false);
        let mut history = History::default();
        let msg = execute(&json!({"text": "-"}), &mut editor, &mut history).unwrap();
        assert_eq!(msg, "Text inserted successfully.");
        assert_eq!(editor.text(), "a-b");
        assert!(history.can_undo());
    }
}
