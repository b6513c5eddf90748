use anyhow::{Context, Result};
use serde_json::Value;

use crate::editor::Editor;
use crate::history::History;

pub fn definition() -> Value {
    serde_json::json!({
        "name": "replace_document",
        "description": "Completely replaces the note content with new text.",
        "parameters": {
            "type": "object",
            "properties": {
                "content": {
                    "type": "string",
                    "description": "The new markdown text content"
                }
            },
            "required": ["content"]
        }
    })
}

pub fn execute(args: &Value, editor: &mut Editor, history: &mut History) -> Result<String> {
    let content = args["content"]
        .as_str()
        .context("replace_document: missing 'content'")?;
    history.record(editor.text());
    editor.set_text(content.to_string());
    Ok("Content updated successfully.".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_content_is_an_error() {
        let mut editor = Editor::new();
        let mut history = History::default();
        let err = execute(&json!({}), &mut editor, &mut history).unwrap_err();
        assert!(err.to_string().contains("content"));
        assert!(!history.can_undo());
    }
}
