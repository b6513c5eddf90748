use anyhow::Result;
use serde_json::Value;

use crate::editor::Editor;

pub fn definition() -> Value {
    serde_json::json!({
        "name": "read_document",
        "description": "Returns the current text content of the note.",
        "parameters": {
            "type": "object",
            "properties": {}
        }
    })
}

pub fn execute(editor: &Editor) -> Result<String> {
    Ok(editor.text().to_string())
}
