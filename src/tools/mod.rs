pub mod config_block;
pub mod insert;
pub mod read;
pub mod replace;
pub mod table;
pub mod tree;

use anyhow::{Result, anyhow};
use serde_json::Value;

use crate::client::Tool;
use crate::editor::Editor;
use crate::history::History;

/// All available tool definitions (sent to the model).
pub fn all_definitions() -> Vec<Tool> {
    vec![
        def(read::definition()),
        def(replace::definition()),
        def(insert::definition()),
        def(table::definition()),
        def(tree::definition()),
        def(config_block::definition()),
    ]
}

fn def(v: Value) -> Tool {
    Tool {
        name: v["name"].as_str().unwrap_or("").to_string(),
        description: v["description"].as_str().unwrap_or("").to_string(),
        parameters: v["parameters"].clone(),
    }
}

/// Dispatch a tool call by name against the live document. Mutating tools
/// record pre-mutation history themselves; the returned string is relayed
/// back to the model as the function result.
pub fn dispatch(
    name: &str,
    args: &Value,
    editor: &mut Editor,
    history: &mut History,
) -> Result<String> {
    match name {
        "read_document"   => read::execute(editor),
        "replace_document" => replace::execute(args, editor, history),
        "insert_text"     => insert::execute(args, editor, history),
        "insert_table"    => table::execute(args, editor, history),
        "insert_tree"     => tree::execute(args, editor, history),
        "insert_config"   => config_block::execute(args, editor, history),
        other             => Err(anyhow!("Unknown tool: '{other}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn definitions_carry_names_and_schemas() {
        let defs = all_definitions();
        let names: Vec<_> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "read_document",
                "replace_document",
                "insert_text",
                "insert_table",
                "insert_tree",
                "insert_config",
            ]
        );
        assert!(defs.iter().all(|d| d.parameters.is_object()));
    }

    #[test]
    fn unknown_tool_is_an_error() {
        let mut editor = Editor::new();
        let mut history = History::default();
        let err = dispatch("fly_to_moon", &json!({}), &mut editor, &mut history);
        assert!(err.is_err());
    }

    #[test]
    fn dispatch_round_trip_mutates_document() {
        let mut editor = Editor::new();
        let mut history = History::default();

        let msg = dispatch(
            "replace_document",
            &json!({"content": "# Notes\n"}),
            &mut editor,
            &mut history,
        )
        .unwrap();
        assert_eq!(msg, "Content updated successfully.");
        assert_eq!(editor.text(), "# Notes\n");

        let doc = dispatch("read_document", &json!({}), &mut editor, &mut history).unwrap();
        assert_eq!(doc, "# Notes\n");

        // One undo steps back over the replace
        let restored = history.undo(editor.text()).unwrap();
        assert_eq!(restored, "");
    }
}
