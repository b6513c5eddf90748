use anyhow::{Context, Result};
use serde_json::Value;

use crate::editor::Editor;
use crate::generate::{self, TreeNode};
use crate::history::History;

pub fn definition() -> Value {
    serde_json::json!({
        "name": "insert_tree",
        "description": "Renders an ASCII tree diagram from an ordered node list and inserts it at the cursor. Nodes are pre-order; depth may grow by at most one per step.",
        "parameters": {
            "type": "object",
            "properties": {
                "nodes": {
                    "type": "array",
                    "description": "Ordered tree nodes",
                    "items": {
                        "type": "object",
                        "properties": {
                            "label": { "type": "string" },
                            "depth": { "type": "integer" }
                        },
                        "required": ["label", "depth"]
                    }
                }
            },
            "required": ["nodes"]
        }
    })
}

pub fn execute(args: &Value, editor: &mut Editor, history: &mut History) -> Result<String> {
    let raw = args["nodes"]
        .as_array()
        .context("insert_tree: missing 'nodes'")?;

    let mut nodes = Vec::with_capacity(raw.len());
    for (i, item) in raw.iter().enumerate() {
        let label = item["label"]
            .as_str()
            .with_context(|| format!("insert_tree: node {i} missing 'label'"))?;
        let depth = item["depth"]
            .as_u64()
            .with_context(|| format!("insert_tree: node {i} missing 'depth'"))?;
        nodes.push(TreeNode::new(label, depth as usize));
    }

    let block = generate::render_tree(&nodes);
    if block.is_empty() {
        return Ok("No nodes given — nothing inserted.".to_string());
    }
    history.record(editor.text());
    editor.insert_at_caret(&block);
    Ok("Tree diagram inserted successfully.".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn inserts_rendered_tree() {
        let mut editor = Editor::new();
        let mut history = History::default();
        let args = json!({"nodes": [
            {"label": "Root", "depth": 0},
            {"label": "Branch", "depth": 1},
            {"label": "Leaf", "depth": 2},
        ]});
        let msg = execute(&args, &mut editor, &mut history).unwrap();
        assert_eq!(msg, "Tree diagram inserted successfully.");
        assert_eq!(editor.text(), "Root\n└── Branch\n    └── Leaf\n");
    }

    #[test]
    fn empty_node_list_inserts_nothing() {
        let mut editor = Editor::new();
        let mut history = History::default();
        let msg = execute(&json!({"nodes": []}), &mut editor, &mut history).unwrap();
        assert!(msg.contains("nothing inserted"));
        assert_eq!(editor.text(), "");
    }

    #[test]
    fn malformed_node_is_an_error() {
        let mut editor = Editor::new();
        let mut history = History::default();
        let args = json!({"nodes": [{"label": "x"}]});
        let err = execute(&args, &mut editor, &mut history).unwrap_err();
        assert!(err.to_string().contains("depth"));
    }
}
