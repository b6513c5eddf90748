/// Structured-content renderers: table, tree diagram, config block.
///
/// All three are pure functions of their input sequence — the builders and
/// the AI tools call the same code, so what the picker previews is exactly
/// what lands in the note.
// ── Node types ────────────────────────────────────────────────────────────────

/// One row of a tree diagram. Input order is pre-order; `depth` may exceed
/// the previous node's depth + 1 only through hand-edited input, in which
/// case rendering clamps it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub label: String,
    pub depth: usize,
}

impl TreeNode {
    pub fn new(label: impl Into<String>, depth: usize) -> Self {
        Self { label: label.into(), depth }
    }
}

/// One line of a config block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
    pub depth: usize,
}

impl ConfigEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>, depth: usize) -> Self {
        Self { key: key.into(), value: value.into(), depth }
    }
}

// ── Table ─────────────────────────────────────────────────────────────────────

/// Pipe table: one header row, one `---` separator row, `rows` body rows,
/// wrapped in blank lines. Sizes below 1×1 clamp to empty output.
pub fn render_table(rows: usize, cols: usize) -> String {
    if rows < 1 || cols < 1 {
        return String::new();
    }
    let line = |cell: &str| {
        let cells = vec![cell; cols];
        format!("| {} |\n", cells.join(" | "))
    };
    let mut out = String::from("\n");
    out.push_str(&line("Header"));
    out.push_str(&line("---"));
    for _ in 0..rows {
        out.push_str(&line("Cell"));
    }
    out.push('\n');
    out
}

// ── Tree ──────────────────────────────────────────────────────────────────────

const CONTINUATION: &str = "│   ";
const GAP: &str = "    ";
const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";

/// ASCII tree diagram. The first node at depth 0 is the bare root; every
/// other node gets a continuation-bar prefix and a branch connector.
pub fn render_tree(nodes: &[TreeNode]) -> String {
    if nodes.is_empty() {
        return String::new();
    }

    // Effective depths: a jump past previous + 1 renders as previous + 1
    let mut depths: Vec<usize> = Vec::with_capacity(nodes.len());
    for node in nodes {
        let depth = match depths.last() {
            Some(&prev) => node.depth.min(prev + 1),
            None => node.depth,
        };
        depths.push(depth);
    }

    let mut out = String::new();
    for (i, node) in nodes.iter().enumerate() {
        let depth = depths[i];
        if i == 0 && depth == 0 {
            out.push_str(&node.label);
            out.push('\n');
            continue;
        }

        // One prefix column per ancestor level: a continuation bar while
        // that ancestor still has siblings coming, blank space otherwise.
        for level in 0..depth.saturating_sub(1) {
            let open = later_sibling_at(&depths[i + 1..], level + 1);
            out.push_str(if open { CONTINUATION } else { GAP });
        }

        let last = !later_sibling_at(&depths[i + 1..], depth);
        out.push_str(if last { LAST_BRANCH } else { BRANCH });
        out.push_str(&node.label);
        out.push('\n');
    }
    out
}

/// True if a node at `depth` appears in `rest` before any node of a lesser
/// depth closes the subtree.
fn later_sibling_at(rest: &[usize], depth: usize) -> bool {
    for &d in rest {
        if d == depth {
            return true;
        }
        if d < depth {
            return false;
        }
    }
    false
}

// ── Config block ──────────────────────────────────────────────────────────────

/// YAML-flavored block between `---` fences; four spaces per depth level,
/// bare `key:` when the value is empty. Entries render in input order.
pub fn render_config(entries: &[ConfigEntry]) -> String {
    if entries.is_empty() {
        return String::new();
    }
    let mut out = String::from("---\n");
    for entry in entries {
        for _ in 0..entry.depth {
            out.push_str("    ");
        }
        out.push_str(&entry.key);
        if entry.value.is_empty() {
            out.push_str(":\n");
        } else {
            out.push_str(": ");
            out.push_str(&entry.value);
            out.push('\n');
        }
    }
    out.push_str("---");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_2x3() {
        assert_eq!(
            render_table(2, 3),
            "\n| Header | Header | Header |\n\
             | --- | --- | --- |\n\
             | Cell | Cell | Cell |\n\
             | Cell | Cell | Cell |\n\n"
        );
    }

    #[test]
    fn table_clamps_degenerate_sizes() {
        assert_eq!(render_table(0, 3), "");
        assert_eq!(render_table(2, 0), "");
    }

    #[test]
    fn tree_single_chain() {
        let nodes = [
            TreeNode::new("Root", 0),
            TreeNode::new("Branch", 1),
            TreeNode::new("Leaf", 2),
        ];
        assert_eq!(render_tree(&nodes), "Root\n└── Branch\n    └── Leaf\n");
    }

    #[test]
    fn tree_siblings_get_branch_connectors() {
        let nodes = [
            TreeNode::new("Root", 0),
            TreeNode::new("src", 1),
            TreeNode::new("main.rs", 2),
            TreeNode::new("lib.rs", 2),
            TreeNode::new("docs", 1),
            TreeNode::new("intro.md", 2),
        ];
        let expected = concat!(
            "Root\n",
            "├── src\n",
            "│   ├── main.rs\n",
            "│   └── lib.rs\n",
            "└── docs\n",
            "    └── intro.md\n",
        );
        assert_eq!(render_tree(&nodes), expected);
    }

    #[test]
    fn tree_continuation_bar_spans_nested_levels() {
        // a's grandchild renders under a continuation bar because b is
        // still to come at depth 1
        let nodes = [
            TreeNode::new("root", 0),
            TreeNode::new("a", 1),
            TreeNode::new("a1", 2),
            TreeNode::new("b", 1),
        ];
        assert_eq!(
            render_tree(&nodes),
            "root\n├── a\n│   └── a1\n└── b\n"
        );
    }

    #[test]
    fn tree_clamps_depth_jumps() {
        // 0 → 3 is treated as 0 → 1
        let nodes = [
            TreeNode::new("root", 0),
            TreeNode::new("deep", 3),
        ];
        assert_eq!(render_tree(&nodes), "root\n└── deep\n");
    }

    #[test]
    fn tree_second_root_gets_connector() {
        let nodes = [
            TreeNode::new("first", 0),
            TreeNode::new("child", 1),
            TreeNode::new("second", 0),
        ];
        assert_eq!(render_tree(&nodes), "first\n└── child\n└── second\n");
    }

    #[test]
    fn tree_empty_is_empty() {
        assert_eq!(render_tree(&[]), "");
    }

    #[test]
    fn config_block_shape() {
        let entries = [
            ConfigEntry::new("h1", "", 0),
            ConfigEntry::new("font-size", "16px", 1),
            ConfigEntry::new("color", "\"#444\"", 1),
        ];
        assert_eq!(
            render_config(&entries),
            "---\nh1:\n    font-size: 16px\n    color: \"#444\"\n---"
        );
    }

    #[test]
    fn config_empty_is_empty() {
        assert_eq!(render_config(&[]), "");
    }
}
