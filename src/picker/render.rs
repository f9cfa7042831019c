//! Rendering of response trees and selection lists

use std::collections::HashMap;

use super::tree::{NodeKind, ResponseTree, TreeNode};
use crate::models::{ExtractionSelection, SelectionType};
use crate::output::Palette;

/// Turns the picker's data model into something a user can look at
pub trait ResponseRenderer {
    /// The tree, with picked nodes marked
    fn render_tree(&self, tree: &ResponseTree, selections: &[ExtractionSelection]) -> String;

    /// The working list of selections, one editable entry each
    fn render_selections(&self, selections: &[ExtractionSelection], tree: Option<&ResponseTree>) -> String;
}

/// Indented plain-terminal rendering; `[n]` is the node index to click
#[derive(Debug, Clone, Copy)]
pub struct TerminalRenderer {
    palette: Palette,
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self { palette: Palette::plain() }
    }
}

impl TerminalRenderer {
    pub fn new(palette: Palette) -> Self {
        Self { palette }
    }

    fn scalar(&self, node: &TreeNode) -> String {
        match &node.kind {
            NodeKind::Scalar { value, selection_type } => {
                let text = value.to_string();
                match selection_type {
                    SelectionType::String => self.palette.string(&text),
                    SelectionType::Number => self.palette.number(&text),
                    _ => self.palette.literal(&text),
                }
            }
            NodeKind::Text { text } => self.palette.string(text),
            NodeKind::Object { len } if node.collapsed => self.palette.muted(&format!("{{… {} keys}}", len)),
            NodeKind::Object { len } => self.palette.muted(&format!("{{{} keys}}", len)),
            NodeKind::Array { len } if node.collapsed => self.palette.muted(&format!("[… {} items]", len)),
            NodeKind::Array { len } => self.palette.muted(&format!("[{} items]", len)),
        }
    }
}

impl ResponseRenderer for TerminalRenderer {
    fn render_tree(&self, tree: &ResponseTree, selections: &[ExtractionSelection]) -> String {
        let picked: HashMap<usize, &ExtractionSelection> = selections.iter()
            .filter_map(|s| s.node.map(|node| (node, s)))
            .filter(|(node, s)| tree.node(*node).is_some_and(|n| n.path == s.path))
            .collect();

        let mut output = String::new();
        for node in tree.nodes() {
            if tree.is_hidden(node.index) {
                continue;
            }

            let label = match &node.key {
                Some(key) if tree.is_key_selectable(node.index) => format!("{}: ", self.palette.key(key)),
                Some(key) => format!("{}: ", self.palette.muted(key)),
                None => format!("{}: ", self.palette.label(&node.path)),
            };
            let index = format!("[{}]", node.index);

            output.push_str(&format!("{:>5} {}{}{}", index, "  ".repeat(node.depth), label, self.scalar(node)));

            if let Some(selection) = picked.get(&node.index) {
                let marker = match selection.selection_type {
                    SelectionType::Key => format!("  ◀ key → {}", selection.variable_name),
                    _ => format!("  ◀ {}", selection.variable_name),
                };
                output.push_str(&self.palette.selected(&marker));
            }
            output.push('\n');
        }
        output
    }

    fn render_selections(&self, selections: &[ExtractionSelection], tree: Option<&ResponseTree>) -> String {
        if selections.is_empty() {
            return self.palette.muted("No values selected. Pick a value to create an extraction rule.\n");
        }

        let mut output = String::new();
        for (i, selection) in selections.iter().enumerate() {
            let stale = tree.is_some_and(|t| t.find_path(&selection.path).is_none());
            output.push_str(&format!(
                "  {}. {} = {} ({})",
                i + 1,
                self.palette.key(&selection.variable_name),
                self.palette.label(&selection.path),
                selection.selection_type.as_str(),
            ));
            if stale {
                output.push_str(&self.palette.warning("  [not in current response]"));
            }
            output.push('\n');
        }
        output
    }
}
